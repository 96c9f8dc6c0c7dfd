//! Security module.
//!
//! Provides body size limits, pattern scanning of event text and
//! per-client rate limiting for the ingest path.

pub mod rate_limit;
pub mod sanitizer;

pub use rate_limit::*;
pub use sanitizer::*;
