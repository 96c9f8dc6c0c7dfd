//! Request validation module.
//!
//! Provides the checks an ingest request must pass:
//! - HMAC-SHA256 signature verification with timestamp skew protection
//! - Event shape validation (source, type, severity, app, ts)

pub mod event;
pub mod signature;

pub use event::*;
pub use signature::*;
