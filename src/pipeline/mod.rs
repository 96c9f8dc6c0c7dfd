//! Request pipeline module.
//!
//! Handlers for the SITREP endpoints, transport-agnostic:
//! - Signed event ingestion
//! - Insight report
//! - Health check
//!
//! `SitrepService` ties them to one config, store, rate limiter and
//! usage ledger.

pub mod context;
pub mod ingestion;
pub mod insights;
pub mod response;
pub mod service;

pub use context::*;
pub use ingestion::*;
pub use insights::*;
pub use response::*;
pub use service::*;
