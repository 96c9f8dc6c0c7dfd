//! Telemetry insights.
//!
//! Derives a report from a trailing 24h event window:
//! - per-type counts
//! - deploy health
//! - ingest spike detection (z-score over hourly buckets)
//! - elevated error-rate detection

pub mod detector;
pub mod report;
pub mod stats;

pub use detector::*;
pub use report::*;
pub use stats::*;
