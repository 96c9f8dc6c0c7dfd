//! SITREP Core - Signed telemetry ingest and insights
//!
//! This crate provides the request authentication and insight computation
//! behind the SITREP dashboard. The host process owns the HTTP transport
//! and calls into [`pipeline::SitrepService`]; with the `python` feature
//! the same operations are exposed via PyO3. The implementation prioritizes:
//!
//! 1. **Security** - Fail-closed HMAC verification, generic rejections
//! 2. **Logging** - Every decision point logged with request context
//! 3. **Leniency where it matters** - Insights degrade, never fail, on bad data
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `validation` - HMAC signature verification and event validation
//! - `insights` - Per-type counts, deploy health, anomaly flags
//! - `security` - Body limits, pattern scanning, rate limiting
//! - `storage` - Event store seam, query builders, TTL store
//! - `usage` - Subscription tiers and daily quotas
//! - `extraction` - Case-insensitive prioritized field lookup
//! - `pipeline` - Endpoint handlers and the service facade
//! - `config` - Environment configuration
//! - `logging` - Structured logging with request context

pub mod config;
pub mod extraction;
pub mod insights;
pub mod logging;
pub mod pipeline;
pub mod security;
pub mod storage;
pub mod usage;
pub mod validation;

pub use config::SitrepConfig;
pub use insights::{compute_insights, compute_insights_at, InsightReport};
pub use pipeline::SitrepService;
pub use validation::signature::{sign_payload, verify_signature, AuthError};

/// Initialize the process logger. Safe to call repeatedly.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

#[cfg(feature = "python")]
mod python {
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;
    use pyo3::types::PyDict;

    use crate::storage::models::parse_event_records;
    use crate::validation::signature::{sign_payload, verify_signature};

    /// Sign a payload for a trusted sender.
    #[pyfunction]
    fn sign_sitrep_payload(secret: &str, timestamp: i64, raw_body: &[u8]) -> String {
        sign_payload(secret, timestamp, raw_body)
    }

    /// Verify a signed request.
    ///
    /// Returns `{"ok": True}` or `{"ok": False, "error": <code>}`.
    #[pyfunction]
    #[pyo3(signature = (secret, timestamp_header, signature_header, raw_body, now_seconds=None))]
    fn verify_sitrep_signature(
        py: Python<'_>,
        secret: Option<&str>,
        timestamp_header: &str,
        signature_header: &str,
        raw_body: &[u8],
        now_seconds: Option<i64>,
    ) -> PyResult<Py<PyAny>> {
        crate::init_logger();
        let now = now_seconds.unwrap_or_else(|| chrono::Utc::now().timestamp());

        let result = PyDict::new(py);
        match verify_signature(secret, timestamp_header, signature_header, raw_body, now) {
            Ok(()) => result.set_item("ok", true)?,
            Err(e) => {
                result.set_item("ok", false)?;
                result.set_item("error", e.code())?;
            }
        }
        Ok(result.into())
    }

    /// Compute the insight report.
    ///
    /// # Arguments
    /// * `events_json` - JSON array of events from the last 24h, oldest first
    /// * `latest_errors_json` - JSON array of recent error events, newest first
    ///
    /// Malformed rows are tolerated; only a non-array document raises.
    ///
    /// # Returns
    /// The report as a JSON string.
    #[pyfunction]
    fn compute_sitrep_insights(events_json: &str, latest_errors_json: &str) -> PyResult<String> {
        crate::init_logger();
        let events = parse_event_records(events_json)
            .map_err(|e| PyValueError::new_err(format!("events: {}", e)))?;
        let errors = parse_event_records(latest_errors_json)
            .map_err(|e| PyValueError::new_err(format!("latest_errors: {}", e)))?;

        let report = crate::insights::compute_insights(&events, &errors);
        serde_json::to_string(&report).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Python module definition
    #[pymodule]
    fn sitrep_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(sign_sitrep_payload, m)?)?;
        m.add_function(wrap_pyfunction!(verify_sitrep_signature, m)?)?;
        m.add_function(wrap_pyfunction!(compute_sitrep_insights, m)?)?;
        Ok(())
    }
}
