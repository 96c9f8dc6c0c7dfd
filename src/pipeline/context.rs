//! Request context management.
//!
//! Provides per-request identity for logging and state tracking.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub received_at: DateTime<Utc>,
    /// Rate-limit identity of the caller.
    pub client: String,
}

impl RequestContext {
    pub fn new(client: &str, received_at: DateTime<Utc>) -> Self {
        let request_id = format!("req-{}", &Uuid::new_v4().simple().to_string()[..8]);

        Self {
            request_id,
            received_at,
            client: client.to_string(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.request_id)
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-03-01T12:00:00.000Z`.
pub fn iso_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
