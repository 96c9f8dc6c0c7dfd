//! Ingest event validation.
//!
//! Checks an inbound event body against the fixed SITREP event shape and
//! turns it into a [`NewEvent`] ready for storage.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::storage::models::NewEvent;

/// Required value of the `source` field.
pub const EVENT_SOURCE: &str = "sitrep";

/// Event category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AgentRun,
    AgentError,
    Deploy,
    Metric,
    Heartbeat,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::AgentRun,
        EventType::AgentError,
        EventType::Deploy,
        EventType::Metric,
        EventType::Heartbeat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::AgentRun => "agent_run",
            EventType::AgentError => "agent_error",
            EventType::Deploy => "deploy",
            EventType::Metric => "metric",
            EventType::Heartbeat => "heartbeat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Severity::Info),
            "warn" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an ingest body was refused. The display text is returned to the
/// sender verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventValidationError {
    #[error("body must be object")]
    NotAnObject,
    #[error("source must be 'sitrep'")]
    WrongSource,
    #[error("invalid type")]
    InvalidType,
    #[error("invalid severity")]
    InvalidSeverity,
    #[error("app required")]
    MissingApp,
    #[error("ts required")]
    MissingTimestamp,
    #[error("ts must be ISO timestamp")]
    InvalidTimestamp,
}

/// Offset-less date-time layouts, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO 8601 event timestamp.
///
/// Accepts RFC 3339, date-times without an offset and bare dates. Values
/// without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

fn object_field(obj: &Map<String, Value>, key: &str) -> Map<String, Value> {
    obj.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Validate an event body and build the record to store.
///
/// Checks run in a fixed order and the first failure wins.
pub fn validate_event(body: &Value) -> Result<NewEvent, EventValidationError> {
    let obj = body.as_object().ok_or(EventValidationError::NotAnObject)?;

    if str_field(obj, "source") != EVENT_SOURCE {
        return Err(EventValidationError::WrongSource);
    }

    let event_type =
        EventType::parse(str_field(obj, "type")).ok_or(EventValidationError::InvalidType)?;

    let severity =
        Severity::parse(str_field(obj, "severity")).ok_or(EventValidationError::InvalidSeverity)?;

    let app = str_field(obj, "app").trim();
    if app.is_empty() {
        return Err(EventValidationError::MissingApp);
    }

    let ts = str_field(obj, "ts").trim();
    if ts.is_empty() {
        return Err(EventValidationError::MissingTimestamp);
    }
    if parse_timestamp(ts).is_none() {
        return Err(EventValidationError::InvalidTimestamp);
    }

    Ok(NewEvent {
        ts: ts.to_string(),
        source: EVENT_SOURCE.to_string(),
        event_type,
        app: app.to_string(),
        severity,
        message: str_field(obj, "message").to_string(),
        tags: object_field(obj, "tags"),
        meta: object_field(obj, "meta"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "source": "sitrep",
            "type": "deploy",
            "severity": "info",
            "app": "briefing-worker",
            "ts": "2026-03-01T12:30:00Z",
            "message": "deployed v42",
            "meta": {"status": "ok"}
        })
    }

    #[test]
    fn test_valid_event() {
        let event = validate_event(&valid_body()).unwrap();
        assert_eq!(event.event_type, EventType::Deploy);
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.app, "briefing-worker");
        assert_eq!(event.message, "deployed v42");
        assert!(event.tags.is_empty());
        assert_eq!(event.meta.get("status"), Some(&json!("ok")));
    }

    #[test]
    fn test_not_object() {
        assert_eq!(
            validate_event(&json!([1, 2])),
            Err(EventValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_checks_in_order() {
        let mut body = valid_body();
        body["source"] = json!("other");
        body["type"] = json!("bogus");
        assert_eq!(validate_event(&body), Err(EventValidationError::WrongSource));

        let mut body = valid_body();
        body["type"] = json!("bogus");
        body["severity"] = json!("fatal");
        assert_eq!(validate_event(&body), Err(EventValidationError::InvalidType));

        let mut body = valid_body();
        body["severity"] = json!("fatal");
        assert_eq!(
            validate_event(&body),
            Err(EventValidationError::InvalidSeverity)
        );
    }

    #[test]
    fn test_app_and_ts_required() {
        let mut body = valid_body();
        body["app"] = json!("   ");
        assert_eq!(validate_event(&body), Err(EventValidationError::MissingApp));

        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("ts");
        assert_eq!(
            validate_event(&body),
            Err(EventValidationError::MissingTimestamp)
        );

        let mut body = valid_body();
        body["ts"] = json!("yesterday");
        assert_eq!(
            validate_event(&body),
            Err(EventValidationError::InvalidTimestamp)
        );
    }

    #[test]
    fn test_iso_timestamps_without_offset_accepted() {
        for ts in [
            "2026-03-02T12:00:00",
            "2026-03-02T12:00:00.250",
            "2026-03-02T12:00",
            "2026-03-02",
        ] {
            let mut body = valid_body();
            body["ts"] = json!(ts);
            let event = validate_event(&body).unwrap();
            assert_eq!(event.ts, ts);
        }
    }

    #[test]
    fn test_parse_timestamp() {
        let noon = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-02T12:00:00Z"), Some(noon));
        assert_eq!(parse_timestamp("2026-03-02T14:00:00+02:00"), Some(noon));
        assert_eq!(parse_timestamp("2026-03-02T12:00:00"), Some(noon));
        assert_eq!(parse_timestamp("2026-03-02T12:00"), Some(noon));
        assert_eq!(
            parse_timestamp("2026-03-02"),
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2026-03-02T12:00:00.5").map(|t| t.timestamp_subsec_millis()),
            Some(500)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2026-13-02"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EventValidationError::WrongSource.to_string(),
            "source must be 'sitrep'"
        );
        assert_eq!(
            EventValidationError::InvalidTimestamp.to_string(),
            "ts must be ISO timestamp"
        );
    }

    #[test]
    fn test_type_round_trip_names() {
        for t in EventType::ALL {
            assert_eq!(EventType::parse(t.as_str()), Some(t));
        }
        assert_eq!(Severity::parse("warn"), Some(Severity::Warn));
        assert_eq!(Severity::parse("WARN"), None);
    }
}
