//! Security scanning for ingested events.
//!
//! Event text is rendered by the dashboard and stored in SQL backends, so
//! it is scanned for:
//! - XSS patterns
//! - SQL injection patterns
//!
//! Detections are logged, the event is stored unmodified.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::logging::structured::LogContext;
use crate::storage::models::NewEvent;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 128 * 1024;

/// Text fields longer than this are counted as oversized.
pub const MAX_FIELD_SIZE: usize = 16 * 1024;

lazy_static! {
    /// XSS detection patterns
    static ref XSS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)<script[^>]*>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on\w+\s*=").unwrap(),
        Regex::new(r"(?i)<iframe[^>]*>").unwrap(),
    ];

    /// SQL injection detection patterns
    static ref SQL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)'\s*(or|and)\s*'?\d").unwrap(),
        Regex::new(r"(?i);\s*(drop|delete|truncate|alter)\s").unwrap(),
        Regex::new(r"(?i)union\s+(all\s+)?select").unwrap(),
    ];
}

/// Security detection result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SanitizationResult {
    pub xss_detections: usize,
    pub sql_detections: usize,
    pub oversized_fields: usize,
}

impl SanitizationResult {
    pub fn total(&self) -> usize {
        self.xss_detections + self.sql_detections + self.oversized_fields
    }

    pub fn has_detections(&self) -> bool {
        self.total() > 0
    }
}

/// Returns `false` (and logs) when the body exceeds [`MAX_BODY_BYTES`].
pub fn body_within_limit(raw_body: &[u8], ctx: &LogContext) -> bool {
    if raw_body.len() > MAX_BODY_BYTES {
        log::warn!(
            "{} SIZE_LIMIT_EXCEEDED type=body size={} limit={}",
            ctx,
            raw_body.len(),
            MAX_BODY_BYTES
        );
        return false;
    }
    true
}

/// Scan an event's free-text fields for security patterns.
pub fn scan_event(event: &NewEvent, ctx: &LogContext) -> SanitizationResult {
    log::debug!("{} SANITIZE_START", ctx);

    let mut result = SanitizationResult::default();
    scan_string(&event.app, ctx, &mut result);
    scan_string(&event.message, ctx, &mut result);
    scan_map(&event.tags, ctx, &mut result);
    scan_map(&event.meta, ctx, &mut result);

    if result.has_detections() {
        log::warn!(
            "{} SECURITY_DETECTIONS xss={} sql={} oversized={}",
            ctx,
            result.xss_detections,
            result.sql_detections,
            result.oversized_fields
        );
    } else {
        log::debug!("{} SANITIZE_COMPLETE detections=0", ctx);
    }

    result
}

fn scan_map(map: &Map<String, Value>, ctx: &LogContext, result: &mut SanitizationResult) {
    for (key, val) in map {
        scan_string(key, ctx, result);
        scan_value(val, ctx, result);
    }
}

/// Recursively scan a JSON value for security patterns.
fn scan_value(value: &Value, ctx: &LogContext, result: &mut SanitizationResult) {
    match value {
        Value::String(s) => scan_string(s, ctx, result),
        Value::Array(arr) => {
            for item in arr {
                scan_value(item, ctx, result);
            }
        }
        Value::Object(obj) => scan_map(obj, ctx, result),
        _ => {}
    }
}

fn scan_string(s: &str, ctx: &LogContext, result: &mut SanitizationResult) {
    if s.len() > MAX_FIELD_SIZE {
        log::debug!(
            "{} SIZE_LIMIT_EXCEEDED type=field size={} limit={}",
            ctx,
            s.len(),
            MAX_FIELD_SIZE
        );
        result.oversized_fields += 1;
    }

    for pattern in XSS_PATTERNS.iter() {
        if pattern.is_match(s) {
            log::debug!("{} PATTERN_DETECTED type=xss pattern={}", ctx, pattern.as_str());
            result.xss_detections += 1;
        }
    }

    for pattern in SQL_PATTERNS.iter() {
        if pattern.is_match(s) {
            log::debug!("{} PATTERN_DETECTED type=sql pattern={}", ctx, pattern.as_str());
            result.sql_detections += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::event::{EventType, Severity};
    use serde_json::json;

    fn event(message: &str) -> NewEvent {
        NewEvent {
            ts: "2026-03-01T00:00:00Z".to_string(),
            source: "sitrep".to_string(),
            event_type: EventType::AgentRun,
            app: "worker".to_string(),
            severity: Severity::Info,
            message: message.to_string(),
            tags: Map::new(),
            meta: Map::new(),
        }
    }

    #[test]
    fn test_xss_detection() {
        let ctx = LogContext::new("test-req");
        let result = scan_event(&event("<script>alert('xss')</script>"), &ctx);
        assert_eq!(result.xss_detections, 1);
    }

    #[test]
    fn test_sql_in_nested_meta() {
        let ctx = LogContext::new("test-req");
        let mut evt = event("ok");
        evt.meta.insert(
            "detail".to_string(),
            json!({"q": ["x'; DROP TABLE sitrep_events; --"]}),
        );
        let result = scan_event(&evt, &ctx);
        assert_eq!(result.sql_detections, 1);
    }

    #[test]
    fn test_clean_event() {
        let ctx = LogContext::new("test-req");
        let result = scan_event(&event("agent finished in 12s"), &ctx);
        assert!(!result.has_detections());
    }

    #[test]
    fn test_oversized_field() {
        let ctx = LogContext::new("test-req");
        let result = scan_event(&event(&"a".repeat(MAX_FIELD_SIZE + 1)), &ctx);
        assert_eq!(result.oversized_fields, 1);
    }

    #[test]
    fn test_body_limit() {
        let ctx = LogContext::new("test-req");
        assert!(body_within_limit(&vec![b'x'; MAX_BODY_BYTES], &ctx));
        assert!(!body_within_limit(&vec![b'x'; MAX_BODY_BYTES + 1], &ctx));
    }
}
