//! Signed event ingestion.
//!
//! Coordinates a single ingest request:
//! 1. Body size limit
//! 2. Signature verification (HMAC, timestamp skew)
//! 3. JSON parsing
//! 4. Event validation
//! 5. Security scan (logged, not modifying)
//! 6. Storage
//!
//! Rate limiting happens before this, in the service.

use serde_json::{json, Value};

use crate::extraction::alias::AliasIndex;
use crate::security::sanitizer::{body_within_limit, scan_event};
use crate::storage::store::EventStore;
use crate::validation::event::validate_event;
use crate::validation::signature::{verify_request, SIGNATURE_HEADER, TIMESTAMP_HEADER};

use super::context::RequestContext;
use super::response::HandlerResponse;

/// Raw inbound ingest request as seen by the transport.
#[derive(Debug, Clone, Copy)]
pub struct IngestRequest<'a> {
    pub headers: &'a [(String, String)],
    pub peer_addr: Option<&'a str>,
    /// Exact body bytes as transmitted; the signature covers these.
    pub raw_body: &'a [u8],
}

impl<'a> IngestRequest<'a> {
    pub fn header_index(&self) -> AliasIndex<'a, str> {
        AliasIndex::from_headers(self.headers)
    }
}

/// Process one ingest request after rate limiting.
///
/// Every authentication failure is reported outward as `unauthorized`;
/// the specific reason only goes to the log.
pub fn process_ingest(
    ctx: &RequestContext,
    secret: Option<&str>,
    request: &IngestRequest<'_>,
    store: &dyn EventStore,
) -> HandlerResponse {
    let log_ctx = ctx.log_context();
    log::debug!(
        "{} INGEST_START client={} body_len={}",
        log_ctx,
        ctx.client,
        request.raw_body.len()
    );

    // [1] SIZE LIMIT
    if !body_within_limit(request.raw_body, &log_ctx) {
        return HandlerResponse::error(413, "payload_too_large");
    }

    // [2] SIGNATURE
    let headers = request.header_index();
    let timestamp = headers.lookup(&[TIMESTAMP_HEADER]).unwrap_or("");
    let signature = headers.lookup(&[SIGNATURE_HEADER]).unwrap_or("");
    if verify_request(
        secret,
        timestamp,
        signature,
        request.raw_body,
        ctx.received_at.timestamp(),
        &log_ctx,
    )
    .is_err()
    {
        return HandlerResponse::error(401, "unauthorized");
    }

    // [3] PARSE
    let body: Value = match serde_json::from_slice(request.raw_body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("{} INGEST_PARSE_FAILED error={}", log_ctx, e);
            return HandlerResponse::error(400, "invalid json");
        }
    };

    // [4] VALIDATE
    let event = match validate_event(&body) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("{} EVENT_INVALID reason={:?}", log_ctx, e.to_string());
            return HandlerResponse::error(400, &e.to_string());
        }
    };

    // [5] SECURITY SCAN
    let scan = scan_event(&event, &log_ctx);

    // [6] STORE
    match store.insert_event(&event) {
        Ok(id) => {
            let event_ctx = log_ctx.with_event(&id);
            log::info!(
                "{} INGEST_ACCEPTED type={} severity={} app={} storage={} detections={}",
                event_ctx,
                event.event_type,
                event.severity,
                event.app,
                store.mode(),
                scan.total()
            );
            HandlerResponse::json(
                201,
                json!({ "ok": true, "id": id, "storage": store.mode() }),
            )
        }
        Err(e) => {
            crate::log_error!(log_ctx, "INGEST_STORE_FAILED", error = e.to_string());
            HandlerResponse::error(500, "ingest_failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::InMemoryEventStore;
    use crate::validation::signature::sign_payload;
    use chrono::{TimeZone, Utc};

    const SECRET: &str = "ingest-secret";

    fn ctx() -> RequestContext {
        RequestContext::new("127.0.0.1", Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
    }

    fn signed_headers(ctx: &RequestContext, body: &[u8]) -> Vec<(String, String)> {
        let ts = ctx.received_at.timestamp();
        vec![
            ("x-sitrep-timestamp".to_string(), ts.to_string()),
            ("x-sitrep-signature".to_string(), sign_payload(SECRET, ts, body)),
        ]
    }

    const BODY: &[u8] = br#"{"source":"sitrep","type":"heartbeat","severity":"info","app":"worker","ts":"2026-03-01T11:59:00Z"}"#;

    #[test]
    fn test_accepts_signed_event() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let headers = signed_headers(&ctx, BODY);
        let req = IngestRequest { headers: &headers, peer_addr: None, raw_body: BODY };

        let resp = process_ingest(&ctx, Some(SECRET), &req, &store);
        assert_eq!(resp.status, 201);
        assert_eq!(resp.body["ok"], json!(true));
        assert_eq!(resp.body["storage"], json!("memory"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unsigned_rejected_generically() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let req = IngestRequest { headers: &[], peer_addr: None, raw_body: BODY };

        let resp = process_ingest(&ctx, Some(SECRET), &req, &store);
        assert_eq!(resp.status, 401);
        assert_eq!(resp.error_code(), Some("unauthorized"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_secret_fails_closed() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let headers = signed_headers(&ctx, BODY);
        let req = IngestRequest { headers: &headers, peer_addr: None, raw_body: BODY };

        let resp = process_ingest(&ctx, None, &req, &store);
        assert_eq!(resp.status, 401);
    }

    #[test]
    fn test_invalid_json_after_auth() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let body: &[u8] = b"{not json";
        let headers = signed_headers(&ctx, body);
        let req = IngestRequest { headers: &headers, peer_addr: None, raw_body: body };

        let resp = process_ingest(&ctx, Some(SECRET), &req, &store);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.error_code(), Some("invalid json"));
    }

    #[test]
    fn test_validation_message_returned() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let body: &[u8] = br#"{"source":"sitrep","type":"party","severity":"info","app":"a","ts":"2026-03-01T00:00:00Z"}"#;
        let headers = signed_headers(&ctx, body);
        let req = IngestRequest { headers: &headers, peer_addr: None, raw_body: body };

        let resp = process_ingest(&ctx, Some(SECRET), &req, &store);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.error_code(), Some("invalid type"));
    }

    #[test]
    fn test_non_utf8_body_authenticated_then_rejected_as_json() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let body: &[u8] = &[b'{', 0xff, b'}'];
        let headers = signed_headers(&ctx, body);
        let req = IngestRequest { headers: &headers, peer_addr: None, raw_body: body };

        let resp = process_ingest(&ctx, Some(SECRET), &req, &store);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.error_code(), Some("invalid json"));
    }

    #[test]
    fn test_suspicious_text_stored_unmodified() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let body: &[u8] = br#"{"source":"sitrep","type":"agent_run","severity":"info","app":"worker","ts":"2026-03-01T11:59:00Z","message":"<script>x</script>"}"#;
        let headers = signed_headers(&ctx, body);
        let req = IngestRequest { headers: &headers, peer_addr: None, raw_body: body };

        let resp = process_ingest(&ctx, Some(SECRET), &req, &store);
        assert_eq!(resp.status, 201);
        let all = store
            .list_events_since(ctx.received_at - chrono::Duration::hours(1), 10)
            .unwrap();
        assert_eq!(all[0].message.as_deref(), Some("<script>x</script>"));
    }

    #[test]
    fn test_oversized_body() {
        let ctx = ctx();
        let store = InMemoryEventStore::new();
        let body = vec![b'x'; crate::security::sanitizer::MAX_BODY_BYTES + 1];
        let headers = signed_headers(&ctx, &body);
        let req = IngestRequest { headers: &headers, peer_addr: None, raw_body: &body };

        let resp = process_ingest(&ctx, Some(SECRET), &req, &store);
        assert_eq!(resp.status, 413);
    }
}
