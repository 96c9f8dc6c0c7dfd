//! Insight endpoint.
//!
//! Reads the trailing window from the store, computes the report and
//! wraps it with response metadata.

use chrono::Duration;
use serde_json::{json, Value};

use crate::insights::detector::{compute_insights_at, MAX_REPORTED_ERRORS, WINDOW_HOURS};
use crate::storage::store::EventStore;

use super::context::{iso_millis, RequestContext};
use super::response::HandlerResponse;

/// Maximum events read for one report.
pub const INSIGHT_EVENT_LIMIT: usize = 2000;

/// Build the insights response as of `ctx.received_at`.
pub fn process_insights(ctx: &RequestContext, store: &dyn EventStore) -> HandlerResponse {
    let log_ctx = ctx.log_context();
    let now = ctx.received_at;
    let since = now - Duration::hours(WINDOW_HOURS);

    let fetched = store
        .list_events_since(since, INSIGHT_EVENT_LIMIT)
        .and_then(|events| Ok((events, store.list_latest_errors(MAX_REPORTED_ERRORS)?)));
    let (mut events, latest_errors) = match fetched {
        Ok(v) => v,
        Err(e) => {
            crate::log_error!(log_ctx, "INSIGHTS_STORE_FAILED", error = e.to_string());
            return HandlerResponse::error(500, "insights_failed");
        }
    };

    // Stores return newest first; hour buckets need oldest first so the
    // last bucket is the current hour.
    events.reverse();

    let report = compute_insights_at(&events, &latest_errors, now);

    log::info!(
        "{} INSIGHTS_COMPUTED events={} errors={} flags={:?} deploy_status={:?}",
        log_ctx,
        events.len(),
        latest_errors.len(),
        report
            .anomaly_flags
            .iter()
            .map(|f| f.flag)
            .collect::<Vec<_>>(),
        report.deploy_health.status
    );

    let mut body = json!({
        "ok": true,
        "generated_at": iso_millis(now),
        "storage": store.mode(),
    });
    match serde_json::to_value(&report) {
        Ok(Value::Object(fields)) => {
            if let Some(obj) = body.as_object_mut() {
                obj.extend(fields);
            }
            HandlerResponse::json(200, body)
        }
        Ok(_) | Err(_) => {
            crate::log_error!(log_ctx, "INSIGHTS_SERIALIZE_FAILED");
            HandlerResponse::error(500, "insights_failed")
        }
    }
}

/// Liveness response.
pub fn health(ctx: &RequestContext) -> HandlerResponse {
    HandlerResponse::json(
        200,
        json!({ "ok": true, "service": "sitrep", "ts": iso_millis(ctx.received_at) }),
    )
}
