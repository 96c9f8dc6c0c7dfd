//! Insight computation throughput over a full 24h window.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sitrep_core::insights::compute_insights_at;
use sitrep_core::storage::EventRecord;

fn window(n: usize) -> Vec<EventRecord> {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let step = Duration::hours(24).num_seconds() / n as i64;
    let types = ["agent_run", "agent_error", "deploy", "metric", "heartbeat"];
    (0..n)
        .map(|i| EventRecord {
            ts: Some((start + Duration::seconds(step * i as i64)).to_rfc3339()),
            event_type: Some(types[i % types.len()].to_string()),
            severity: Some(if i % 7 == 0 { "error" } else { "info" }.to_string()),
            ..Default::default()
        })
        .collect()
}

fn bench_insights(c: &mut Criterion) {
    let events = window(2000);
    let errors: Vec<EventRecord> = events
        .iter()
        .rev()
        .filter(|e| e.severity.as_deref() == Some("error"))
        .take(20)
        .cloned()
        .collect();
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();

    c.bench_function("compute_insights_2000", |b| {
        b.iter(|| compute_insights_at(black_box(&events), black_box(&errors), now))
    });
}

criterion_group!(benches, bench_insights);
criterion_main!(benches);
