//! Insight computation over an event window.
//!
//! Pure: output depends only on the arguments. Malformed events are
//! counted under an `"undefined"` key instead of being rejected.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};

use super::report::{AnomalyFlag, AnomalyKind, DeployHealth, DeployStatus, InsightReport};
use super::stats::score_against_baseline;
use crate::storage::models::EventRecord;
use crate::validation::event::{EventType, Severity};

/// Key used for events with a missing type or unparseable timestamp.
pub const UNDEFINED_KEY: &str = "undefined";

/// Maximum number of error events carried in the report.
pub const MAX_REPORTED_ERRORS: usize = 20;

/// Length of the analysis window.
pub const WINDOW_HOURS: i64 = 24;

/// Detection thresholds. Each rule needs both its ratio and its absolute
/// floor to be exceeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsightThresholds {
    /// Current-hour z-score above which an ingest spike is flagged.
    pub spike_z_score: f64,
    /// Minimum current-hour count for an ingest spike.
    pub spike_min_count: u64,
    /// Error fraction above which the error rate is flagged.
    pub error_rate: f64,
    /// Minimum number of error events for an error-rate flag.
    pub error_min_count: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            spike_z_score: 2.5,
            spike_min_count: 10,
            error_rate: 0.2,
            error_min_count: 5,
        }
    }
}

/// Hour-truncated counts in first-seen order.
#[derive(Debug, Default)]
pub struct HourlyBuckets {
    order: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl HourlyBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&i) => self.order[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.order.len());
                self.order.push((key, 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Counts in insertion order.
    pub fn counts(&self) -> Vec<u64> {
        self.order.iter().map(|(_, c)| *c).collect()
    }
}

/// Top-of-hour key for an event, `"undefined"` if its ts does not parse.
pub fn hour_bucket(event: &EventRecord) -> String {
    match event.timestamp() {
        Some(ts) => ts.format("%Y-%m-%dT%H:00:00.000Z").to_string(),
        None => UNDEFINED_KEY.to_string(),
    }
}

#[derive(Debug, Default)]
struct DeployTally {
    success: u64,
    failure: u64,
    latest: Option<(Option<DateTime<Utc>>, String)>,
}

impl DeployTally {
    fn observe(&mut self, event: &EventRecord) {
        let failed =
            event.is_severity(Severity::Error) || event.meta_str("status") == Some("failed");
        if failed {
            self.failure += 1;
        } else {
            self.success += 1;
        }

        let Some(raw) = event.ts.as_deref() else {
            return;
        };
        let parsed = event.timestamp();
        let newer = match &self.latest {
            None => true,
            Some((Some(current), _)) if parsed.is_some() => parsed > Some(*current),
            Some((_, current_raw)) => raw > current_raw.as_str(),
        };
        if newer {
            self.latest = Some((parsed, raw.to_string()));
        }
    }

    fn into_health(self) -> DeployHealth {
        DeployHealth {
            status: if self.failure > 0 {
                DeployStatus::Degraded
            } else {
                DeployStatus::Healthy
            },
            deploy_success_count: self.success,
            deploy_failure_count: self.failure,
            latest_deploy_ts: self.latest.map(|(_, raw)| raw),
        }
    }
}

/// Computes [`InsightReport`]s with a fixed set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct InsightDetector {
    pub thresholds: InsightThresholds,
}

impl InsightDetector {
    pub fn new(thresholds: InsightThresholds) -> Self {
        Self { thresholds }
    }

    /// Build a report.
    ///
    /// # Arguments
    /// * `events` - Events from the trailing window, oldest first so the
    ///   last hour bucket is the current hour
    /// * `latest_errors` - Most recent error events, newest first
    /// * `now` - Reference time for the error-rate window
    pub fn compute(
        &self,
        events: &[EventRecord],
        latest_errors: &[EventRecord],
        now: DateTime<Utc>,
    ) -> InsightReport {
        let mut counts_by_type: BTreeMap<String, u64> = BTreeMap::new();
        let mut buckets = HourlyBuckets::new();
        let mut deploys = DeployTally::default();

        for event in events {
            let type_key = event.event_type.as_deref().unwrap_or(UNDEFINED_KEY);
            *counts_by_type.entry(type_key.to_string()).or_insert(0) += 1;
            buckets.add(hour_bucket(event));

            if event.is_type(EventType::Deploy) {
                deploys.observe(event);
            }
        }

        let mut anomaly_flags = Vec::new();

        if let Some(flag) = self.spike_flag(&buckets.counts()) {
            anomaly_flags.push(flag);
        }
        if let Some(flag) = self.error_rate_flag(events.len(), latest_errors, now) {
            anomaly_flags.push(flag);
        }

        InsightReport {
            counts_by_type,
            latest_errors: latest_errors
                .iter()
                .take(MAX_REPORTED_ERRORS)
                .cloned()
                .collect(),
            deploy_health: deploys.into_health(),
            anomaly_flags,
        }
    }

    fn spike_flag(&self, bucket_counts: &[u64]) -> Option<AnomalyFlag> {
        let (current, baseline) = bucket_counts.split_last()?;
        let baseline: Vec<f64> = baseline.iter().map(|&c| c as f64).collect();
        let score = score_against_baseline(*current as f64, &baseline);

        if score.z_score > self.thresholds.spike_z_score
            && *current >= self.thresholds.spike_min_count
        {
            Some(AnomalyFlag {
                flag: AnomalyKind::IngestSpike,
                severity: Severity::Warn,
                detail: format!(
                    "Current hour events are {:.2}σ above baseline",
                    score.z_score
                ),
            })
        } else {
            None
        }
    }

    fn error_rate_flag(
        &self,
        total_events: usize,
        latest_errors: &[EventRecord],
        now: DateTime<Utc>,
    ) -> Option<AnomalyFlag> {
        if total_events == 0 {
            return None;
        }
        let cutoff = now - Duration::hours(WINDOW_HOURS);
        let recent = latest_errors
            .iter()
            .filter(|e| e.timestamp().map(|ts| ts >= cutoff).unwrap_or(false))
            .count();
        let error_rate = recent as f64 / total_events as f64;

        if error_rate > self.thresholds.error_rate
            && latest_errors.len() >= self.thresholds.error_min_count
        {
            Some(AnomalyFlag {
                flag: AnomalyKind::ErrorRateHigh,
                severity: Severity::Error,
                detail: format!("Error rate in last 24h is {:.1}%", error_rate * 100.0),
            })
        } else {
            None
        }
    }
}

/// Compute insights with default thresholds as of now.
pub fn compute_insights(events: &[EventRecord], latest_errors: &[EventRecord]) -> InsightReport {
    compute_insights_at(events, latest_errors, Utc::now())
}

/// Compute insights with default thresholds as of `now`.
pub fn compute_insights_at(
    events: &[EventRecord],
    latest_errors: &[EventRecord],
    now: DateTime<Utc>,
) -> InsightReport {
    InsightDetector::default().compute(events, latest_errors, now)
}
