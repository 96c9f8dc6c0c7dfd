//! Insight report types.
//!
//! Field names are the wire names expected by the dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage::models::EventRecord;
use crate::validation::event::Severity;

/// Aggregate deploy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployHealth {
    pub status: DeployStatus,
    pub deploy_success_count: u64,
    pub deploy_failure_count: u64,
    pub latest_deploy_ts: Option<String>,
}

impl Default for DeployHealth {
    fn default() -> Self {
        Self {
            status: DeployStatus::Healthy,
            deploy_success_count: 0,
            deploy_failure_count: 0,
            latest_deploy_ts: None,
        }
    }
}

/// Which rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    IngestSpike,
    ErrorRateHigh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub flag: AnomalyKind,
    pub severity: Severity,
    pub detail: String,
}

/// Derived view of the trailing window. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    #[serde(rename = "last_24h_event_counts_by_type")]
    pub counts_by_type: BTreeMap<String, u64>,
    pub latest_errors: Vec<EventRecord>,
    pub deploy_health: DeployHealth,
    pub anomaly_flags: Vec<AnomalyFlag>,
}

impl InsightReport {
    pub fn has_flag(&self, kind: AnomalyKind) -> bool {
        self.anomaly_flags.iter().any(|f| f.flag == kind)
    }
}
