//! Per-user daily usage counters and tier assignments.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;

use super::tier::Tier;
use crate::storage::ttl::TtlStore;

/// How long daily counters are retained.
pub const USAGE_RETENTION: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageDecision {
    pub allowed: bool,
    pub tier: Tier,
    /// Count for the day after this check.
    pub used: u32,
    pub limit: Option<u32>,
}

/// Usage state, injected into whatever serves gated requests.
#[derive(Debug, Default)]
pub struct UsageLedger {
    counters: TtlStore<u32>,
    /// Raw tier names as written by billing; resolved on read.
    tiers: TtlStore<String>,
    enterprise_limit: Option<u32>,
}

pub fn usage_key(user_id: &str, day: NaiveDate) -> String {
    format!("usage:{}:{}", user_id, day.format("%Y-%m-%d"))
}

pub fn tier_key(user_id: &str) -> String {
    format!("user:{}:tier", user_id)
}

impl UsageLedger {
    pub fn new(enterprise_limit: Option<u32>) -> Self {
        Self {
            enterprise_limit,
            ..Self::default()
        }
    }

    pub fn tier(&self, user_id: &str, now: Instant) -> Tier {
        self.tiers
            .get(&tier_key(user_id), now)
            .map(|name| Tier::resolve(&name))
            .unwrap_or_default()
    }

    /// Store a tier name as received from billing. Unknown names are kept
    /// verbatim and read back as `Free`. Returns the effective tier.
    pub fn set_tier_name(&self, user_id: &str, name: &str, now: Instant) -> Tier {
        self.tiers.insert(&tier_key(user_id), name.to_string(), None, now);
        let tier = Tier::resolve(name);
        log::info!("TIER_SET user={} name={:?} tier={}", user_id, name, tier);
        tier
    }

    pub fn usage(&self, user_id: &str, day: NaiveDate, now: Instant) -> u32 {
        self.counters.get(&usage_key(user_id, day), now).unwrap_or(0)
    }

    pub fn increment(&self, user_id: &str, day: NaiveDate, now: Instant) -> u32 {
        self.counters.upsert(
            &usage_key(user_id, day),
            Some(USAGE_RETENTION),
            now,
            |c| c.map_or(1, |c| c.saturating_add(1)),
        )
    }

    /// Check the user's quota for `day` and count the request if allowed.
    pub fn check_and_record(&self, user_id: &str, day: NaiveDate, now: Instant) -> UsageDecision {
        let tier = self.tier(user_id, now);
        let limit = tier.daily_limit(self.enterprise_limit);
        let used = self.usage(user_id, day, now);

        if !tier.allows(used, self.enterprise_limit) {
            log::warn!(
                "USAGE_LIMIT_REACHED user={} tier={} used={} limit={:?}",
                user_id,
                tier,
                used,
                limit
            );
            return UsageDecision {
                allowed: false,
                tier,
                used,
                limit,
            };
        }

        let used = self.increment(user_id, day, now);
        log::debug!(
            "USAGE_RECORDED user={} tier={} used={} limit={:?}",
            user_id,
            tier,
            used,
            limit
        );
        UsageDecision {
            allowed: true,
            tier,
            used,
            limit,
        }
    }
}
