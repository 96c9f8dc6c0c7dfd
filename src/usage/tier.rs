//! Subscription tiers and their daily limits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Subscription level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Elite,
    Enterprise,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Elite => "elite",
            Tier::Enterprise => "enterprise",
        }
    }

    /// Resolve a stored tier name. Anything unrecognised is `Free`.
    pub fn resolve(name: &str) -> Self {
        match name {
            "pro" => Tier::Pro,
            "elite" => Tier::Elite,
            "enterprise" => Tier::Enterprise,
            _ => Tier::Free,
        }
    }

    /// Daily request limit, `None` for unlimited.
    ///
    /// Enterprise is unlimited unless a positive `enterprise_limit` is set.
    pub fn daily_limit(&self, enterprise_limit: Option<u32>) -> Option<u32> {
        match self {
            Tier::Free => Some(5),
            Tier::Pro => Some(50),
            Tier::Elite => None,
            Tier::Enterprise => enterprise_limit.filter(|&n| n > 0),
        }
    }

    pub fn allows(&self, used_today: u32, enterprise_limit: Option<u32>) -> bool {
        match self.daily_limit(enterprise_limit) {
            Some(limit) => used_today < limit,
            None => true,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
