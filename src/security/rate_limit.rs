//! Fixed-window rate limiting per client.
//!
//! Each client gets a counter that lives for one window. The counter's
//! TTL is the window itself, so an expired entry is a fresh window.
//! Finished windows are swept at most once per window length, so client
//! ids that never return do not accumulate.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::storage::ttl::TtlStore;

/// Default requests allowed per window.
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Default window length.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Per-client request limiter. Construct one per service and pass it in.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: TtlStore<u32>,
    last_sweep: Mutex<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: TtlStore::new(),
            last_sweep: Mutex::new(None),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count a request from `client` and report whether it is over the limit.
    pub fn is_limited(&self, client: &str, now: Instant) -> bool {
        self.sweep_if_due(now);
        let count = self
            .windows
            .upsert(client, Some(self.window), now, |c| c.map_or(1, |c| c.saturating_add(1)));
        count > self.limit
    }

    fn sweep_if_due(&self, now: Instant) {
        let due = {
            let mut last = self.last_sweep.lock();
            let due = match *last {
                Some(at) => now.saturating_duration_since(at) >= self.window,
                None => false,
            };
            if due || last.is_none() {
                *last = Some(now);
            }
            due
        };
        if !due {
            return;
        }
        let evicted = self.evict_expired(now);
        if evicted > 0 {
            log::debug!(
                "RATE_LIMIT_SWEEP evicted={} tracked={}",
                evicted,
                self.tracked_clients()
            );
        }
    }

    /// Drop finished windows. Returns how many clients were evicted.
    pub fn evict_expired(&self, now: Instant) -> usize {
        self.windows.purge_expired(now)
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Identify the caller: first `X-Forwarded-For` hop, else the peer
/// address, else `"unknown"`.
pub fn client_id(forwarded_for: Option<&str>, peer_addr: Option<&str>) -> String {
    forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| peer_addr.map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or("unknown")
        .to_string()
}
