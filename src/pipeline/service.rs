//! Service facade owned by the host process.
//!
//! Holds configuration and every piece of mutable state (store, rate
//! limiter, usage ledger) explicitly, so independent instances never share
//! counters.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::config::SitrepConfig;
use crate::extraction::alias::AliasIndex;
use crate::security::rate_limit::{client_id, RateLimiter};
use crate::storage::store::EventStore;
use crate::usage::ledger::{UsageDecision, UsageLedger};
use crate::usage::tier::Tier;

use super::context::RequestContext;
use super::ingestion::{process_ingest, IngestRequest};
use super::insights::{health, process_insights};
use super::response::HandlerResponse;

pub struct SitrepService {
    config: SitrepConfig,
    store: Arc<dyn EventStore>,
    rate_limiter: RateLimiter,
    usage: UsageLedger,
}

impl SitrepService {
    pub fn new(config: SitrepConfig, store: Arc<dyn EventStore>) -> Self {
        let usage = UsageLedger::new(config.enterprise_daily_limit);
        Self {
            config,
            store,
            rate_limiter: RateLimiter::default(),
            usage,
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn config(&self) -> &SitrepConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }

    pub fn usage(&self) -> &UsageLedger {
        &self.usage
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Identify and rate-limit the caller.
    fn admit(
        &self,
        headers: &[(String, String)],
        peer_addr: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RequestContext, HandlerResponse> {
        let index = AliasIndex::from_headers(headers);
        let client = client_id(index.lookup(&["X-Forwarded-For"]), peer_addr);
        let ctx = RequestContext::new(&client, now);

        if self.rate_limiter.is_limited(&client, Instant::now()) {
            log::warn!(
                "{} RATE_LIMITED client={} limit={}",
                ctx.log_context(),
                client,
                self.rate_limiter.limit()
            );
            return Err(HandlerResponse::error(429, "rate_limited"));
        }
        Ok(ctx)
    }

    /// `POST /api/sitrep/ingest`
    pub fn handle_ingest(&self, request: &IngestRequest<'_>, now: DateTime<Utc>) -> HandlerResponse {
        match self.admit(request.headers, request.peer_addr, now) {
            Ok(ctx) => process_ingest(
                &ctx,
                self.config.ingest_secret.as_deref(),
                request,
                self.store.as_ref(),
            ),
            Err(resp) => resp,
        }
    }

    /// `GET /api/sitrep/insights`
    pub fn handle_insights(
        &self,
        headers: &[(String, String)],
        peer_addr: Option<&str>,
        now: DateTime<Utc>,
    ) -> HandlerResponse {
        match self.admit(headers, peer_addr, now) {
            Ok(ctx) => process_insights(&ctx, self.store.as_ref()),
            Err(resp) => resp,
        }
    }

    /// `GET /healthz`
    pub fn handle_health(
        &self,
        headers: &[(String, String)],
        peer_addr: Option<&str>,
        now: DateTime<Utc>,
    ) -> HandlerResponse {
        match self.admit(headers, peer_addr, now) {
            Ok(ctx) => health(&ctx),
            Err(resp) => resp,
        }
    }

    /// Record a user's subscription tier by name, as delivered by billing.
    pub fn assign_tier(&self, user_id: &str, tier_name: &str) -> Tier {
        self.usage.set_tier_name(user_id, tier_name, Instant::now())
    }

    /// Check and count one quota-gated request for `user_id` on `now`'s UTC day.
    pub fn check_usage(&self, user_id: &str, now: DateTime<Utc>) -> UsageDecision {
        self.usage
            .check_and_record(user_id, now.date_naive(), Instant::now())
    }
}
