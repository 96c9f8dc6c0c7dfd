//! Service configuration from environment variables.

use std::fmt;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8788;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SITREP_PORT must be a port number, got {0:?}")]
    InvalidPort(String),
}

/// Process-wide settings for the ingest/insights service.
#[derive(Clone, PartialEq, Eq)]
pub struct SitrepConfig {
    /// Shared HMAC secret. `None` makes every ingest fail closed.
    pub ingest_secret: Option<String>,
    pub port: u16,
    /// Supabase project URL without trailing slashes.
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    /// Positive daily cap for the enterprise tier.
    pub enterprise_daily_limit: Option<u32>,
}

impl Default for SitrepConfig {
    fn default() -> Self {
        Self {
            ingest_secret: None,
            port: DEFAULT_PORT,
            supabase_url: None,
            supabase_service_role_key: None,
            enterprise_daily_limit: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl SitrepConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup (tests, host-provided maps).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // The secret is used byte-for-byte; only an empty value counts as unset.
        let ingest_secret = lookup("SITREP_INGEST_SECRET").filter(|s| !s.is_empty());

        let port = match non_empty(lookup("SITREP_PORT")) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let supabase_url =
            non_empty(lookup("SUPABASE_URL")).map(|u| u.trim_end_matches('/').to_string());

        let enterprise_daily_limit = match non_empty(lookup("ENTERPRISE_DAILY_LIMIT")) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    log::warn!("CONFIG_IGNORED key=ENTERPRISE_DAILY_LIMIT value={:?}", raw);
                    None
                }
            },
            None => None,
        };

        let config = Self {
            ingest_secret,
            port,
            supabase_url,
            supabase_service_role_key: non_empty(lookup("SUPABASE_SERVICE_ROLE_KEY")),
            enterprise_daily_limit,
        };

        log::info!(
            "CONFIG_LOADED port={} supabase_configured={} ingest_secret_set={}",
            config.port,
            config.supabase_configured(),
            config.ingest_secret.is_some()
        );

        Ok(config)
    }

    /// Both Supabase URL and service key are set, so the host should
    /// back the service with its Supabase store.
    pub fn supabase_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_service_role_key.is_some()
    }
}

impl fmt::Debug for SitrepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SitrepConfig")
            .field("ingest_secret", &redact(&self.ingest_secret))
            .field("port", &self.port)
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_service_role_key",
                &redact(&self.supabase_service_role_key),
            )
            .field("enterprise_daily_limit", &self.enterprise_daily_limit)
            .finish()
    }
}
