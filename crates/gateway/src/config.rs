//! Gateway configuration (env-driven).

use std::time::Duration;

pub const API_URL_ENV: &str = "STOREBASE_API_URL";
pub const API_KEY_ENV: &str = "STOREBASE_API_KEY";
pub const AUTH_TOKEN_ENV: &str = "STOREBASE_AUTH_TOKEN";
pub const TIMEOUT_ENV: &str = "STOREBASE_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:54321";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`HttpGateway`](crate::HttpGateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Project key sent as the `apikey` header.
    pub api_key: Option<String>,
    /// User session token sent as `Authorization: Bearer ...`.
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the configuration from `STOREBASE_*` env vars.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get(API_URL_ENV).unwrap_or_else(|| {
            tracing::warn!("{API_URL_ENV} not set; using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });

        let timeout_secs = match get(TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!("invalid {TIMEOUT_ENV}={raw:?}; using {DEFAULT_TIMEOUT_SECS}s");
                DEFAULT_TIMEOUT_SECS
            }),
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: get(API_KEY_ENV),
            auth_token: get(AUTH_TOKEN_ENV),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
