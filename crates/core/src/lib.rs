pub mod analytics;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod scoring;

#[cfg(test)]
mod testing;

pub use error::RiskError;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
    const DEFAULT_CACHE_TTL_SECS: u64 = 30;
    const DEFAULT_WINDOW_SESSIONS: usize = 90;
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_RETRIES: u32 = 3;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub data_provider_base_url: Option<String>,
        pub data_provider_api_key: Option<String>,
        pub yahoo_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                data_provider_base_url: std::env::var("DATA_PROVIDER_BASE_URL").ok(),
                data_provider_api_key: std::env::var("DATA_PROVIDER_API_KEY").ok(),
                yahoo_base_url: std::env::var("YAHOO_BASE_URL").ok(),
            })
        }

        pub fn require_data_provider_base_url(&self) -> anyhow::Result<&str> {
            self.data_provider_base_url
                .as_deref()
                .context("DATA_PROVIDER_BASE_URL is required")
        }
    }

    /// Polling and fetch policy for the price feed.
    #[derive(Debug, Clone)]
    pub struct FeedOptions {
        pub refresh_interval: Duration,
        pub cache_ttl: Duration,
        /// Sessions requested per fetch. Must cover the scoring minimum plus the score history.
        pub window: usize,
        pub timeout: Duration,
        pub retries: u32,
    }

    impl Default for FeedOptions {
        fn default() -> Self {
            Self {
                refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
                cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
                window: DEFAULT_WINDOW_SESSIONS,
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                retries: DEFAULT_RETRIES,
            }
        }
    }

    impl FeedOptions {
        pub fn from_env() -> Self {
            let mut out = Self::default();

            if let Some(n) = env_parse::<u64>("REFRESH_INTERVAL_SECS").filter(|n| *n > 0) {
                out.refresh_interval = Duration::from_secs(n);
            }
            if let Some(n) = env_parse::<u64>("PRICE_CACHE_TTL_SECS") {
                out.cache_ttl = Duration::from_secs(n);
            }
            if let Some(n) = env_parse::<usize>("HISTORY_WINDOW_SESSIONS") {
                out.window = n;
            }
            if let Some(n) = env_parse::<u64>("DATA_PROVIDER_TIMEOUT_SECS") {
                out.timeout = Duration::from_secs(n);
            }
            if let Some(n) = env_parse::<u32>("DATA_PROVIDER_RETRIES").filter(|n| *n > 0) {
                out.retries = n;
            }

            out
        }
    }

    pub(crate) fn env_parse<T: FromStr>(key: &str) -> Option<T> {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
    }
}
