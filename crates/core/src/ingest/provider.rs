use crate::config::{FeedOptions, Settings};
use crate::domain::market::{PriceSeries, Symbol};
use crate::error::RiskError;
use crate::ingest::types::PriceHistoryResponse;
use crate::ingest::yahoo::YahooChartProvider;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::future::Future;
use std::time::Duration;

const DEFAULT_PATH: &str = "/v1/price_history";

/// Source of aligned daily closes for the ten scoring symbols.
#[async_trait::async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// The last `window` aligned sessions. Unreachable sources fail with `DataUnavailable`.
    async fn fetch_history(&self, window: usize) -> Result<PriceSeries, RiskError>;
}

#[async_trait::async_trait]
impl<T: PriceHistoryProvider + ?Sized> PriceHistoryProvider for Box<T> {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    async fn fetch_history(&self, window: usize) -> Result<PriceSeries, RiskError> {
        (**self).fetch_history(window).await
    }
}

/// Generic JSON endpoint if one is configured, otherwise the public chart API.
pub fn provider_from_settings(
    settings: &Settings,
    feed: &FeedOptions,
) -> Result<Box<dyn PriceHistoryProvider>> {
    if settings.data_provider_base_url.is_some() {
        return Ok(Box::new(HttpJsonPriceProvider::from_settings(settings, feed)?));
    }
    Ok(Box::new(YahooChartProvider::from_settings(settings, feed)?))
}

#[derive(Debug, Clone)]
pub struct HttpJsonPriceProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonPriceProvider {
    pub fn from_settings(settings: &Settings, feed: &FeedOptions) -> Result<Self> {
        let base_url = settings.require_data_provider_base_url()?.to_string();
        let api_key = settings.data_provider_api_key.clone();

        let path = std::env::var("DATA_PROVIDER_HISTORY_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(feed.timeout)
            .build()
            .context("failed to build data provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries: feed.retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, window: usize) -> Result<PriceHistoryResponse> {
        let symbols = Symbol::ALL.map(Symbol::ticker).join(",");

        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[("symbols", symbols), ("window", window.to_string())])
            .send()
            .await
            .context("data provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read provider response")?;

        if !status.is_success() {
            anyhow::bail!("data provider HTTP {status}: {text}");
        }

        serde_json::from_str::<PriceHistoryResponse>(&text)
            .context("failed to parse provider response into PriceHistoryResponse")
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for HttpJsonPriceProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_history(&self, window: usize) -> Result<PriceSeries, RiskError> {
        let parsed = with_retries(self.provider_name(), self.retries, || self.fetch_once(window))
            .await?;
        parsed.into_series(window)
    }
}

/// Retries `op` with exponential backoff (1s, 2s, 4s, ...). The final failure becomes
/// `DataUnavailable`.
pub(crate) async fn with_retries<T, F, Fut>(
    provider: &'static str,
    retries: u32,
    mut op: F,
) -> Result<T, RiskError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(err) => {
                if attempt >= retries.max(1) {
                    return Err(RiskError::DataUnavailable {
                        provider,
                        detail: format!("{err:#}"),
                    });
                }
                let backoff = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(provider, attempt, ?backoff, error = %err, "price fetch failed; retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
