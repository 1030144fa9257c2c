use crate::config::{env_parse, FeedOptions, Settings};
use crate::domain::market::{PriceSeries, Symbol};
use crate::error::RiskError;
use crate::ingest::provider::{with_retries, PriceHistoryProvider};
use crate::ingest::types::align_sessions;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; riskterm/0.1)";

// Calendar days requested per trading session, to cover weekends and holidays.
const CALENDAR_DAYS_PER_SESSION: i64 = 2;
const MIN_LOOKBACK_DAYS: i64 = 90;

/// Daily closes from the public chart endpoint, one request per ticker.
#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    req_delay: Duration,
    retries: u32,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings, feed: &FeedOptions) -> Result<Self> {
        let base_url = settings
            .yahoo_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let req_delay_ms = env_parse::<u64>("YAHOO_REQ_DELAY_MS").unwrap_or(100);

        let http = reqwest::Client::builder()
            .timeout(feed.timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build chart http client")?;

        Ok(Self {
            http,
            base_url,
            req_delay: Duration::from_millis(req_delay_ms),
            retries: feed.retries,
        })
    }

    async fn fetch_all(&self, window: usize) -> Result<BTreeMap<Symbol, BTreeMap<NaiveDate, f64>>> {
        let lookback_days = (window as i64 * CALENDAR_DAYS_PER_SESSION).max(MIN_LOOKBACK_DAYS);
        let period2 = Utc::now();
        let period1 = period2 - chrono::Duration::days(lookback_days);

        let mut out = BTreeMap::new();
        for (idx, symbol) in Symbol::ALL.into_iter().enumerate() {
            if idx != 0 {
                tokio::time::sleep(self.req_delay).await;
            }
            let closes = self
                .fetch_symbol(symbol, period1, period2)
                .await
                .with_context(|| format!("chart fetch failed for {}", symbol.feed_ticker()))?;
            out.insert(symbol, closes);
        }
        Ok(out)
    }

    async fn fetch_symbol(
        &self,
        symbol: Symbol,
        period1: DateTime<Utc>,
        period2: DateTime<Utc>,
    ) -> Result<BTreeMap<NaiveDate, f64>> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol.feed_ticker()
        );

        let res = self
            .http
            .get(url)
            .query(&[
                ("period1", period1.timestamp().to_string()),
                ("period2", period2.timestamp().to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .context("chart request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read chart response")?;
        if !status.is_success() {
            anyhow::bail!("chart HTTP {status}: {text}");
        }

        let body = serde_json::from_str::<ChartResponse>(&text)
            .context("failed to parse chart response")?;
        parse_closes(body)
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_history(&self, window: usize) -> Result<PriceSeries, RiskError> {
        let by_symbol =
            with_retries(self.provider_name(), self.retries, || self.fetch_all(window)).await?;
        align_sessions(by_symbol, window)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bar timestamps are session opens.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Session date to close. Bars without a close (halts, partial days) are dropped.
fn parse_closes(body: ChartResponse) -> Result<BTreeMap<NaiveDate, f64>> {
    if let Some(err) = body.chart.error {
        anyhow::bail!(
            "chart error {}: {}",
            err.code,
            err.description.unwrap_or_default()
        );
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("chart response has no result")?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .context("chart response has no quote block")?;

    let offset = result.meta.gmtoffset;
    let mut out = BTreeMap::new();
    for (ts, close) in result.timestamp.iter().zip(quote.close) {
        let Some(close) = close.filter(|c| c.is_finite()) else {
            continue;
        };
        let Some(dt) = DateTime::<Utc>::from_timestamp(ts + offset, 0) else {
            continue;
        };
        out.insert(dt.date_naive(), close);
    }

    anyhow::ensure!(!out.is_empty(), "chart response has no closes");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_chart_and_skips_null_closes() {
        // 2026-02-02/03/04 14:30 UTC session opens; New York offset -5h.
        let v = json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -18000, "symbol": "^VIX" },
                    "timestamp": [1770042600, 1770129000, 1770215400],
                    "indicators": { "quote": [{ "close": [17.1, null, 18.4] }] }
                }],
                "error": null
            }
        });

        let body: ChartResponse = serde_json::from_value(v).unwrap();
        let closes = parse_closes(body).unwrap();

        assert_eq!(closes.len(), 2);
        assert_eq!(
            closes.get(&NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()),
            Some(&17.1)
        );
        assert_eq!(
            closes.get(&NaiveDate::from_ymd_opt(2026, 2, 4).unwrap()),
            Some(&18.4)
        );
    }

    #[test]
    fn surfaces_chart_error() {
        let v = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        let body: ChartResponse = serde_json::from_value(v).unwrap();
        let err = parse_closes(body).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn empty_result_is_an_error() {
        let v = json!({ "chart": { "result": [], "error": null } });
        let body: ChartResponse = serde_json::from_value(v).unwrap();
        assert!(parse_closes(body).is_err());
    }
}
