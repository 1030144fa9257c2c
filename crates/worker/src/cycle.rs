use chrono::{DateTime, Utc};
use serde::Serialize;

use riskterm_core::domain::assessment::RiskAssessment;
use riskterm_core::ingest::PriceHistoryProvider;
use riskterm_core::pipeline::assess_latest;
use riskterm_core::scoring::HedgeConfig;

/// Result of one refresh tick, emitted as a single JSON line.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Assessed(Box<RiskAssessment>),
    /// The feed could not be reached; the pipeline did not run.
    Offline {
        provider: &'static str,
        error: String,
        at: DateTime<Utc>,
    },
    /// The feed answered with data the pipeline cannot score.
    Rejected {
        provider: &'static str,
        error: String,
        at: DateTime<Utc>,
    },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Assessed(_))
    }
}

pub async fn run_cycle<P>(
    provider: &P,
    window: usize,
    exposure: f64,
    config: &HedgeConfig,
    now: DateTime<Utc>,
) -> CycleOutcome
where
    P: PriceHistoryProvider + ?Sized,
{
    let name = provider.provider_name();

    let result = match provider.fetch_history(window).await {
        Ok(series) => assess_latest(&series, now, exposure, config),
        Err(err) => Err(err),
    };

    match result {
        Ok(assessment) => {
            tracing::info!(
                provider = name,
                session = ?assessment.session,
                risk_score = assessment.risk_score,
                hedge_pct = assessment.hedge_recommendation.hedge_percentage,
                "assessment refreshed"
            );
            CycleOutcome::Assessed(Box::new(assessment))
        }
        Err(err) if err.is_feed_offline() => {
            tracing::warn!(provider = name, error = %err, "feed offline");
            CycleOutcome::Offline {
                provider: name,
                error: err.to_string(),
                at: now,
            }
        }
        Err(err) => {
            let wrapped = anyhow::Error::new(err.clone()).context("price feed returned unusable data");
            sentry_anyhow::capture_anyhow(&wrapped);
            tracing::error!(provider = name, error = %err, "assessment cycle rejected");
            CycleOutcome::Rejected {
                provider: name,
                error: err.to_string(),
                at: now,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use riskterm_core::domain::market::{PriceSeries, Symbol};
    use riskterm_core::RiskError;

    enum Fake {
        Flat(usize),
        Offline,
        DropSymbol(Symbol),
    }

    fn flat_series(len: usize, skip: Option<Symbol>) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let sessions = (0..len).map(|i| start + Duration::days(i as i64)).collect();
        let mut series = PriceSeries::new(sessions);
        for sym in Symbol::ALL {
            if Some(sym) == skip {
                continue;
            }
            let px = if sym == Symbol::Vix { 20.0 } else { 100.0 };
            series.insert(sym, vec![px; len]).unwrap();
        }
        series
    }

    #[async_trait::async_trait]
    impl PriceHistoryProvider for Fake {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_history(&self, _window: usize) -> Result<PriceSeries, RiskError> {
            match self {
                Self::Flat(len) => Ok(flat_series(*len, None)),
                Self::Offline => Err(RiskError::DataUnavailable {
                    provider: "fake",
                    detail: "connection refused".to_string(),
                }),
                Self::DropSymbol(sym) => Ok(flat_series(40, Some(*sym))),
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 21, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn successful_fetch_runs_the_pipeline() {
        let out = run_cycle(&Fake::Flat(40), 40, 100_000.0, &HedgeConfig::default(), now()).await;
        assert!(out.is_success());

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "assessed");
        assert_eq!(json["risk_score"], 0);
        assert!(json["hedge_recommendation"]["legs"].is_array());
    }

    #[tokio::test]
    async fn unreachable_feed_is_reported_offline() {
        let out = run_cycle(&Fake::Offline, 40, 100_000.0, &HedgeConfig::default(), now()).await;
        assert!(!out.is_success());

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "offline");
        assert_eq!(json["provider"], "fake");
        assert!(json["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn malformed_data_is_rejected_not_offline() {
        let out = run_cycle(
            &Fake::DropSymbol(Symbol::Xlk),
            40,
            100_000.0,
            &HedgeConfig::default(),
            now(),
        )
        .await;
        assert!(matches!(out, CycleOutcome::Rejected { .. }));

        let out = run_cycle(&Fake::Flat(10), 10, 100_000.0, &HedgeConfig::default(), now()).await;
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "rejected");
        assert!(json["error"].as_str().unwrap().contains("insufficient history"));
    }

    #[tokio::test]
    async fn works_through_a_boxed_provider() {
        let boxed: Box<dyn PriceHistoryProvider> = Box::new(Fake::Flat(40));
        let out = run_cycle(boxed.as_ref(), 40, 0.0, &HedgeConfig::default(), now()).await;
        assert!(out.is_success());
    }
}
