use crate::domain::assessment::RiskAssessment;
use crate::domain::market::{CurrentSnapshot, PriceSeries};
use crate::error::RiskError;
use crate::scoring::{
    compute_metrics, generate_narrative, hedge_percentage, recommend_hedge, score_risk,
    HedgeConfig,
};

/// Runs one full refresh: metrics, score, hedge size, legs and narratives.
///
/// `exposure` is the portfolio dollar beta. A non-positive exposure is not an error; it yields a
/// single non-actionable leg. `snapshot` must be the last row of `series`, otherwise this fails
/// with `SnapshotMismatch`.
pub fn assess(
    series: &PriceSeries,
    snapshot: &CurrentSnapshot,
    exposure: f64,
    config: &HedgeConfig,
) -> Result<RiskAssessment, RiskError> {
    let metrics = compute_metrics(series, snapshot)?;
    let score = score_risk(&metrics);
    let hedge_pct = hedge_percentage(score.composite, metrics.vix_percentile, metrics.vix_level);
    let hedge = recommend_hedge(
        exposure,
        hedge_pct,
        metrics.vix_level,
        score.composite,
        config,
    );
    let narratives = generate_narrative(&score, &metrics, hedge_pct);

    Ok(RiskAssessment {
        captured_at: snapshot.captured_at,
        session: series.last_session(),
        risk_score: score.composite,
        sub_scores: score.sub_scores,
        derived_metrics: metrics,
        hedge_recommendation: hedge,
        narratives,
    })
}

/// Convenience for callers holding only the window: the snapshot is its last row.
pub fn assess_latest(
    series: &PriceSeries,
    captured_at: chrono::DateTime<chrono::Utc>,
    exposure: f64,
    config: &HedgeConfig,
) -> Result<RiskAssessment, RiskError> {
    let snapshot = series.snapshot(captured_at)?;
    assess(series, &snapshot, exposure, config)
}
