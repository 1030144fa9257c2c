use crate::domain::market::{PriceSeries, Symbol};
use crate::error::RiskError;
use crate::scoring::{compute_metrics, score_risk, MIN_SESSIONS};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_SESSIONS: usize = 60;

/// Composite score as of one session close. `None` when the series did not yet hold enough
/// trailing history to score that session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub session: NaiveDate,
    pub score: Option<u8>,
}

/// Re-scores each of the last `sessions` session closes using only the data known at that close.
pub fn score_history(series: &PriceSeries, sessions: usize) -> Result<Vec<ScorePoint>, RiskError> {
    for symbol in Symbol::ALL {
        series.closes(symbol)?;
    }

    let start = series.len().saturating_sub(sessions);
    let mut out = Vec::with_capacity(series.len() - start);

    for (idx, session) in series.sessions().iter().enumerate().skip(start) {
        let len = idx + 1;
        let score = if len < MIN_SESSIONS {
            None
        } else {
            let window = series.truncated(len);
            let snapshot = window.snapshot(session.and_time(NaiveTime::MIN).and_utc())?;
            let metrics = compute_metrics(&window, &snapshot)?;
            Some(score_risk(&metrics).composite)
        };

        out.push(ScorePoint {
            session: *session,
            score,
        });
    }

    Ok(out)
}

/// The ratio series the dashboard charts, trimmed to the last `sessions` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub sessions: Vec<NaiveDate>,
    pub credit_hyg_tlt: Vec<f64>,
    /// UUP/FXY, a USD/JPY proxy. Falling means yen strength.
    pub currency_uup_fxy: Vec<f64>,
    pub breadth_rsp_spy: Vec<f64>,
    pub vix: Vec<f64>,
    pub defensive_xlu_xlk: Vec<f64>,
}

pub fn indicator_series(series: &PriceSeries, sessions: usize) -> Result<IndicatorSeries, RiskError> {
    let start = series.len().saturating_sub(sessions);

    Ok(IndicatorSeries {
        sessions: series.sessions()[start..].to_vec(),
        credit_hyg_tlt: ratio(series, Symbol::Hyg, Symbol::Tlt, start)?,
        currency_uup_fxy: ratio(series, Symbol::Uup, Symbol::Fxy, start)?,
        breadth_rsp_spy: ratio(series, Symbol::Rsp, Symbol::Spy, start)?,
        vix: series.closes(Symbol::Vix)?[start..].to_vec(),
        defensive_xlu_xlk: ratio(series, Symbol::Xlu, Symbol::Xlk, start)?,
    })
}

fn ratio(series: &PriceSeries, num: Symbol, den: Symbol, start: usize) -> Result<Vec<f64>, RiskError> {
    let n = &series.closes(num)?[start..];
    let d = &series.closes(den)?[start..];
    Ok(n.iter().zip(d).map(|(a, b)| a / b).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SeriesBuilder;

    #[test]
    fn early_sessions_are_marked_insufficient() {
        let series = SeriesBuilder::flat(40).build();
        let history = score_history(&series, 20).unwrap();

        assert_eq!(history.len(), 20);
        assert_eq!(history[0].session, series.sessions()[20]);
        // Sessions 20..=29 have 21..=30 rows: one short of a score.
        assert!(history[..10].iter().all(|p| p.score.is_none()));
        assert!(history[10..].iter().all(|p| p.score == Some(0)));
        assert_eq!(history.last().unwrap().session, series.last_session().unwrap());
    }

    #[test]
    fn history_only_sees_data_up_to_each_session() {
        // A credit shock on the final session must not leak into earlier points.
        let series = SeriesBuilder::flat(45)
            .set(Symbol::Hyg, 1, 96.0)
            .set(Symbol::Fxy, 1, 105.0)
            .build();
        let history = score_history(&series, 5).unwrap();

        assert!(history[..4].iter().all(|p| p.score == Some(0)));
        assert!(history[4].score.unwrap() > 0);
    }

    #[test]
    fn history_is_reproducible() {
        let series = SeriesBuilder::flat(35).set(Symbol::Vix, 3, 30.0).build();
        assert_eq!(
            score_history(&series, 60).unwrap(),
            score_history(&series, 60).unwrap()
        );
        assert_eq!(score_history(&series, 60).unwrap().len(), 35);
    }

    #[test]
    fn indicators_are_price_ratios() {
        let series = SeriesBuilder::flat(10)
            .set(Symbol::Hyg, 1, 80.0)
            .set(Symbol::Fxy, 1, 50.0)
            .build();
        let ind = indicator_series(&series, 3).unwrap();

        assert_eq!(ind.sessions.len(), 3);
        assert_eq!(ind.credit_hyg_tlt, vec![1.0, 1.0, 0.8]);
        assert_eq!(ind.currency_uup_fxy, vec![1.0, 1.0, 2.0]);
        assert_eq!(ind.vix, vec![20.0, 20.0, 20.0]);
    }

    #[test]
    fn missing_symbol_fails_history() {
        let series = SeriesBuilder::flat(40).without(Symbol::Iwm).build();
        assert_eq!(
            score_history(&series, 10).unwrap_err(),
            RiskError::MissingSymbol(Symbol::Iwm)
        );
    }
}
