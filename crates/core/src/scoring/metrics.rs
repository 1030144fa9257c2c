use crate::domain::assessment::DerivedMetrics;
use crate::domain::market::{CurrentSnapshot, PriceSeries, Symbol};
use crate::error::RiskError;

/// Sessions in the VIX percentile window, excluding the current one.
pub const PERCENTILE_WINDOW: usize = 30;
/// Minimum aligned sessions for a full score: the percentile window plus the current row.
pub const MIN_SESSIONS: usize = PERCENTILE_WINDOW + 1;

const SHORT_LOOKBACK: usize = 5;
const LONG_LOOKBACK: usize = 10;

pub fn compute_metrics(
    series: &PriceSeries,
    snapshot: &CurrentSnapshot,
) -> Result<DerivedMetrics, RiskError> {
    for symbol in Symbol::ALL {
        series.closes(symbol)?;
        snapshot.price(symbol)?;
    }

    if series.len() < MIN_SESSIONS {
        return Err(RiskError::InsufficientHistory {
            required: MIN_SESSIONS,
            available: series.len(),
        });
    }

    // The percentile window excludes the last row, so the snapshot has to be that row.
    for symbol in Symbol::ALL {
        let latest = series.close_back(symbol, 1)?;
        if latest.to_bits() != snapshot.price(symbol)?.to_bits() {
            return Err(RiskError::SnapshotMismatch { symbol });
        }
    }

    let now = |sym: Symbol| snapshot.price(sym);
    let ago = |sym: Symbol, sessions: usize| lookback(series, sym, sessions);

    let hyg_tlt_ratio = now(Symbol::Hyg)? / now(Symbol::Tlt)?;
    let hyg_tlt_5d = ago(Symbol::Hyg, SHORT_LOOKBACK)? / ago(Symbol::Tlt, SHORT_LOOKBACK)?;
    let hyg_tlt_10d = ago(Symbol::Hyg, LONG_LOOKBACK)? / ago(Symbol::Tlt, LONG_LOOKBACK)?;

    let rsp_spy_ratio = now(Symbol::Rsp)? / now(Symbol::Spy)?;
    let rsp_spy_5d = ago(Symbol::Rsp, SHORT_LOOKBACK)? / ago(Symbol::Spy, SHORT_LOOKBACK)?;

    let iwm_growth = now(Symbol::Iwm)? / ago(Symbol::Iwm, SHORT_LOOKBACK)?;
    let spy_growth = now(Symbol::Spy)? / ago(Symbol::Spy, SHORT_LOOKBACK)?;

    let xlu_xlk_ratio = now(Symbol::Xlu)? / now(Symbol::Xlk)?;
    let xlu_xlk_5d = ago(Symbol::Xlu, SHORT_LOOKBACK)? / ago(Symbol::Xlk, SHORT_LOOKBACK)?;

    let vix_level = now(Symbol::Vix)?;

    Ok(DerivedMetrics {
        hyg_tlt_ratio,
        hyg_tlt_change_5d: pct_change(hyg_tlt_ratio, hyg_tlt_5d),
        hyg_tlt_change_10d: pct_change(hyg_tlt_ratio, hyg_tlt_10d),
        fxy_change_5d: pct_change(now(Symbol::Fxy)?, ago(Symbol::Fxy, SHORT_LOOKBACK)?),
        uup_change_5d: pct_change(now(Symbol::Uup)?, ago(Symbol::Uup, SHORT_LOOKBACK)?),
        rsp_spy_change_5d: pct_change(rsp_spy_ratio, rsp_spy_5d),
        iwm_spy_change_5d: pct_change(iwm_growth, spy_growth),
        xlu_xlk_change_5d: pct_change(xlu_xlk_ratio, xlu_xlk_5d),
        vix_level,
        vix_percentile: trailing_percentile(series.closes(Symbol::Vix)?, vix_level),
        vix_change_5d: pct_change(vix_level, ago(Symbol::Vix, SHORT_LOOKBACK)?),
    })
}

/// Close `sessions` sessions before the latest row, i.e. row `-(sessions + 1)`.
fn lookback(series: &PriceSeries, symbol: Symbol, sessions: usize) -> Result<f64, RiskError> {
    series.close_back(symbol, sessions + 1)
}

fn pct_change(now: f64, then: f64) -> f64 {
    (now / then - 1.0) * 100.0
}

fn trailing_percentile(closes: &[f64], current: f64) -> f64 {
    let end = closes.len().saturating_sub(1);
    let start = end.saturating_sub(PERCENTILE_WINDOW);
    let window = &closes[start..end];
    if window.is_empty() {
        return 0.0;
    }
    let below = window.iter().filter(|v| **v < current).count();
    below as f64 / window.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{captured_at, SeriesBuilder};

    fn metrics_for(builder: SeriesBuilder) -> DerivedMetrics {
        let series = builder.build();
        let snap = series.snapshot(captured_at()).unwrap();
        compute_metrics(&series, &snap).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn flat_prices_produce_zero_changes() {
        let m = metrics_for(SeriesBuilder::flat(31));
        assert!(approx(m.hyg_tlt_ratio, 1.0));
        assert!(approx(m.hyg_tlt_change_5d, 0.0));
        assert!(approx(m.fxy_change_5d, 0.0));
        assert!(approx(m.iwm_spy_change_5d, 0.0));
        assert!(approx(m.vix_change_5d, 0.0));
        assert!(approx(m.vix_percentile, 0.0));
        assert!(approx(m.vix_level, 20.0));
    }

    #[test]
    fn five_session_change_compares_against_sixth_row_from_end() {
        // Only the row six back differs; the row five back must not matter.
        let m = metrics_for(
            SeriesBuilder::flat(40)
                .set(Symbol::Fxy, 6, 80.0)
                .set(Symbol::Fxy, 5, 1.0),
        );
        assert!(approx(m.fxy_change_5d, 25.0));
    }

    #[test]
    fn ten_session_change_compares_against_eleventh_row_from_end() {
        let m = metrics_for(SeriesBuilder::flat(40).set(Symbol::Hyg, 11, 125.0));
        assert!(approx(m.hyg_tlt_change_10d, -20.0));
        assert!(approx(m.hyg_tlt_change_5d, 0.0));
    }

    #[test]
    fn small_cap_change_is_relative_to_spy() {
        let m = metrics_for(
            SeriesBuilder::flat(31)
                .set(Symbol::Iwm, 1, 95.0)
                .set(Symbol::Spy, 1, 100.0),
        );
        assert!(approx(m.iwm_spy_change_5d, -5.0));
    }

    #[test]
    fn vix_percentile_excludes_current_session() {
        // 30 trailing closes 1..=30, current 15.5: 15 closes strictly below.
        let mut vix: Vec<f64> = vec![99.0; 5];
        vix.extend((1..=30).map(|v| v as f64));
        vix.push(15.5);
        let m = metrics_for(SeriesBuilder::flat(36).column(Symbol::Vix, vix));
        assert!(approx(m.vix_percentile, 50.0));
    }

    #[test]
    fn vix_percentile_counts_strictly_below() {
        let m = metrics_for(SeriesBuilder::flat(31).set(Symbol::Vix, 1, 20.0));
        assert!(approx(m.vix_percentile, 0.0));
        let m = metrics_for(SeriesBuilder::flat(31).set(Symbol::Vix, 1, 20.01));
        assert!(approx(m.vix_percentile, 100.0));
    }

    #[test]
    fn rejects_short_history() {
        let series = SeriesBuilder::flat(30).build();
        let snap = series.snapshot(captured_at()).unwrap();
        assert_eq!(
            compute_metrics(&series, &snap).unwrap_err(),
            RiskError::InsufficientHistory {
                required: 31,
                available: 30
            }
        );
    }

    #[test]
    fn rejects_snapshot_that_is_not_the_last_row() {
        let series = SeriesBuilder::flat(40).build();
        let own = series.snapshot(captured_at()).unwrap();
        assert!(compute_metrics(&series, &own).is_ok());

        let moved = SeriesBuilder::flat(40).set(Symbol::Vix, 1, 35.0).build();
        let snap = moved.snapshot(captured_at()).unwrap();
        assert_eq!(
            compute_metrics(&series, &snap).unwrap_err(),
            RiskError::SnapshotMismatch { symbol: Symbol::Vix }
        );
    }

    #[test]
    fn rejects_missing_symbol() {
        let series = SeriesBuilder::flat(31).without(Symbol::Xlk).build();
        let snap = series.snapshot(captured_at()).unwrap();
        assert_eq!(
            compute_metrics(&series, &snap).unwrap_err(),
            RiskError::MissingSymbol(Symbol::Xlk)
        );
    }
}
