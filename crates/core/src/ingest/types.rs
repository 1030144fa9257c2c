use crate::domain::market::{PriceSeries, Symbol};
use crate::error::RiskError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Body served by the generic JSON price endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryResponse {
    pub sessions: Vec<NaiveDate>,
    pub closes: BTreeMap<String, Vec<f64>>,
}

impl PriceHistoryResponse {
    /// Keeps the last `window` sessions. Unknown tickers are ignored. Sessions must arrive oldest
    /// first without repeats.
    pub fn into_series(self, window: usize) -> Result<PriceSeries, RiskError> {
        let n = self.sessions.len();
        let start = n.saturating_sub(window);
        // The whole index is checked, not just the kept tail.
        PriceSeries::try_new(self.sessions.clone())?;
        let mut series = PriceSeries::new(self.sessions[start..].to_vec());

        for (ticker, closes) in self.closes {
            let Ok(symbol) = ticker.parse::<Symbol>() else {
                tracing::debug!(%ticker, "ignoring unknown ticker in provider response");
                continue;
            };
            if closes.len() != n {
                return Err(RiskError::MisalignedSeries {
                    symbol,
                    expected: n,
                    actual: closes.len(),
                });
            }
            series.insert(symbol, closes[start..].to_vec())?;
        }

        Ok(series)
    }
}

/// Aligns per-symbol dated closes on the sessions every symbol has, keeping the last `window`.
pub fn align_sessions(
    by_symbol: BTreeMap<Symbol, BTreeMap<NaiveDate, f64>>,
    window: usize,
) -> Result<PriceSeries, RiskError> {
    let mut common: Option<BTreeSet<NaiveDate>> = None;
    for closes in by_symbol.values() {
        let dates: BTreeSet<NaiveDate> = closes.keys().copied().collect();
        common = Some(match common {
            Some(acc) => acc.intersection(&dates).copied().collect(),
            None => dates,
        });
    }

    let common: Vec<NaiveDate> = common.unwrap_or_default().into_iter().collect();
    let start = common.len().saturating_sub(window);
    let sessions = common[start..].to_vec();

    let mut series = PriceSeries::new(sessions.clone());
    for (symbol, closes) in &by_symbol {
        let column = sessions
            .iter()
            .map(|d| closes.get(d).copied())
            .collect::<Option<Vec<f64>>>()
            .ok_or(RiskError::MissingSymbol(*symbol))?;
        series.insert(*symbol, column)?;
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    #[test]
    fn parses_expected_shape() {
        let v = json!({
            "sessions": [d(2), d(3), d(4)],
            "closes": {
                "HYG": [80.0, 80.5, 81.0],
                "^VIX": [15.0, 16.0, 17.0],
                "QQQ": [1.0, 2.0, 3.0]
            }
        });
        let parsed: PriceHistoryResponse = serde_json::from_value(v).unwrap();
        let series = parsed.into_series(2).unwrap();

        assert_eq!(series.sessions(), &[d(3), d(4)]);
        assert_eq!(series.closes(Symbol::Hyg).unwrap(), &[80.5, 81.0]);
        assert_eq!(series.closes(Symbol::Vix).unwrap(), &[16.0, 17.0]);
        assert!(series.closes(Symbol::Tlt).is_err());
    }

    #[test]
    fn rejects_newest_first_sessions() {
        let v = json!({
            "sessions": [d(4), d(3), d(2)],
            "closes": { "SPY": [502.0, 501.0, 500.0] }
        });
        let parsed: PriceHistoryResponse = serde_json::from_value(v).unwrap();
        assert_eq!(
            parsed.into_series(10).unwrap_err(),
            RiskError::UnorderedSessions {
                previous: d(4),
                next: d(3)
            }
        );
    }

    #[test]
    fn rejects_duplicate_sessions() {
        let v = json!({
            "sessions": [d(2), d(3), d(3)],
            "closes": { "SPY": [500.0, 501.0, 501.0] }
        });
        let parsed: PriceHistoryResponse = serde_json::from_value(v).unwrap();
        assert!(matches!(
            parsed.into_series(2),
            Err(RiskError::UnorderedSessions { .. })
        ));
    }

    #[test]
    fn rejects_short_column() {
        let v = json!({
            "sessions": [d(2), d(3)],
            "closes": { "SPY": [500.0] }
        });
        let parsed: PriceHistoryResponse = serde_json::from_value(v).unwrap();
        assert!(matches!(
            parsed.into_series(10),
            Err(RiskError::MisalignedSeries { symbol: Symbol::Spy, .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_closes_via_deserialize() {
        let v = json!({
            "sessions": [d(2)],
            "closes": { "SPY": ["500.0"] }
        });
        assert!(serde_json::from_value::<PriceHistoryResponse>(v).is_err());
    }

    #[test]
    fn aligns_on_shared_sessions() {
        let mut by_symbol = BTreeMap::new();
        by_symbol.insert(
            Symbol::Spy,
            BTreeMap::from([(d(2), 1.0), (d(3), 2.0), (d(4), 3.0), (d(5), 4.0)]),
        );
        // The VIX has no print for the 4th.
        by_symbol.insert(
            Symbol::Vix,
            BTreeMap::from([(d(2), 10.0), (d(3), 11.0), (d(5), 13.0)]),
        );

        let series = align_sessions(by_symbol, 10).unwrap();
        assert_eq!(series.sessions(), &[d(2), d(3), d(5)]);
        assert_eq!(series.closes(Symbol::Spy).unwrap(), &[1.0, 2.0, 4.0]);
        assert_eq!(series.closes(Symbol::Vix).unwrap(), &[10.0, 11.0, 13.0]);
    }

    #[test]
    fn alignment_keeps_most_recent_window() {
        let mut by_symbol = BTreeMap::new();
        by_symbol.insert(
            Symbol::Spy,
            BTreeMap::from([(d(2), 1.0), (d(3), 2.0), (d(4), 3.0)]),
        );
        let series = align_sessions(by_symbol, 2).unwrap();
        assert_eq!(series.sessions(), &[d(3), d(4)]);
        assert_eq!(series.closes(Symbol::Spy).unwrap(), &[2.0, 3.0]);
    }
}
