use crate::domain::market::{PriceSeries, Symbol};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

pub(crate) const FLAT_PRICE: f64 = 100.0;
pub(crate) const FLAT_VIX: f64 = 20.0;

/// Builds aligned fixture series: every symbol flat at 100, the VIX flat at 20.
pub(crate) struct SeriesBuilder {
    sessions: Vec<NaiveDate>,
    columns: BTreeMap<Symbol, Vec<f64>>,
}

impl SeriesBuilder {
    pub(crate) fn flat(len: usize) -> Self {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let sessions = (0..len)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        let columns = Symbol::ALL
            .into_iter()
            .map(|sym| {
                let level = if sym == Symbol::Vix { FLAT_VIX } else { FLAT_PRICE };
                (sym, vec![level; len])
            })
            .collect();
        Self { sessions, columns }
    }

    /// Overrides the close `offset` rows from the end (1 = latest).
    pub(crate) fn set(mut self, symbol: Symbol, offset: usize, value: f64) -> Self {
        let col = self.columns.get_mut(&symbol).unwrap();
        let idx = col.len() - offset;
        col[idx] = value;
        self
    }

    /// Replaces the VIX with a 10..=39 ramp over the 30 sessions before the latest, which closes
    /// at 20: a one-third percentile and a falling 5-session change. Needs at least 31 sessions.
    pub(crate) fn neutral_vix(self) -> Self {
        let len = self.sessions.len();
        let mut vix = vec![FLAT_VIX; len - 31];
        vix.extend((10..40).map(f64::from));
        vix.push(FLAT_VIX);
        self.column(Symbol::Vix, vix)
    }

    pub(crate) fn column(mut self, symbol: Symbol, closes: Vec<f64>) -> Self {
        self.columns.insert(symbol, closes);
        self
    }

    pub(crate) fn without(mut self, symbol: Symbol) -> Self {
        self.columns.remove(&symbol);
        self
    }

    pub(crate) fn build(self) -> PriceSeries {
        let mut series = PriceSeries::new(self.sessions);
        for (sym, closes) in self.columns {
            series.insert(sym, closes).unwrap();
        }
        series
    }
}

pub(crate) fn captured_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap()
}
