use crate::error::RiskError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The ten market proxies the scoring core reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    Hyg,
    Tlt,
    Uup,
    Fxy,
    Rsp,
    Spy,
    Iwm,
    #[serde(alias = "^VIX")]
    Vix,
    Xlu,
    Xlk,
}

impl Symbol {
    pub const ALL: [Symbol; 10] = [
        Symbol::Hyg,
        Symbol::Tlt,
        Symbol::Uup,
        Symbol::Fxy,
        Symbol::Rsp,
        Symbol::Spy,
        Symbol::Iwm,
        Symbol::Vix,
        Symbol::Xlu,
        Symbol::Xlk,
    ];

    pub fn ticker(self) -> &'static str {
        match self {
            Symbol::Hyg => "HYG",
            Symbol::Tlt => "TLT",
            Symbol::Uup => "UUP",
            Symbol::Fxy => "FXY",
            Symbol::Rsp => "RSP",
            Symbol::Spy => "SPY",
            Symbol::Iwm => "IWM",
            Symbol::Vix => "VIX",
            Symbol::Xlu => "XLU",
            Symbol::Xlk => "XLK",
        }
    }

    /// Ticker as quoted by index-aware feeds (the VIX is an index, not a listed fund).
    pub fn feed_ticker(self) -> &'static str {
        match self {
            Symbol::Vix => "^VIX",
            other => other.ticker(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let t = upper.strip_prefix('^').unwrap_or(upper.as_str());
        Symbol::ALL
            .into_iter()
            .find(|sym| sym.ticker() == t)
            .ok_or_else(|| format!("unknown symbol: {s}"))
    }
}

/// Daily closes for each symbol, aligned on one chronological session index (most recent last).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    sessions: Vec<NaiveDate>,
    closes: BTreeMap<Symbol, Vec<f64>>,
}

impl PriceSeries {
    /// Callers must pass sessions oldest first with no repeats; use [`PriceSeries::try_new`] for
    /// dates from outside the crate.
    pub fn new(sessions: Vec<NaiveDate>) -> Self {
        Self {
            sessions,
            closes: BTreeMap::new(),
        }
    }

    /// Like `new`, but rejects a session index that is not strictly increasing.
    pub fn try_new(sessions: Vec<NaiveDate>) -> Result<Self, RiskError> {
        if let Some(pair) = sessions.windows(2).find(|w| w[1] <= w[0]) {
            return Err(RiskError::UnorderedSessions {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(Self::new(sessions))
    }

    pub fn insert(&mut self, symbol: Symbol, closes: Vec<f64>) -> Result<(), RiskError> {
        if closes.len() != self.sessions.len() {
            return Err(RiskError::MisalignedSeries {
                symbol,
                expected: self.sessions.len(),
                actual: closes.len(),
            });
        }
        self.closes.insert(symbol, closes);
        Ok(())
    }

    pub fn with_column(mut self, symbol: Symbol, closes: Vec<f64>) -> Result<Self, RiskError> {
        self.insert(symbol, closes)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> &[NaiveDate] {
        &self.sessions
    }

    pub fn last_session(&self) -> Option<NaiveDate> {
        self.sessions.last().copied()
    }

    pub fn closes(&self, symbol: Symbol) -> Result<&[f64], RiskError> {
        self.closes
            .get(&symbol)
            .map(Vec::as_slice)
            .ok_or(RiskError::MissingSymbol(symbol))
    }

    /// Close at `offset` rows from the end; offset 1 is the latest row.
    pub fn close_back(&self, symbol: Symbol, offset: usize) -> Result<f64, RiskError> {
        let closes = self.closes(symbol)?;
        if offset == 0 || offset > closes.len() {
            return Err(RiskError::InsufficientHistory {
                required: offset.max(1),
                available: closes.len(),
            });
        }
        Ok(closes[closes.len() - offset])
    }

    /// The first `len` sessions, as the series looked at the close of session `len - 1`.
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.min(self.sessions.len());
        Self {
            sessions: self.sessions[..len].to_vec(),
            closes: self
                .closes
                .iter()
                .map(|(sym, v)| (*sym, v[..len].to_vec()))
                .collect(),
        }
    }

    pub fn snapshot(&self, captured_at: DateTime<Utc>) -> Result<CurrentSnapshot, RiskError> {
        if self.sessions.is_empty() {
            return Err(RiskError::InsufficientHistory {
                required: 1,
                available: 0,
            });
        }

        let prices = self
            .closes
            .iter()
            .filter_map(|(sym, v)| v.last().map(|p| (*sym, *p)))
            .collect();

        Ok(CurrentSnapshot {
            captured_at,
            prices,
        })
    }
}

/// Latest price per symbol. Always the last row of the series it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    pub captured_at: DateTime<Utc>,
    pub prices: BTreeMap<Symbol, f64>,
}

impl CurrentSnapshot {
    pub fn price(&self, symbol: Symbol) -> Result<f64, RiskError> {
        self.prices
            .get(&symbol)
            .copied()
            .ok_or(RiskError::MissingSymbol(symbol))
    }
}
