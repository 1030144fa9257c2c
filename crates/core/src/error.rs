use crate::domain::market::Symbol;
use chrono::NaiveDate;

/// Failures of a single pipeline invocation. None of them leave state behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("insufficient history: need at least {required} sessions, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("required symbol {0} is missing")]
    MissingSymbol(Symbol),

    #[error("series for {symbol} has {actual} sessions but the session index has {expected}")]
    MisalignedSeries {
        symbol: Symbol,
        expected: usize,
        actual: usize,
    },

    #[error("session {next} does not follow {previous}; sessions must be strictly increasing")]
    UnorderedSessions { previous: NaiveDate, next: NaiveDate },

    #[error("snapshot price for {symbol} does not match the latest close of the series")]
    SnapshotMismatch { symbol: Symbol },

    #[error("data provider {provider} unavailable: {detail}")]
    DataUnavailable {
        provider: &'static str,
        detail: String,
    },
}

impl RiskError {
    /// True when the feed could not be reached, as opposed to the feed returning malformed data.
    pub fn is_feed_offline(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}
