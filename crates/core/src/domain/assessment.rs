use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Relative changes and ranks derived from one price window. All changes are in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub hyg_tlt_ratio: f64,
    pub hyg_tlt_change_5d: f64,
    pub hyg_tlt_change_10d: f64,
    pub fxy_change_5d: f64,
    pub uup_change_5d: f64,
    pub rsp_spy_change_5d: f64,
    /// Small-cap performance relative to SPY over the same 5 sessions.
    pub iwm_spy_change_5d: f64,
    /// XLU/XLK ratio change; positive means rotation into defensives.
    pub xlu_xlk_change_5d: f64,
    pub vix_level: f64,
    /// Share (0-100) of the trailing 30 sessions closing strictly below the current VIX.
    pub vix_percentile: f64,
    pub vix_change_5d: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub credit: f64,
    pub currency: f64,
    pub breadth: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub sub_scores: SubScores,
    /// Weighted and rescaled to 0..=10.
    pub composite: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Inverse broad-market ETF (SH).
    InverseEtf,
    IndexPut,
    IndexCall,
    NoHedge,
}

impl Instrument {
    pub fn label(self) -> &'static str {
        match self {
            Instrument::InverseEtf => "SH (Inverse S&P ETF)",
            Instrument::IndexPut => "SPY Put Options",
            Instrument::IndexCall => "SPY Call Options",
            Instrument::NoHedge => "NO HEDGE REQUIRED",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Instrument::InverseEtf => "shares",
            Instrument::IndexPut | Instrument::IndexCall => "contracts",
            Instrument::NoHedge => "n/a",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegAction {
    Buy,
    Sell,
    HoldCash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyLeg {
    pub instrument: Instrument,
    pub action: LegAction,
    /// Whole shares or contracts; the fractional remainder of the allocation is not traded.
    pub quantity: u64,
    /// Dollars allocated to the leg. For sold options this is premium received.
    pub notional: f64,
    pub rationale: String,
}

impl StrategyLeg {
    pub fn is_actionable(&self) -> bool {
        self.instrument != Instrument::NoHedge
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeRecommendation {
    pub hedge_percentage: f64,
    pub exposure: f64,
    pub hedge_amount: f64,
    pub legs: Vec<StrategyLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub risk_level: String,
    pub summary: String,
    pub vix_outlook: String,
}

/// Everything one refresh cycle hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub captured_at: DateTime<Utc>,
    pub session: Option<NaiveDate>,
    pub risk_score: u8,
    pub sub_scores: SubScores,
    pub derived_metrics: DerivedMetrics,
    pub hedge_recommendation: HedgeRecommendation,
    pub narratives: Narrative,
}
