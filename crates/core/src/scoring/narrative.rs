//! Fixed-precedence classifiers that turn scores and metrics into status text.
//!
//! Each classifier is total: the first matching rule wins and the last arm is a catch-all.

use crate::domain::assessment::{DerivedMetrics, Narrative, RiskScore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Extreme,
    High,
    Moderate,
    Low,
}

impl RiskTier {
    pub fn classify(score: u8) -> Self {
        match score {
            8..=u8::MAX => RiskTier::Extreme,
            6..=7 => RiskTier::High,
            4..=5 => RiskTier::Moderate,
            _ => RiskTier::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Extreme => "EXTREME RISK",
            RiskTier::High => "HIGH RISK",
            RiskTier::Moderate => "MODERATE RISK",
            RiskTier::Low => "LOW RISK",
        }
    }

    fn assessment(self) -> &'static str {
        match self {
            RiskTier::Extreme => {
                "EXTREME RISK ENVIRONMENT with multiple stress indicators flashing red"
            }
            RiskTier::High => "ELEVATED RISK CONDITIONS with significant market stress building",
            RiskTier::Moderate => "MODERATE RISK LEVELS with selective pressure points emerging",
            RiskTier::Low => "LOW RISK ENVIRONMENT with markets showing resilience",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityOutlook {
    DivergenceAlert,
    BuildingPressure,
    MeanReversion,
    ElevatedRegime,
    ComplacencyWarning,
    Neutral,
}

impl VolatilityOutlook {
    pub fn classify(score: u8, vix_level: f64, vix_percentile: f64) -> Self {
        if score >= 8 && vix_level < 25.0 {
            VolatilityOutlook::DivergenceAlert
        } else if score >= 6 && vix_level < 20.0 {
            VolatilityOutlook::BuildingPressure
        } else if vix_level > 30.0 && score < 4 {
            VolatilityOutlook::MeanReversion
        } else if vix_percentile > 80.0 {
            VolatilityOutlook::ElevatedRegime
        } else if vix_percentile < 20.0 {
            VolatilityOutlook::ComplacencyWarning
        } else {
            VolatilityOutlook::Neutral
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            VolatilityOutlook::DivergenceAlert => {
                "DIVERGENCE ALERT: High risk score with low VIX suggests imminent spike to 25-35 range"
            }
            VolatilityOutlook::BuildingPressure => {
                "BUILDING PRESSURE: Risk indicators elevated, expect VIX advance to 20-25 range"
            }
            VolatilityOutlook::MeanReversion => {
                "MEAN REVERSION: High VIX with improving fundamentals suggests decline to 15-20 range"
            }
            VolatilityOutlook::ElevatedRegime => {
                "ELEVATED REGIME: VIX in top quintile, monitor for reversal signals"
            }
            VolatilityOutlook::ComplacencyWarning => {
                "COMPLACENCY WARNING: Low volatility environment vulnerable to sudden spikes"
            }
            VolatilityOutlook::Neutral => {
                "NEUTRAL ENVIRONMENT: VIX in normal range, monitor risk score for early warnings"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreditStatus {
    Widening,
    EarlyStress,
    Stable,
}

impl CreditStatus {
    fn classify(hyg_tlt_change_5d: f64) -> Self {
        if hyg_tlt_change_5d < -2.0 {
            CreditStatus::Widening
        } else if hyg_tlt_change_5d < -1.0 {
            CreditStatus::EarlyStress
        } else {
            CreditStatus::Stable
        }
    }

    fn text(self) -> &'static str {
        match self {
            CreditStatus::Widening => {
                "credit spreads widening aggressively indicating institutional stress"
            }
            CreditStatus::EarlyStress => "credit markets showing initial signs of stress",
            CreditStatus::Stable => "credit conditions remain stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CurrencyStatus {
    FlightToQuality,
    RiskOff,
    Normal,
}

impl CurrencyStatus {
    fn classify(fxy_change_5d: f64) -> Self {
        if fxy_change_5d > 2.0 {
            CurrencyStatus::FlightToQuality
        } else if fxy_change_5d > 1.0 {
            CurrencyStatus::RiskOff
        } else {
            CurrencyStatus::Normal
        }
    }

    fn text(self) -> &'static str {
        match self {
            CurrencyStatus::FlightToQuality => {
                "strong JPY appreciation signaling flight-to-quality flows"
            }
            CurrencyStatus::RiskOff => "moderate JPY strength suggesting risk-off sentiment",
            CurrencyStatus::Normal => "currency markets showing normal risk appetite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreadthStatus {
    Deteriorating,
    Weakening,
    Healthy,
}

impl BreadthStatus {
    fn classify(rsp_spy_change_5d: f64, iwm_spy_change_5d: f64) -> Self {
        let narrow = rsp_spy_change_5d < -1.0;
        let small_caps_lag = iwm_spy_change_5d < -2.0;
        match (narrow, small_caps_lag) {
            (true, true) => BreadthStatus::Deteriorating,
            (true, false) | (false, true) => BreadthStatus::Weakening,
            (false, false) => BreadthStatus::Healthy,
        }
    }

    fn text(self) -> &'static str {
        match self {
            BreadthStatus::Deteriorating => {
                "market breadth deteriorating with small caps severely underperforming"
            }
            BreadthStatus::Weakening => "market breadth showing signs of weakness",
            BreadthStatus::Healthy => "broad market participation remains healthy",
        }
    }
}

fn vix_status(vix_level: f64) -> String {
    if vix_level > 30.0 {
        format!("VIX elevated at {vix_level:.1} suggesting high fear levels")
    } else if vix_level < 15.0 {
        format!("VIX compressed at {vix_level:.1} indicating complacency")
    } else {
        format!("VIX at {vix_level:.1} within normal ranges")
    }
}

fn hedge_urgency(hedge_percentage: f64) -> String {
    let pct = hedge_percentage;
    if pct > 70.0 {
        format!("IMMEDIATE AGGRESSIVE HEDGING REQUIRED at {pct:.0}% of dollar beta")
    } else if pct > 40.0 {
        format!("SIGNIFICANT HEDGE POSITION WARRANTED at {pct:.0}% of dollar beta")
    } else if pct > 20.0 {
        format!("MODERATE HEDGING APPROPRIATE at {pct:.0}% of dollar beta")
    } else {
        format!("MINIMAL HEDGE REQUIRED at {pct:.0}% of dollar beta")
    }
}

pub fn market_summary(score: &RiskScore, metrics: &DerivedMetrics, hedge_percentage: f64) -> String {
    let risk = RiskTier::classify(score.composite).assessment();
    let credit = CreditStatus::classify(metrics.hyg_tlt_change_5d).text();
    let currency = CurrencyStatus::classify(metrics.fxy_change_5d).text();
    let breadth =
        BreadthStatus::classify(metrics.rsp_spy_change_5d, metrics.iwm_spy_change_5d).text();
    let vix = vix_status(metrics.vix_level);
    let hedge = hedge_urgency(hedge_percentage);
    let sub = &score.sub_scores;

    format!(
        "MARKET ANALYSIS: {risk}. Current assessment shows {credit}, while {currency}. \
         Market internals indicate {breadth}. Volatility measures show {vix} ({:.0}th percentile). \
         Forward-looking risk indicators suggest {hedge}. Risk score of {}/10 reflects confluence of \
         credit stress ({}/5), currency flows ({}/5), and breadth deterioration ({}/5.5).",
        metrics.vix_percentile, score.composite, sub.credit, sub.currency, sub.breadth,
    )
}

pub fn generate_narrative(score: &RiskScore, metrics: &DerivedMetrics, hedge_percentage: f64) -> Narrative {
    let outlook =
        VolatilityOutlook::classify(score.composite, metrics.vix_level, metrics.vix_percentile);

    Narrative {
        risk_level: RiskTier::classify(score.composite).label().to_string(),
        summary: market_summary(score, metrics, hedge_percentage),
        vix_outlook: outlook.text().to_string(),
    }
}
