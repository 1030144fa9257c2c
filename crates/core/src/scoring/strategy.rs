use crate::config::env_parse;
use crate::domain::assessment::{HedgeRecommendation, Instrument, LegAction, StrategyLeg};

const DEFAULT_INVERSE_ETF_PRICE: f64 = 27.34;
const DEFAULT_PUT_CONTRACT_COST: f64 = 500.0;
const DEFAULT_CALL_CONTRACT_PREMIUM: f64 = 800.0;

/// Above this VIX, selling calls is paid well enough to replace buying puts.
const RICH_PREMIUM_VIX: f64 = 25.0;

/// Reference prices used to turn dollar allocations into shares and contracts.
#[derive(Debug, Clone, PartialEq)]
pub struct HedgeConfig {
    pub inverse_etf_price: f64,
    /// Cost of one index put contract.
    pub put_contract_cost: f64,
    /// Premium received for one sold index call contract.
    pub call_contract_premium: f64,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            inverse_etf_price: DEFAULT_INVERSE_ETF_PRICE,
            put_contract_cost: DEFAULT_PUT_CONTRACT_COST,
            call_contract_premium: DEFAULT_CALL_CONTRACT_PREMIUM,
        }
    }
}

impl HedgeConfig {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Some(v) = env_parse::<f64>("HEDGE_INVERSE_ETF_PRICE").filter(|v| *v > 0.0) {
            out.inverse_etf_price = v;
        }
        if let Some(v) = env_parse::<f64>("HEDGE_PUT_CONTRACT_COST").filter(|v| *v > 0.0) {
            out.put_contract_cost = v;
        }
        if let Some(v) = env_parse::<f64>("HEDGE_CALL_CONTRACT_PREMIUM").filter(|v| *v > 0.0) {
            out.call_contract_premium = v;
        }

        out
    }
}

pub fn recommend_hedge(
    exposure: f64,
    hedge_percentage: f64,
    vix_level: f64,
    score: u8,
    config: &HedgeConfig,
) -> HedgeRecommendation {
    let hedge_amount = if exposure > 0.0 {
        exposure * hedge_percentage / 100.0
    } else {
        0.0
    };

    HedgeRecommendation {
        hedge_percentage,
        exposure,
        hedge_amount,
        legs: plan_legs(exposure, hedge_percentage, vix_level, score, config),
    }
}

/// Ordered hedge legs, highest priority first. Leg notionals sum to the hedge amount.
pub fn plan_legs(
    exposure: f64,
    hedge_percentage: f64,
    vix_level: f64,
    score: u8,
    config: &HedgeConfig,
) -> Vec<StrategyLeg> {
    if exposure.is_nan() || exposure <= 0.0 {
        return vec![no_hedge(
            "Enter a positive portfolio dollar beta to size a hedge",
        )];
    }

    let hedge_amount = exposure * hedge_percentage / 100.0;

    if score <= 3 {
        if hedge_amount > 0.0 {
            return vec![inverse_etf(
                hedge_amount,
                config,
                "Low cost hedge for minimal risk environment",
            )];
        }
        return vec![no_hedge("Risk environment does not warrant hedging costs")];
    }

    if score <= 6 {
        return vec![
            inverse_etf(
                hedge_amount * 0.75,
                config,
                "Primary hedge via inverse ETF for cost efficiency",
            ),
            long_put(
                hedge_amount * 0.25,
                config,
                "Put options for convexity in moderate stress scenario",
            ),
        ];
    }

    if vix_level > RICH_PREMIUM_VIX {
        vec![
            inverse_etf(
                hedge_amount * 0.6,
                config,
                "Inverse ETF when volatility is already elevated",
            ),
            short_call(
                hedge_amount * 0.4,
                config,
                "Sell calls for additional premium while VIX is high",
            ),
        ]
    } else {
        vec![
            long_put(
                hedge_amount * 0.7,
                config,
                "Put options for gamma exposure ahead of a VIX spike",
            ),
            inverse_etf(hedge_amount * 0.3, config, "Base hedge via inverse ETF"),
        ]
    }
}

fn inverse_etf(allocation: f64, config: &HedgeConfig, rationale: &str) -> StrategyLeg {
    StrategyLeg {
        instrument: Instrument::InverseEtf,
        action: LegAction::Buy,
        quantity: whole_units(allocation, config.inverse_etf_price),
        notional: allocation,
        rationale: rationale.to_string(),
    }
}

fn long_put(allocation: f64, config: &HedgeConfig, rationale: &str) -> StrategyLeg {
    StrategyLeg {
        instrument: Instrument::IndexPut,
        action: LegAction::Buy,
        quantity: whole_units(allocation, config.put_contract_cost),
        notional: allocation,
        rationale: rationale.to_string(),
    }
}

fn short_call(allocation: f64, config: &HedgeConfig, rationale: &str) -> StrategyLeg {
    StrategyLeg {
        instrument: Instrument::IndexCall,
        action: LegAction::Sell,
        quantity: whole_units(allocation, config.call_contract_premium),
        notional: allocation,
        rationale: rationale.to_string(),
    }
}

fn no_hedge(rationale: &str) -> StrategyLeg {
    StrategyLeg {
        instrument: Instrument::NoHedge,
        action: LegAction::HoldCash,
        quantity: 0,
        notional: 0.0,
        rationale: rationale.to_string(),
    }
}

fn whole_units(allocation: f64, unit_price: f64) -> u64 {
    if unit_price <= 0.0 || !allocation.is_finite() || allocation <= 0.0 {
        return 0;
    }
    (allocation / unit_price).floor() as u64
}
