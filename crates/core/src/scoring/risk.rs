use crate::domain::assessment::{DerivedMetrics, RiskScore, SubScores};

pub const MAX_COMPOSITE: u8 = 10;

const CREDIT_WEIGHT: f64 = 1.0;
const CURRENCY_WEIGHT: f64 = 1.0;
const BREADTH_WEIGHT: f64 = 0.8;
const VOLATILITY_WEIGHT: f64 = 1.0;
const COMPOSITE_SCALE: f64 = 0.8;

/// VIX level under which elevated credit or currency stress counts as a divergence.
const COMPLACENT_VIX: f64 = 15.0;

pub fn score_risk(metrics: &DerivedMetrics) -> RiskScore {
    let credit = credit_score(metrics.hyg_tlt_change_5d, metrics.hyg_tlt_change_10d);
    let currency = currency_score(metrics.fxy_change_5d, metrics.uup_change_5d);
    let breadth = breadth_score(
        metrics.rsp_spy_change_5d,
        metrics.iwm_spy_change_5d,
        metrics.xlu_xlk_change_5d,
    );
    let volatility = volatility_score(metrics.vix_level, metrics.vix_change_5d, credit, currency);

    let sub_scores = SubScores {
        credit,
        currency,
        breadth,
        volatility,
    };

    RiskScore {
        sub_scores,
        composite: composite_score(&sub_scores),
    }
}

/// HYG/TLT weakness, 0..=5. Changes are in percent.
pub fn credit_score(change_5d: f64, change_10d: f64) -> f64 {
    let tier = if change_5d < -2.5 {
        4.0
    } else if change_5d < -1.5 {
        3.0
    } else if change_5d < -0.8 {
        2.0
    } else if change_5d < -0.3 {
        1.0
    } else {
        0.0
    };

    let trend = if change_10d < -3.0 { 1.0 } else { 0.0 };
    tier + trend
}

/// Yen strength with a smaller dollar-strength add-on, 0..=5.
pub fn currency_score(fxy_change_5d: f64, uup_change_5d: f64) -> f64 {
    let yen = if fxy_change_5d > 3.5 {
        4.0
    } else if fxy_change_5d > 2.5 {
        3.0
    } else if fxy_change_5d > 1.5 {
        2.0
    } else if fxy_change_5d > 0.8 {
        1.0
    } else {
        0.0
    };

    let dollar = if uup_change_5d > 4.0 {
        1.0
    } else if uup_change_5d > 2.5 {
        0.5
    } else {
        0.0
    };

    yen + dollar
}

pub fn breadth_score(rsp_spy_change_5d: f64, iwm_spy_change_5d: f64, xlu_xlk_change_5d: f64) -> f64 {
    let equal_weight = if rsp_spy_change_5d < -2.5 {
        2.0
    } else if rsp_spy_change_5d < -1.2 {
        1.5
    } else if rsp_spy_change_5d < -0.6 {
        1.0
    } else {
        0.0
    };

    let small_caps = if iwm_spy_change_5d < -4.0 {
        2.0
    } else if iwm_spy_change_5d < -2.5 {
        1.5
    } else if iwm_spy_change_5d < -1.2 {
        1.0
    } else {
        0.0
    };

    let defensive = if xlu_xlk_change_5d > 3.0 {
        1.5
    } else if xlu_xlk_change_5d > 1.5 {
        1.0
    } else if xlu_xlk_change_5d > 0.8 {
        0.5
    } else {
        0.0
    };

    equal_weight + small_caps + defensive
}

/// 0..=2. A quiet VIX next to credit or currency stress outranks any VIX momentum.
pub fn volatility_score(vix_level: f64, vix_change_5d: f64, credit: f64, currency: f64) -> f64 {
    if vix_level < COMPLACENT_VIX && (credit > 2.0 || currency > 2.0) {
        2.0
    } else if vix_change_5d > 25.0 {
        1.0
    } else if vix_change_5d > 15.0 {
        0.5
    } else {
        0.0
    }
}

pub fn composite_score(sub: &SubScores) -> u8 {
    let weighted = sub.credit * CREDIT_WEIGHT
        + sub.currency * CURRENCY_WEIGHT
        + sub.breadth * BREADTH_WEIGHT
        + sub.volatility * VOLATILITY_WEIGHT;

    let scaled = (weighted * COMPOSITE_SCALE).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, f64::from(MAX_COMPOSITE)) as u8
}
