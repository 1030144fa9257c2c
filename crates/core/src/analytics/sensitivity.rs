use crate::scoring::hedge_percentage;
use serde::{Deserialize, Serialize};

pub const VIX_LEVELS: [f64; 10] = [10.0, 12.0, 15.0, 18.0, 20.0, 25.0, 30.0, 35.0, 40.0, 50.0];
pub const SCORES: [u8; 6] = [0, 2, 4, 6, 8, 10];

const NEUTRAL_PERCENTILE: f64 = 50.0;
/// Expected index decline, in percent, per VIX point.
const DECLINE_PER_VIX_POINT: f64 = 0.4;
const HIGHLIGHT_VIX_BAND: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub vix: f64,
    pub score: u8,
    pub hedge_percentage: f64,
    /// Expected portfolio move in percent after hedging.
    pub net_impact: f64,
    /// The cell closest to current conditions.
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityMatrix {
    pub vix_levels: Vec<f64>,
    pub scores: Vec<u8>,
    /// One row per VIX level, one cell per score.
    pub rows: Vec<Vec<SensitivityCell>>,
}

impl SensitivityMatrix {
    pub fn cell(&self, vix: f64, score: u8) -> Option<&SensitivityCell> {
        self.rows
            .iter()
            .flatten()
            .find(|c| c.vix == vix && c.score == score)
    }
}

pub fn sensitivity_matrix(current_score: u8, current_vix: f64) -> SensitivityMatrix {
    let rows = VIX_LEVELS
        .iter()
        .map(|&vix| {
            SCORES
                .iter()
                .map(|&score| {
                    let hedge = hedge_percentage(score, NEUTRAL_PERCENTILE, vix);
                    SensitivityCell {
                        vix,
                        score,
                        hedge_percentage: hedge,
                        net_impact: net_impact(vix, hedge),
                        highlighted: (vix - current_vix).abs() < HIGHLIGHT_VIX_BAND
                            && score == current_score,
                    }
                })
                .collect()
        })
        .collect();

    SensitivityMatrix {
        vix_levels: VIX_LEVELS.to_vec(),
        scores: SCORES.to_vec(),
        rows,
    }
}

fn net_impact(vix: f64, hedge_percentage: f64) -> f64 {
    let expected_decline = -(vix * DECLINE_PER_VIX_POINT);
    expected_decline * (1.0 - hedge_percentage / 100.0)
}
