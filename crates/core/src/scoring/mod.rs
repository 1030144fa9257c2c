//! The scoring core. Every function here is pure: no I/O, no shared state.

pub mod hedge;
pub mod metrics;
pub mod narrative;
pub mod risk;
pub mod strategy;

pub use hedge::hedge_percentage;
pub use metrics::{compute_metrics, MIN_SESSIONS};
pub use narrative::generate_narrative;
pub use risk::score_risk;
pub use strategy::{recommend_hedge, HedgeConfig};
