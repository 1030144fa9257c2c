pub mod cache;
pub mod provider;
pub mod types;
pub mod yahoo;

pub use cache::CachedHistoryProvider;
pub use provider::{provider_from_settings, HttpJsonPriceProvider, PriceHistoryProvider};
pub use yahoo::YahooChartProvider;
