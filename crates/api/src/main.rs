use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskterm_core::analytics::history::{
    indicator_series, score_history, IndicatorSeries, ScorePoint, DEFAULT_HISTORY_SESSIONS,
};
use riskterm_core::analytics::sensitivity::{sensitivity_matrix, SensitivityMatrix};
use riskterm_core::config::{FeedOptions, Settings};
use riskterm_core::domain::assessment::RiskAssessment;
use riskterm_core::ingest::{provider_from_settings, CachedHistoryProvider, PriceHistoryProvider};
use riskterm_core::pipeline::assess_latest;
use riskterm_core::scoring::{compute_metrics, score_risk, HedgeConfig, MIN_SESSIONS};

mod error;

use error::ApiError;

const DEFAULT_EXPOSURE: f64 = 100_000.0;
const MAX_HISTORY_SESSIONS: usize = 250;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let feed = FeedOptions::from_env();
    let provider = provider_from_settings(&settings, &feed)?;
    tracing::info!(provider = provider.provider_name(), window = feed.window, "price provider ready");

    let state = AppState {
        provider: Arc::new(CachedHistoryProvider::new(provider, feed.cache_ttl)),
        hedge: HedgeConfig::from_env(),
        window: feed.window.max(MIN_SESSIONS),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/assessment", get(get_assessment))
        .route("/history", get(get_history))
        .route("/sensitivity", get(get_sensitivity))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn PriceHistoryProvider>,
    hedge: HedgeConfig,
    /// Sessions fetched for a live assessment.
    window: usize,
}

#[derive(Debug, Default, Deserialize)]
struct AssessmentQuery {
    exposure: Option<f64>,
}

async fn get_assessment(
    State(state): State<AppState>,
    query: Result<Query<AssessmentQuery>, QueryRejection>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let Query(query) = query?;
    let exposure = query.exposure.unwrap_or(DEFAULT_EXPOSURE);

    let series = state.provider.fetch_history(state.window).await?;
    let assessment = assess_latest(&series, chrono::Utc::now(), exposure, &state.hedge)?;

    Ok(Json(assessment))
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    sessions: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    scores: Vec<ScorePoint>,
    indicators: IndicatorSeries,
}

async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(query) = query?;
    let sessions = query.sessions.unwrap_or(DEFAULT_HISTORY_SESSIONS);
    if sessions == 0 || sessions > MAX_HISTORY_SESSIONS {
        return Err(ApiError::BadRequest(format!(
            "sessions must be between 1 and {MAX_HISTORY_SESSIONS} (got {sessions})"
        )));
    }

    // Every requested point needs its own trailing scoring window.
    let window = state.window.max(sessions + MIN_SESSIONS - 1);
    let series = state.provider.fetch_history(window).await?;

    Ok(Json(HistoryResponse {
        scores: score_history(&series, sessions)?,
        indicators: indicator_series(&series, sessions)?,
    }))
}

#[derive(Debug, Serialize)]
struct SensitivityResponse {
    current_score: u8,
    current_vix: f64,
    matrix: SensitivityMatrix,
}

async fn get_sensitivity(State(state): State<AppState>) -> Result<Json<SensitivityResponse>, ApiError> {
    let series = state.provider.fetch_history(state.window).await?;
    let snapshot = series.snapshot(chrono::Utc::now())?;
    let metrics = compute_metrics(&series, &snapshot)?;
    let score = score_risk(&metrics);

    Ok(Json(SensitivityResponse {
        current_score: score.composite,
        current_vix: metrics.vix_level,
        matrix: sensitivity_matrix(score.composite, metrics.vix_level),
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
