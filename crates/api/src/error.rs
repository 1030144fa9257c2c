use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use riskterm_core::RiskError;

/// Error type for API responses. Every variant renders a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// The price feed could not be reached.
    Offline { provider: &'static str, detail: String },
    /// The price feed answered with data that cannot be scored.
    BadGateway(String),
    BadRequest(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline { provider, detail } => write!(f, "feed_offline: {provider}: {detail}"),
            Self::BadGateway(msg) => write!(f, "bad_gateway: {msg}"),
            Self::BadRequest(msg) => write!(f, "bad_request: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Offline { provider, detail } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "status": "offline", "provider": provider, "error": detail }),
            ),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<RiskError> for ApiError {
    fn from(e: RiskError) -> Self {
        match e {
            RiskError::DataUnavailable { provider, detail } => Self::Offline { provider, detail },
            other => {
                let err = anyhow::Error::new(other.clone()).context("price feed returned unusable data");
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %other, "rejecting malformed feed data");
                Self::BadGateway(other.to_string())
            }
        }
    }
}

impl From<axum::extract::rejection::QueryRejection> for ApiError {
    fn from(e: axum::extract::rejection::QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}
