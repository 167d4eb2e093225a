//! HTTP handlers and router.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower::buffer::BufferLayer;
use tower::limit::RateLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use x402_chain_vara::V1VaraExactFacilitator;
use x402_chain_vara::v1_vara_exact::{
    FacilitatorRequest, SettleResponse, VaraExactError, VerifyResponse, outcome_status,
};

use crate::config::FacilitatorConfig;
use crate::metrics::{Metrics, Outcome};

pub const VERIFY_PATH: &str = "/api/facilitator/verify";
pub const SETTLE_PATH: &str = "/api/facilitator/settle";

/// Milliseconds spent on a successful verification.
pub const VERIFICATION_TIME: HeaderName = HeaderName::from_static("x-verification-time");
/// Milliseconds spent on a successful settlement.
pub const SETTLEMENT_TIME: HeaderName = HeaderName::from_static("x-settlement-time");

/// Shared application state.
pub struct AppState {
    pub facilitator: V1VaraExactFacilitator,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(facilitator: V1VaraExactFacilitator) -> Self {
        Self {
            facilitator,
            metrics: Metrics::new(),
        }
    }
}

/// Request limits applied by [`router`].
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub rate_limit_per_minute: u64,
    pub body_limit_bytes: usize,
}

impl From<&FacilitatorConfig> for Limits {
    fn from(config: &FacilitatorConfig) -> Self {
        Self {
            rate_limit_per_minute: config.rate_limit_per_minute,
            body_limit_bytes: config.body_limit_bytes,
        }
    }
}

/// Builds the facilitator router.
pub fn router(state: Arc<AppState>, limits: Limits) -> Router {
    // BufferLayer makes the non-Clone RateLimit service cloneable for axum;
    // HandleErrorLayer turns its overload errors into 429s.
    let rate_limited_routes = Router::new()
        .route(VERIFY_PATH, post(verify_handler))
        .route(SETTLE_PATH, post(settle_handler))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|err: tower::BoxError| async move {
                    tracing::warn!(error = %err, "Rate limit or buffer error");
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(serde_json::json!({
                            "error": "rate_limited",
                            "message": "Too many requests. Please try again later.",
                        })),
                    )
                }))
                .layer(BufferLayer::new(256))
                .layer(RateLimitLayer::new(
                    limits.rate_limit_per_minute,
                    Duration::from_secs(60),
                )),
        );

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/supported", get(supported_handler))
        .route("/metrics", get(metrics_handler))
        .merge(rate_limited_routes)
        .layer(DefaultBodyLimit::max(limits.body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "x402-vara-facilitator",
        "version": env!("CARGO_PKG_VERSION"),
        "chain": "vara",
        "scheme": "exact",
        "endpoints": [VERIFY_PATH, SETTLE_PATH, "/supported", "/health", "/metrics"],
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let networks: Vec<String> = state
        .facilitator
        .supported()
        .kinds
        .into_iter()
        .map(|kind| kind.network)
        .collect();
    Json(serde_json::json!({
        "status": "ok",
        "networks": networks,
    }))
}

async fn supported_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.facilitator.supported())
}

async fn verify_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let started = Instant::now();
    let outcome = match FacilitatorRequest::from_slice(&body) {
        Ok(request) => state.facilitator.verify(&request).await,
        Err(e) => Err(e),
    };
    let elapsed = started.elapsed();
    let status = outcome_status(&outcome);
    state.metrics.record_verify(classify(&outcome, status));

    match &outcome {
        Ok(()) => tracing::info!(elapsed_ms = millis(elapsed), "Payment verified"),
        Err(e) if status.is_server_error() => tracing::error!(error = %e, "Verify failed"),
        Err(e) => tracing::info!(reason = %e, status = status.as_u16(), "Verify rejected"),
    }

    let mut response = (status, Json(VerifyResponse::encode(&outcome))).into_response();
    if outcome.is_ok() {
        set_elapsed(&mut response, VERIFICATION_TIME, elapsed);
    }
    response
}

async fn settle_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let started = Instant::now();
    let outcome = match FacilitatorRequest::from_slice(&body) {
        Ok(request) => state.facilitator.settle(&request).await,
        Err(e) => Err(e),
    };
    let elapsed = started.elapsed();
    let status = outcome_status(&outcome);
    state.metrics.record_settle(classify(&outcome, status));

    match &outcome {
        Ok(settlement) => tracing::info!(
            elapsed_ms = millis(elapsed),
            tx_hash = %settlement.tx_hash,
            network = %settlement.network,
            "Payment settled"
        ),
        Err(e) if status.is_server_error() => tracing::error!(error = %e, "Settle failed"),
        Err(e) => tracing::info!(reason = %e, status = status.as_u16(), "Settle rejected"),
    }

    let mut response = (status, Json(SettleResponse::encode(&outcome))).into_response();
    if outcome.is_ok() {
        set_elapsed(&mut response, SETTLEMENT_TIME, elapsed);
    }
    response
}

/// Returns Prometheus-format metrics as plain text.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

fn classify<T>(outcome: &Result<T, VaraExactError>, status: StatusCode) -> Outcome {
    match outcome {
        Ok(_) => Outcome::Success,
        Err(_) if status.is_server_error() || status == StatusCode::BAD_REQUEST => Outcome::Error,
        Err(_) => Outcome::Rejected,
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn set_elapsed(response: &mut Response, name: HeaderName, elapsed: Duration) {
    response
        .headers_mut()
        .insert(name, HeaderValue::from(millis(elapsed)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402_chain_vara::v1_vara_exact::{SETTLEMENT_TIME_HEADER, VERIFICATION_TIME_HEADER};

    #[test]
    fn test_timing_headers_match_library_names() {
        assert!(VERIFICATION_TIME.as_str().eq_ignore_ascii_case(VERIFICATION_TIME_HEADER));
        assert!(SETTLEMENT_TIME.as_str().eq_ignore_ascii_case(SETTLEMENT_TIME_HEADER));
    }

    #[test]
    fn test_set_elapsed_writes_millis() {
        let mut response = StatusCode::OK.into_response();
        set_elapsed(&mut response, SETTLEMENT_TIME, Duration::from_millis(1500));
        assert_eq!(response.headers()[&SETTLEMENT_TIME], "1500");
        assert_eq!(response.headers()["X-Settlement-Time"], "1500");
    }
}
