//! `promod serve` -- HTTP JSON API for the coupon service.
//!
//! Endpoints:
//! - GET  /health                        - Server status
//! - GET  /users/{user_id}/coupons       - Coupons in one status (?status=N)
//! - GET  /users/{user_id}/templates     - Templates the user can acquire
//! - POST /templates                     - Build a template (spawns codegen)
//! - POST /acquire                       - Claim one coupon of a template
//! - POST /settlement                    - Settle a purchase
//!
//! All responses use Content-Type: application/json. Business rejections on
//! the settlement path (ineligible goods, non-combinable coupons) are 200
//! payloads with a cleared selection, not errors.

mod handlers;
mod state;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use promo_core::CouponError;

use self::handlers::{
    handle_acquire, handle_build_template, handle_health, handle_not_found, handle_settlement,
    handle_user_coupons, handle_user_templates,
};
use self::state::AppState;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Map a business error onto an HTTP status.
fn status_for(err: &CouponError) -> StatusCode {
    match err {
        CouponError::TemplateNotFound { .. } => StatusCode::NOT_FOUND,
        CouponError::QuotaExceeded { .. }
        | CouponError::PoolExhausted { .. }
        | CouponError::InvalidTemplate { .. }
        | CouponError::UnknownCode { .. }
        | CouponError::UnsupportedCombination { .. }
        | CouponError::Inconsistent { .. } => StatusCode::BAD_REQUEST,
        CouponError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CouponError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &CouponError) -> axum::response::Response {
    json_error(status_for(err), &err.to_string()).into_response()
}

fn router(state: std::sync::Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/users/{user_id}/coupons", get(handle_user_coupons))
        .route("/users/{user_id}/templates", get(handle_user_templates))
        .route("/templates", post(handle_build_template))
        .route("/acquire", post(handle_acquire))
        .route("/settlement", post(handle_settlement))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the given port with in-memory backends.
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::in_memory();
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("promod listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    eprintln!("\nReceived shutdown signal...");
}
