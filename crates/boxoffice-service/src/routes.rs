//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, purchases, reservations, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for buyer-facing API endpoints.
/// Each purchase holds a slot for up to the gateway timeout.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /healthz` - Health check
///
/// ## Buyers (Bearer JWT auth)
/// - `POST /v1/tickets/purchase` - Reserve tickets and open a checkout session
/// - `GET /v1/reservations/:id` - Poll a reservation
/// - `POST /v1/reservations/:id/checkout` - Re-issue a checkout session
///
/// ## Webhooks (optional signature verification)
/// - `POST /webhooks/chapa` - Chapa payment notifications
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/tickets/purchase", post(purchases::purchase_tickets))
        .route("/reservations/:id", get(reservations::get_reservation))
        .route(
            "/reservations/:id/checkout",
            post(reservations::reissue_checkout),
        )
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/healthz", get(health::health))
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - redelivery is driven by the gateway)
        .route("/webhooks/chapa", post(webhooks::chapa_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
