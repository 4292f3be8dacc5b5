//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`        - Storage health check (public)
//! - `POST /api/register`  - Account registration (public, strict rate limit)
//! - `POST /api/login`     - Token issue (public, strict rate limit)
//! - `/api/*`              - REST API (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Authentication** - Bearer token resolved to a caller identity
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
///
/// The peer-address limiter needs `ConnectInfo<SocketAddr>`, so serve with
/// `into_make_service_with_connect_info`.
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
    let public = api::routes::public_routes();

    let (protected, public) = if behind_proxy {
        (
            protected.layer(rate_limit::layer(SmartIpKeyExtractor)),
            public.layer(rate_limit::secure_layer(SmartIpKeyExtractor)),
        )
    } else {
        (
            protected.layer(rate_limit::layer(PeerIpKeyExtractor)),
            public.layer(rate_limit::secure_layer(PeerIpKeyExtractor)),
        )
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", protected.merge(public))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Same routes and authentication as [`app_router`], without rate limiting
/// or path normalization. Used by integration tests, which run without a
/// peer socket address.
pub fn api_router(state: AppState) -> Router {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", protected.merge(api::routes::public_routes()))
        .with_state(state)
}
