//! Router construction — mirrors `sem_os_server::router::build_router`'s
//! shape (public health routes, a `tower-http` trace layer, shared state
//! via `Extension`/`State`) without the JWT middleware layer this engine's
//! scope has no use for (§1: no cross-tenant isolation, no auth surface in
//! scope).

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/claims/check-duplicate",
            post(handlers::check_duplicate::check_duplicate),
        )
        .route(
            "/claims/check-duplicate-batch",
            post(handlers::check_duplicate::check_duplicate_batch),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
