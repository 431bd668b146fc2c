use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::{
    middleware::secured,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod customer;
pub mod debug;
pub mod doc;
pub mod health;
pub mod params;
pub mod public;
pub mod register;
pub mod shop;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::api_router())
        .nest("/admin", admin::router())
        .nest("/shop", shop::router())
        .nest("/customer", customer::router())
        .nest("/public", public::router())
}

/// Every route of the application behind the session layer and auth gate.
///
/// Transport layers (tracing, limits) are left to the caller.
pub fn build_router<Store>(
    state: AppState,
    sessions: SessionManagerLayer<Store>,
    debug_routes: bool,
) -> Router
where
    Store: SessionStore + Clone,
{
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::web_router())
        .merge(register::router())
        .nest("/api", create_api_router());
    if debug_routes {
        tracing::warn!("debug routes enabled under /debug");
        router = router.merge(debug::router());
    }

    let registry = state.sessions.clone();
    secured(router.fallback(not_found), registry, sessions)
        .with_state(state)
        .merge(doc::scalar_docs())
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
