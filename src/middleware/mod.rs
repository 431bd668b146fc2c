use axum::{Router, middleware::from_fn_with_state};
use tower_sessions::{SessionManagerLayer, SessionStore};

pub mod auth;
pub mod session;

use self::{auth::auth_gate, session::SessionRegistry};

/// Run every route of `router` through the auth gate, inside the session layer.
pub fn secured<St, Store>(
    router: Router<St>,
    registry: SessionRegistry,
    sessions: SessionManagerLayer<Store>,
) -> Router<St>
where
    St: Clone + Send + Sync + 'static,
    Store: SessionStore + Clone,
{
    router
        .layer(from_fn_with_state(registry, auth_gate))
        .layer(sessions)
}
