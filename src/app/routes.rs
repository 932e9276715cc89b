//! Route registration for the portal.

use crate::app::state::AppState;
use crate::app::{handlers, pages};
use crate::core::session_gate::session_gate;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

/// Builds the complete router. The session gate wraps every route and
/// ignores `/api/*` on its own.
pub fn build_router(state: AppState) -> Router {
    let gate = state.gate.clone();

    let erp_proxy = get(handlers::proxy)
        .post(handlers::proxy)
        .put(handlers::proxy)
        .patch(handlers::proxy)
        .delete(handlers::proxy);

    Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login_form).post(pages::login_submit))
        .route("/logout", post(pages::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/projects/{name}", get(pages::project_detail))
        .route("/api/health", get(handlers::health))
        .route("/api/version", get(handlers::version))
        .route("/api/erp/{*path}", erp_proxy)
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, session_gate))
}
