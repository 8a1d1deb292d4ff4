pub mod auth;
pub mod chat_task;
pub mod cookies;
pub mod middleware;
pub mod pages;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod toast;
pub mod views;
pub mod ws_handler;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::{require_api_auth, require_auth};
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Builds every route of the application: public pages, signed-in pages and the
/// chat socket, and the JSON API.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(pages::landing_handler))
        .route(
            "/auth/sign-in",
            get(auth::sign_in_page).post(auth::sign_in_handler),
        )
        .route(
            "/auth/sign-up",
            get(auth::sign_up_page).post(auth::sign_up_handler),
        )
        .route("/auth/oauth/{provider}", get(auth::oauth_start_handler))
        .route("/auth/callback", get(auth::oauth_callback_handler))
        .route("/auth/sign-out", post(auth::sign_out_handler));

    // Protected pages (redirect to sign-in)
    let page_routes = Router::new()
        .route("/dashboard", get(pages::dashboard_handler))
        .route("/dashboard/sessions", post(pages::create_session_handler))
        .route(
            "/dashboard/sessions/{id}/delete",
            post(pages::delete_session_handler),
        )
        .route(
            "/dashboard/new-session",
            get(pages::new_session_page).post(pages::new_session_handler),
        )
        .route("/dashboard/session/{id}", get(pages::chat_page_handler))
        .route("/ws/sessions/{id}", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Protected JSON API (401 instead of redirect)
    let api_routes = Router::new()
        .route("/api/me", get(rest::me_handler))
        .route(
            "/api/sessions",
            get(rest::list_sessions_handler).post(rest::create_session_handler),
        )
        .route(
            "/api/sessions/{id}",
            get(rest::get_session_handler).delete(rest::delete_session_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_api_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
