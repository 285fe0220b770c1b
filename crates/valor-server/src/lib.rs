//! valor-server
//!
//! HTTP surface of the Valor chat relay: request validation, session
//! bookkeeping around each upstream call, and the browser chat page.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod state;

use state::AppState;

/// Uploads larger than this are rejected before reaching a handler.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::page::index))
        .route("/health", get(routes::health::health_check))
        .route("/api/chat", post(routes::chat::chat))
        .route("/api/ask", post(routes::chat::chat))
        .route(
            "/api/conversation/{user_id}",
            get(routes::conversation::get_conversation),
        )
        .route(
            "/api/conversation/{user_id}/clear",
            post(routes::conversation::clear_conversation),
        )
        .route("/api/speak", post(routes::speak::speak))
        .route("/api/analyze-image", post(routes::analyze::analyze_image))
        .route("/api/gcode", post(routes::gcode::generate_gcode))
        .route("/api/check-api-key", get(routes::api_key::check_api_key))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum_mw::from_fn(middleware::request_log::request_log))
        .layer(cors)
        .with_state(state)
}
