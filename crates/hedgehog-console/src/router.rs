//! Axum router construction for the operator console.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for a browser-based console.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, operator, ws};

/// Build the complete Axum router for the console.
///
/// The router includes:
/// - `GET /ws/alerts` -- `WebSocket` console message stream
/// - `GET /api/alert` -- the alert awaiting a decision
/// - `GET /api/responders` -- the responder roster
/// - `GET /api/game` -- score counters and status
/// - `POST /api/decisions` -- submit a responder selection
/// - `GET /api/operator/status` -- run status
/// - `POST /api/operator/stop` -- request a clean stop
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/alerts", get(ws::ws_alerts))
        // REST API
        .route("/api/alert", get(handlers::get_alert))
        .route("/api/responders", get(handlers::get_responders))
        .route("/api/game", get(handlers::get_game))
        .route("/api/decisions", post(handlers::submit_decision))
        // Operator
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
