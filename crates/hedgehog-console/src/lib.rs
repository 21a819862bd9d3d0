//! Operator console for the Hedgehog alert processor.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/alerts`) streaming pending alerts,
//!   resolutions, and the final game-over message via
//!   [`tokio::sync::broadcast`]
//! - **REST endpoints** for the pending alert, the responder roster, the
//!   game score, and decision submission
//! - **Operator endpoints** for run status and a clean stop
//!
//! # Architecture
//!
//! [`ConsoleBoard`] is the arbiter's [`AlertPublisher`]: it holds the alert
//! currently awaiting a decision and fans notices out to `WebSocket`
//! clients. Submissions go straight to the shared
//! [`DecisionArbiter`](hedgehog_core::arbiter::DecisionArbiter), which
//! settles any race with the deadline. The board reports itself offline
//! until the listener is bound, so alerts raised before the console is
//! reachable resolve through the fallback policy.
//!
//! [`AlertPublisher`]: hedgehog_core::arbiter::AlertPublisher

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::spawn_console;
pub use state::{AppState, ConsoleBoard, ConsoleMessage, GameSnapshot};
