//! Console startup helper for embedding in the engine.
//!
//! Provides [`spawn_console`] which binds the listener eagerly (so a port
//! clash is reported at startup) and then serves on a background Tokio
//! task alongside the pipeline.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the console.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the console HTTP server on a background Tokio task.
///
/// The board is online once this returns. The server runs until the
/// runtime shuts down or the returned handle is aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot be bound.
pub async fn spawn_console(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = server::bind(config).await?;
    // Mark online before the task is scheduled so the first alert is not
    // refused while the task is still starting.
    state.board.set_online(true);

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Console server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "Console server spawned on background task");

    Ok(handle)
}
