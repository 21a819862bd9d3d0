//! Operator REST API handlers for run control.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Current run status |
//! | `POST` | `/api/operator/stop` | Trigger clean shutdown |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use hedgehog_core::control::{RunControl, RunEndReason};
use hedgehog_types::EventId;

use crate::error::ConsoleError;
use crate::state::AppState;

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

/// Response body for `GET /api/operator/status`.
#[derive(Debug, serde::Serialize)]
struct StatusResponse {
    /// Whether a stop has been requested.
    stop_requested: bool,
    /// Cycles completed.
    cycles: u64,
    /// When the run started.
    started_at: DateTime<Utc>,
    /// Why the run ended, if it has.
    end_reason: Option<RunEndReason>,
    /// Whether the console accepts alerts.
    console_online: bool,
    /// Events awaiting a decision.
    pending_events: Vec<EventId>,
}

fn control(state: &AppState) -> Result<&Arc<RunControl>, ConsoleError> {
    state
        .control
        .as_ref()
        .ok_or_else(|| ConsoleError::Internal("run control not available".to_owned()))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return the current run status.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ConsoleError> {
    let control = control(&state)?;
    Ok(Json(StatusResponse {
        stop_requested: control.is_stop_requested(),
        cycles: control.cycles(),
        started_at: control.started_at(),
        end_reason: control.end_reason().await,
        console_online: state.board.is_online(),
        pending_events: state.arbiter.pending_events().await,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Request a clean stop.
///
/// The current cycle finishes (including any pending decision), then the
/// run loop exits. The console keeps serving afterwards.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ConsoleError> {
    let control = control(&state)?;
    control.request_stop();
    tracing::info!("operator requested stop");

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Stop requested; the run will end after the current cycle".to_owned(),
    }))
}
