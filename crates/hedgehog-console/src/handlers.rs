//! REST endpoint handlers for the operator console.
//!
//! All handlers extract [`AppState`] via Axum's `State` extractor. Reads
//! come from the board and the score snapshot; the only write is decision
//! submission, which goes straight to the arbiter.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use hedgehog_core::arbiter::SubmitOutcome;
use hedgehog_types::{AlertNotice, DecisionOrigin, EventId, ResponderId};
use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Response body for `GET /api/alert`.
#[derive(Debug, Serialize)]
struct AlertView {
    /// The alert awaiting a decision, if any.
    alert: Option<AlertNotice>,
    /// Whole seconds left before the deadline.
    seconds_left: Option<u64>,
}

/// Response body for `GET /api/responders`.
#[derive(Debug, Serialize)]
struct RosterView {
    /// Known responders in preference order.
    responders: Vec<ResponderId>,
    /// The designated primary responder.
    primary: ResponderId,
}

/// Request body for `POST /api/decisions`.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// The event being decided.
    pub event_id: EventId,
    /// Responders to dispatch. Empty means log only.
    #[serde(default)]
    pub responders: Vec<ResponderId>,
}

/// Response body for `POST /api/decisions`.
#[derive(Debug, Serialize)]
struct DecisionResponse {
    /// Whether this submission resolved the event.
    applied: bool,
    /// Origin of the decision in force.
    origin: DecisionOrigin,
    /// Responders of the decision in force.
    chosen_responders: BTreeSet<ResponderId>,
    /// Human-readable message.
    message: String,
}

// ---------------------------------------------------------------------------
// GET /api/alert
// ---------------------------------------------------------------------------

/// The alert currently awaiting a decision.
pub async fn get_alert(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let alert = state.board.current_alert();
    let seconds_left = alert.as_ref().map(|n| n.seconds_left(Utc::now()));
    Json(AlertView {
        alert,
        seconds_left,
    })
}

// ---------------------------------------------------------------------------
// GET /api/responders
// ---------------------------------------------------------------------------

/// The responders an operator may choose from.
pub async fn get_responders(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let roster = state.arbiter.roster();
    Json(RosterView {
        responders: roster.iter().cloned().collect(),
        primary: roster.primary().clone(),
    })
}

// ---------------------------------------------------------------------------
// GET /api/game
// ---------------------------------------------------------------------------

/// Current score counters and status.
pub async fn get_game(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let game = *state.game.read().await;
    Json(game)
}

// ---------------------------------------------------------------------------
// POST /api/decisions
// ---------------------------------------------------------------------------

/// Submit the operator's responder selection for a pending event.
///
/// A submission that arrives after the event was resolved is answered
/// with `applied: false` and the decision that won.
///
/// # Errors
///
/// Returns [`ConsoleError::BadRequest`] for unknown responders and
/// [`ConsoleError::NotFound`] for unknown events.
pub async fn submit_decision(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DecisionRequest>,
) -> Result<impl IntoResponse, ConsoleError> {
    let selection: BTreeSet<ResponderId> = body.responders.into_iter().collect();
    let outcome = state
        .arbiter
        .submit_decision(&body.event_id, selection)
        .await?;

    let message = match &outcome {
        SubmitOutcome::Applied(d) if d.chosen_responders.is_empty() => {
            "Decision recorded: alert will only be logged".to_owned()
        }
        SubmitOutcome::Applied(d) => format!(
            "Decision recorded: dispatching {}",
            join(&d.chosen_responders)
        ),
        SubmitOutcome::AlreadyResolved(d) => format!(
            "Too late: event was already resolved by {} and your choice was not applied",
            d.origin
        ),
    };
    let applied = outcome.applied();
    let decision = outcome.decision();

    Ok(Json(DecisionResponse {
        applied,
        origin: decision.origin,
        chosen_responders: decision.chosen_responders.clone(),
        message,
    }))
}

fn join(ids: &BTreeSet<ResponderId>) -> String {
    ids.iter()
        .map(ResponderId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
