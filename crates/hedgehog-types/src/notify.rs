//! Dispatch payloads and per-target delivery outcomes.

use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::event::EnrichedEvent;
use crate::game::GameState;
use crate::ids::Target;

/// Body delivered to every notification target for a resolved event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// The enriched event.
    pub event: EnrichedEvent,
    /// The resolved decision.
    pub decision: Decision,
    /// Game state after this event's outcome was applied.
    pub game_state: GameState,
}

/// Result of one delivery attempt. Never persisted beyond a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    /// The target that was attempted.
    pub target: Target,
    /// Whether the target acknowledged the alert.
    pub delivered: bool,
    /// Why delivery failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    /// A successful delivery.
    pub const fn delivered(target: Target) -> Self {
        Self {
            target,
            delivered: true,
            error: None,
        }
    }

    /// A failed delivery with its reason.
    pub fn failed(target: Target, error: impl Into<String>) -> Self {
        Self {
            target,
            delivered: false,
            error: Some(error.into()),
        }
    }
}
