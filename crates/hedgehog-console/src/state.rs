//! Shared application state for the operator console.
//!
//! [`AppState`] holds the [`ConsoleBoard`] (pending alert plus broadcast
//! channel), the arbiter that receives submissions, and a snapshot of the
//! game score that the engine refreshes after every cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hedgehog_core::arbiter::{AlertPublisher, DecisionArbiter, PublishError};
use hedgehog_core::control::RunControl;
use hedgehog_types::{AlertNotice, Decision, GameState, GameStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel for console messages.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 64;

/// JSON frame pushed over the `WebSocket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleMessage {
    /// A new alert is waiting for a decision.
    Alert {
        /// The pending alert.
        notice: AlertNotice,
    },
    /// The pending alert was resolved (by the operator or automatically).
    Resolved {
        /// The decision in force.
        decision: Decision,
    },
    /// The game reached a terminal state; no further alerts will follow.
    GameOver {
        /// Final score.
        game: GameSnapshot,
        /// Human-readable summary.
        message: String,
    },
}

/// Score snapshot served by `GET /api/game`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Current counters.
    pub state: GameState,
    /// Current status.
    pub status: GameStatus,
    /// Cycles completed.
    pub cycles: u64,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self::new(GameState::default())
    }
}

impl GameSnapshot {
    /// Snapshot before any cycle ran.
    pub const fn new(state: GameState) -> Self {
        Self {
            state,
            status: state.status(),
            cycles: 0,
        }
    }
}

/// The console side of the operator channel.
///
/// Implements [`AlertPublisher`] for the arbiter. While offline every
/// publish fails, which makes the arbiter fall back immediately instead of
/// waiting out a deadline nobody can meet.
#[derive(Debug)]
pub struct ConsoleBoard {
    tx: broadcast::Sender<ConsoleMessage>,
    current: Mutex<Option<AlertNotice>>,
    online: AtomicBool,
}

impl Default for ConsoleBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleBoard {
    /// A board with no pending alert, offline until [`set_online`](Self::set_online).
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            current: Mutex::new(None),
            online: AtomicBool::new(false),
        }
    }

    /// Mark the console reachable (listener bound) or unreachable.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    /// Whether the console is reachable.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// The alert currently awaiting a decision.
    pub fn current_alert(&self) -> Option<AlertNotice> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to console messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleMessage> {
        self.tx.subscribe()
    }

    /// Publish a message to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, message: ConsoleMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    /// Announce the end of the game.
    pub fn announce_game_over(&self, game: GameSnapshot) -> usize {
        let message = match game.status {
            GameStatus::Victory => "Victory! The attacker has been defeated.".to_owned(),
            GameStatus::Defeat => "Defeat. Panic has overwhelmed the city.".to_owned(),
            GameStatus::Ongoing => format!("Run stopped after {} cycles.", game.cycles),
        };
        tracing::info!(status = ?game.status, "announcing game over");
        self.broadcast(ConsoleMessage::GameOver { game, message })
    }
}

impl AlertPublisher for ConsoleBoard {
    fn publish(&self, notice: &AlertNotice) -> Result<(), PublishError> {
        if !self.is_online() {
            return Err(PublishError::Unavailable(
                "operator console is not listening".to_owned(),
            ));
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(notice.clone());
        let receivers = self.broadcast(ConsoleMessage::Alert {
            notice: notice.clone(),
        });
        tracing::debug!(event_id = %notice.event_id, receivers, "alert shown on console");
        Ok(())
    }

    fn resolved(&self, decision: &Decision) {
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            if current
                .as_ref()
                .is_some_and(|n| n.event_id == decision.event_id)
            {
                *current = None;
            }
        }
        self.broadcast(ConsoleMessage::Resolved {
            decision: decision.clone(),
        });
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Pending alert and `WebSocket` fan-out.
    pub board: Arc<ConsoleBoard>,
    /// Receives operator submissions.
    pub arbiter: Arc<DecisionArbiter>,
    /// Latest score (updated each cycle by the engine).
    pub game: Arc<RwLock<GameSnapshot>>,
    /// Shared run control (present when a pipeline is running).
    pub control: Option<Arc<RunControl>>,
}

impl AppState {
    /// Create console state around an arbiter and the board it publishes to.
    pub fn new(board: Arc<ConsoleBoard>, arbiter: Arc<DecisionArbiter>) -> Self {
        Self {
            board,
            arbiter,
            game: Arc::new(RwLock::new(GameSnapshot::default())),
            control: None,
        }
    }

    /// Attach the run control so operator endpoints can act on the run.
    #[must_use]
    pub fn with_control(mut self, control: Arc<RunControl>) -> Self {
        self.control = Some(control);
        self
    }

    /// Seed the score snapshot.
    #[must_use]
    pub fn with_game(self, game: GameSnapshot) -> Self {
        Self {
            game: Arc::new(RwLock::new(game)),
            ..self
        }
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("board", &self.board)
            .field("arbiter", &self.arbiter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use hedgehog_types::{DecisionOrigin, EventId, ThreatLevel, UrgencyTier};

    use super::*;

    fn notice(id: &str) -> AlertNotice {
        AlertNotice {
            event_id: EventId::new(id),
            description: "Badniks in the plaza".to_owned(),
            location: "Station Square".to_owned(),
            zone_name: "Station Square".to_owned(),
            threat_level: ThreatLevel::Medium,
            urgency_tier: UrgencyTier::Medium,
            priority_score: 5,
            nearby_responders: BTreeSet::new(),
            deadline: Utc::now(),
            deadline_ms: 40_000,
        }
    }

    #[test]
    fn offline_board_refuses_alerts() {
        let board = ConsoleBoard::new();
        assert!(board.publish(&notice("EVT-1")).is_err());
        assert!(board.current_alert().is_none());
    }

    #[tokio::test]
    async fn publish_and_resolve_update_the_board() {
        let board = ConsoleBoard::new();
        board.set_online(true);
        let mut rx = board.subscribe();

        board.publish(&notice("EVT-1")).unwrap();
        assert_eq!(board.current_alert().unwrap().event_id.as_str(), "EVT-1");
        assert!(matches!(rx.recv().await.unwrap(), ConsoleMessage::Alert { .. }));

        let decision = Decision::new(EventId::new("EVT-1"), DecisionOrigin::Timeout, BTreeSet::new());
        board.resolved(&decision);
        assert!(board.current_alert().is_none());
        assert_eq!(rx.recv().await.unwrap(), ConsoleMessage::Resolved { decision });
    }

    #[test]
    fn stale_resolution_keeps_newer_alert() {
        let board = ConsoleBoard::new();
        board.set_online(true);
        board.publish(&notice("EVT-2")).unwrap();
        board.resolved(&Decision::new(
            EventId::new("EVT-1"),
            DecisionOrigin::Human,
            BTreeSet::new(),
        ));
        assert_eq!(board.current_alert().unwrap().event_id.as_str(), "EVT-2");
    }

    #[test]
    fn message_frames_are_tagged() {
        let json = serde_json::to_value(ConsoleMessage::GameOver {
            game: GameSnapshot::default(),
            message: "done".to_owned(),
        })
        .unwrap();
        assert_eq!(json["type"], "game_over");
        assert_eq!(json["game"]["status"], "ongoing");
    }
}
