//! Cycle observer that keeps the operator console's score view current.
//!
//! After each cycle the bridge refreshes the [`GameSnapshot`] served by
//! `GET /api/game`. When the run ends it writes the final snapshot and
//! announces the result to every connected `WebSocket` client.

use std::sync::Arc;

use hedgehog_console::state::{AppState, GameSnapshot};
use hedgehog_core::control::RunEndReason;
use hedgehog_core::pipeline::{CycleObserver, CycleReport, RunResult};
use tracing::debug;

/// Bridges the pipeline loop to the console state.
pub struct ConsoleBridge {
    state: Arc<AppState>,
}

impl ConsoleBridge {
    /// Create a bridge backed by the given console state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn store(&self, snapshot: GameSnapshot) {
        // Skip when a handler holds the read lock; the next cycle catches up.
        if let Ok(mut game) = self.state.game.try_write() {
            *game = snapshot;
        } else {
            debug!(cycles = snapshot.cycles, "game snapshot busy, update skipped");
        }
    }
}

impl CycleObserver for ConsoleBridge {
    fn on_cycle(&mut self, report: &CycleReport) {
        self.store(GameSnapshot {
            state: report.score.current,
            status: report.score.status,
            cycles: report.cycle,
        });
        debug!(
            cycle = report.cycle,
            event_id = %report.event.id(),
            delivered = report.delivered(),
            "console snapshot updated"
        );
    }

    fn on_finish(&mut self, result: &RunResult) {
        let snapshot = GameSnapshot {
            state: result.final_state,
            status: result.status,
            cycles: result.cycles,
        };
        let reason = result.end_reason;
        if let Ok(mut game) = self.state.game.try_write() {
            *game = snapshot;
            drop(game);
            announce(&self.state, snapshot, reason);
            return;
        }

        // The final snapshot has no later cycle to catch up, so wait for
        // readers to finish instead of skipping it.
        debug!("game snapshot busy, writing final result on a task");
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            *state.game.write().await = snapshot;
            announce(&state, snapshot, reason);
        });
    }
}

fn announce(state: &AppState, snapshot: GameSnapshot, reason: RunEndReason) {
    let receivers = state.board.announce_game_over(snapshot);
    debug!(receivers, reason = %reason, "run end announced");
}
