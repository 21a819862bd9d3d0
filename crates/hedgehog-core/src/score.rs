//! The attacker-health / panic score.
//!
//! Every resolved decision changes two bounded counters. Human decisions
//! that send only nearby responders damage the attacker; automatic
//! decisions never do and raise panic instead. The game ends when attacker
//! health reaches zero (victory) or panic reaches the maximum (defeat).

use hedgehog_types::{
    Decision, DecisionOrigin, EnrichedEvent, GameState, GameStatus, ResponseQuality, ThreatLevel,
};

/// Counter changes for one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDelta {
    /// Damage dealt to the attacker (negative heals it).
    pub damage: i32,
    /// Change in panic level.
    pub panic: i32,
}

/// Classify how well a decision matched the event's nearby responders.
pub fn response_quality(event: &EnrichedEvent, decision: &Decision) -> ResponseQuality {
    let chosen = &decision.chosen_responders;
    if chosen.is_empty() {
        ResponseQuality::NoResponders
    } else if chosen.is_subset(&event.zone.nearby_responders) {
        ResponseQuality::Optimal
    } else {
        ResponseQuality::Suboptimal
    }
}

/// Counter changes for a decision of the given origin and quality.
pub const fn score_delta(
    origin: DecisionOrigin,
    quality: ResponseQuality,
    level: ThreatLevel,
) -> ScoreDelta {
    if origin.is_automatic() {
        let panic = match level {
            ThreatLevel::Critical => 15,
            ThreatLevel::High => 8,
            ThreatLevel::Medium => 4,
            ThreatLevel::Low => 2,
        };
        return ScoreDelta { damage: 0, panic };
    }
    match quality {
        ResponseQuality::NoResponders => ScoreDelta {
            damage: -2,
            panic: 2,
        },
        ResponseQuality::Optimal => ScoreDelta {
            damage: match level {
                ThreatLevel::Critical => 20,
                ThreatLevel::High => 12,
                ThreatLevel::Medium => 8,
                ThreatLevel::Low => 5,
            },
            panic: -2,
        },
        ResponseQuality::Suboptimal => ScoreDelta {
            damage: match level {
                ThreatLevel::Critical => 5,
                ThreatLevel::High => 3,
                ThreatLevel::Medium => 1,
                ThreatLevel::Low => 0,
            },
            panic: 3,
        },
    }
}

/// The score after one decision was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    /// Counters before.
    pub previous: GameState,
    /// Counters after.
    pub current: GameState,
    /// The change that was applied (before clamping).
    pub delta: ScoreDelta,
    /// Quality of the decision.
    pub quality: ResponseQuality,
    /// Status after the update.
    pub status: GameStatus,
}

/// The score no longer changes.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// A terminal status was already reached.
    #[error("game is over ({0:?}), score is frozen")]
    GameOver(GameStatus),
}

/// Owns the game state and applies decision outcomes to it.
#[derive(Debug, Clone)]
pub struct ScoreTracker {
    state: GameState,
}

impl ScoreTracker {
    /// Start tracking from `initial`.
    pub const fn new(initial: GameState) -> Self {
        Self { state: initial }
    }

    /// Current counters.
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Current status.
    pub const fn status(&self) -> GameStatus {
        self.state.status()
    }

    /// Apply one resolved decision.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::GameOver`] if the game already ended; the
    /// state is left unchanged.
    pub fn apply_outcome(
        &mut self,
        event: &EnrichedEvent,
        decision: &Decision,
    ) -> Result<ScoreUpdate, ScoreError> {
        let status = self.status();
        if status.is_terminal() {
            return Err(ScoreError::GameOver(status));
        }
        let quality = response_quality(event, decision);
        let delta = score_delta(decision.origin, quality, event.threat_level());
        let previous = self.state;
        self.state = previous.apply(delta.damage, delta.panic);
        let status = self.status();

        tracing::info!(
            event_id = %event.id(),
            origin = %decision.origin,
            quality = ?quality,
            attacker_health = self.state.attacker_health,
            panic_level = self.state.panic_level,
            "score updated"
        );
        match status {
            GameStatus::Victory => tracing::info!("attacker defeated, victory"),
            GameStatus::Defeat => tracing::warn!("panic reached maximum, defeat"),
            GameStatus::Ongoing => {}
        }

        Ok(ScoreUpdate {
            previous,
            current: self.state,
            delta,
            quality,
            status,
        })
    }
}
