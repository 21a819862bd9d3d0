//! The bounded score counters that summarise the run.
//!
//! Both counters live in `[0, 100]`. Attacker health going to zero is a
//! victory for the defenders; panic reaching the maximum is a defeat.

use serde::{Deserialize, Serialize};

use crate::enums::GameStatus;

/// Upper bound for both counters.
pub const COUNTER_MAX: u8 = 100;

/// Snapshot of the two game counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    /// Remaining attacker health, `0..=100`.
    pub attacker_health: u8,
    /// Civilian panic level, `0..=100`.
    pub panic_level: u8,
}

impl GameState {
    /// Create a state, clamping both counters to [`COUNTER_MAX`].
    pub fn new(attacker_health: u8, panic_level: u8) -> Self {
        Self {
            attacker_health: attacker_health.min(COUNTER_MAX),
            panic_level: panic_level.min(COUNTER_MAX),
        }
    }

    /// Apply a damage value and a panic delta, clamping both results.
    ///
    /// `damage` is subtracted from attacker health (negative damage heals
    /// the attacker). `panic_delta` is added to the panic level.
    #[must_use]
    pub fn apply(self, damage: i32, panic_delta: i32) -> Self {
        Self {
            attacker_health: clamp_counter(i32::from(self.attacker_health).saturating_sub(damage)),
            panic_level: clamp_counter(i32::from(self.panic_level).saturating_add(panic_delta)),
        }
    }

    /// Terminal status of this state. Victory takes priority over defeat.
    pub const fn status(self) -> GameStatus {
        if self.attacker_health == 0 {
            GameStatus::Victory
        } else if self.panic_level >= COUNTER_MAX {
            GameStatus::Defeat
        } else {
            GameStatus::Ongoing
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            attacker_health: COUNTER_MAX,
            panic_level: 0,
        }
    }
}

fn clamp_counter(value: i32) -> u8 {
    u8::try_from(value.clamp(0, i32::from(COUNTER_MAX))).unwrap_or(COUNTER_MAX)
}
