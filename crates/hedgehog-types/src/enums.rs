//! Enumeration types for the alert pipeline.
//!
//! Threat level and urgency tier were free-form strings in earlier
//! prototypes. They are closed enums here so that every lookup table keyed
//! on them is checked for exhaustiveness by the compiler.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Threat level
// ---------------------------------------------------------------------------

/// Severity of a reported threat, as assigned by the classifier.
///
/// Ordered from least to most severe so that comparisons such as
/// `level >= ThreatLevel::High` read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    /// Minor activity; no responder is sent automatically.
    Low,
    /// Noticeable activity; one responder is sent automatically.
    Medium,
    /// Serious activity; the primary responder plus nearby help.
    High,
    /// Full-scale attack; every responder is sent.
    Critical,
}

impl ThreatLevel {
    /// All threat levels in ascending severity.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Lowercase name used in logs and wire formats.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl core::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Urgency tier
// ---------------------------------------------------------------------------

/// Derived urgency of an enriched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    /// Can wait.
    Low,
    /// Should be handled this cycle.
    Medium,
    /// Needs prompt attention.
    High,
    /// Must never go unanswered; the router forces the primary responder.
    Maximum,
}

impl core::fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Maximum => "maximum",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Decision origin
// ---------------------------------------------------------------------------

/// Which signal produced a resolved decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOrigin {
    /// The operator submitted a selection before the deadline.
    Human,
    /// The deadline fired first; the escalation policy chose.
    Timeout,
    /// The operator channel was unreachable; the escalation policy chose.
    ErrorFallback,
}

impl DecisionOrigin {
    /// Whether the decision was made by the escalation policy rather than a person.
    pub const fn is_automatic(self) -> bool {
        matches!(self, Self::Timeout | Self::ErrorFallback)
    }
}

impl core::fmt::Display for DecisionOrigin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Human => "human",
            Self::Timeout => "timeout",
            Self::ErrorFallback => "error_fallback",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Response quality
// ---------------------------------------------------------------------------

/// How well a human selection matched the responders near the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseQuality {
    /// Every chosen responder is nearby (and at least one was chosen).
    Optimal,
    /// At least one chosen responder is not nearby.
    Suboptimal,
    /// Nobody was chosen; the alert is only logged.
    #[serde(rename = "none")]
    NoResponders,
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// Whether the game has reached a terminal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Neither counter has hit its terminal bound.
    Ongoing,
    /// Attacker health reached zero.
    Victory,
    /// Panic reached the maximum.
    Defeat,
}

impl GameStatus {
    /// Whether the status is terminal.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_levels_are_ordered() {
        assert!(ThreatLevel::Critical > ThreatLevel::High);
        assert!(ThreatLevel::Medium > ThreatLevel::Low);
        assert_eq!(ThreatLevel::ALL.len(), 4);
    }

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_string(&DecisionOrigin::ErrorFallback).ok().as_deref(),
            Some("\"error_fallback\"")
        );
        assert_eq!(
            serde_json::to_string(&ResponseQuality::NoResponders).ok().as_deref(),
            Some("\"none\"")
        );
        assert_eq!(
            serde_json::to_string(&UrgencyTier::Maximum).ok().as_deref(),
            Some("\"maximum\"")
        );
    }

    #[test]
    fn automatic_origins() {
        assert!(DecisionOrigin::Timeout.is_automatic());
        assert!(DecisionOrigin::ErrorFallback.is_automatic());
        assert!(!DecisionOrigin::Human.is_automatic());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!GameStatus::Ongoing.is_terminal());
        assert!(GameStatus::Victory.is_terminal());
        assert!(GameStatus::Defeat.is_terminal());
    }
}
