//! Shared type definitions for the Hedgehog alert processor.
//!
//! This crate is the single source of truth for the data that flows through
//! the alert pipeline: raw events from a source, enriched events, resolved
//! decisions, game state, and the payloads exchanged with the operator
//! console and responder endpoints.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed identifier newtypes and notification targets
//! - [`enums`] -- Closed enumerations (threat level, urgency, origin, status)
//! - [`event`] -- Raw, canonical, and enriched event records
//! - [`decision`] -- Resolved decisions, routing, and operator notices
//! - [`game`] -- The bounded attacker-health / panic counters
//! - [`notify`] -- Dispatch payloads and per-target outcomes

pub mod decision;
pub mod enums;
pub mod event;
pub mod game;
pub mod ids;
pub mod notify;

// Re-export all public types at crate root for convenience.
pub use decision::{AlertNotice, Decision, RoutingDecision};
pub use enums::{DecisionOrigin, GameStatus, ResponseQuality, ThreatLevel, UrgencyTier};
pub use event::{EnrichedEvent, Event, RawEvent, ZoneInfo};
pub use game::GameState;
pub use ids::{EventId, ResponderId, Target};
pub use notify::{AlertPayload, NotificationOutcome};
