//! Event records as they move through the pipeline.
//!
//! A [`RawEvent`] comes from an event source with the threat described in
//! free text. The pipeline stamps it with an id and timestamp and the
//! classifier's [`ThreatLevel`], producing an immutable [`Event`]. The
//! enricher then attaches zone context and urgency, producing an
//! [`EnrichedEvent`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ThreatLevel, UrgencyTier};
use crate::ids::{EventId, ResponderId};

/// An unclassified report as supplied by an event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Location key as reported (looked up in the zone table).
    pub location: String,
    /// Threat level as free text (e.g. `"critical"`, `"HIGH"`).
    pub threat_text: String,
    /// Human-readable description of the activity.
    pub description: String,
    /// Tag identifying the reporting system (e.g. `RADAR`).
    pub source_tag: String,
    /// Source-specific extra readings, carried through untouched.
    #[serde(default)]
    pub raw_payload: serde_json::Value,
}

/// A classified, timestamped threat event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id.
    pub id: EventId,
    /// When the pipeline accepted the event.
    pub timestamp: DateTime<Utc>,
    /// Location key as reported.
    pub location: String,
    /// Severity assigned by the classifier.
    pub threat_level: ThreatLevel,
    /// Human-readable description.
    pub description: String,
    /// Tag identifying the reporting system.
    pub source_tag: String,
    /// Source-specific extra readings.
    pub raw_payload: serde_json::Value,
}

/// Contextual data about the zone an event happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Display name of the zone.
    pub name: String,
    /// Short description of the zone.
    pub description: String,
    /// Responders known to be close to this zone.
    pub nearby_responders: BTreeSet<ResponderId>,
}

/// An event with priority, urgency, and zone context attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    /// The underlying classified event.
    pub event: Event,
    /// Numeric priority derived from the threat level.
    pub priority_score: u32,
    /// Derived urgency tier.
    pub urgency_tier: UrgencyTier,
    /// Zone context for the event's location.
    pub zone: ZoneInfo,
}

impl EnrichedEvent {
    /// Shorthand for the event id.
    pub const fn id(&self) -> &EventId {
        &self.event.id
    }

    /// Shorthand for the classified threat level.
    pub const fn threat_level(&self) -> ThreatLevel {
        self.event.threat_level
    }
}
