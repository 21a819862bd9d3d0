//! Decisions, routing results, and the notice published to the operator.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{DecisionOrigin, ThreatLevel, UrgencyTier};
use crate::event::EnrichedEvent;
use crate::ids::{EventId, ResponderId, Target};

/// The single resolved choice of responders for one event.
///
/// At most one `Decision` is ever resolved per [`EventId`]; the arbiter
/// enforces this with a single-assignment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The event this decision answers.
    pub event_id: EventId,
    /// Which signal produced the decision.
    pub origin: DecisionOrigin,
    /// Responders to dispatch. Empty means "log only".
    pub chosen_responders: BTreeSet<ResponderId>,
    /// When the decision was resolved.
    pub decided_at: DateTime<Utc>,
    /// Failure annotation for error-fallback decisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Decision {
    /// Create a decision stamped with the current time.
    pub fn new(
        event_id: EventId,
        origin: DecisionOrigin,
        chosen_responders: BTreeSet<ResponderId>,
    ) -> Self {
        Self {
            event_id,
            origin,
            chosen_responders,
            decided_at: Utc::now(),
            reason: None,
        }
    }

    /// Attach a failure reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// The set of notification targets for a resolved decision.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Targets to notify. Always contains [`Target::AuditLog`].
    pub targets: BTreeSet<Target>,
}

impl RoutingDecision {
    /// Iterate over the responder targets only (audit log excluded).
    pub fn responders(&self) -> impl Iterator<Item = &ResponderId> {
        self.targets.iter().filter_map(Target::responder)
    }
}

/// What the operator console is shown for a pending event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertNotice {
    /// Event awaiting a decision.
    pub event_id: EventId,
    /// Human-readable description.
    pub description: String,
    /// Reported location key.
    pub location: String,
    /// Resolved zone name.
    pub zone_name: String,
    /// Classified threat level.
    pub threat_level: ThreatLevel,
    /// Derived urgency tier.
    pub urgency_tier: UrgencyTier,
    /// Numeric priority.
    pub priority_score: u32,
    /// Responders near the zone.
    pub nearby_responders: BTreeSet<ResponderId>,
    /// Wall-clock deadline for the operator's decision.
    pub deadline: DateTime<Utc>,
    /// Milliseconds the operator had when the notice was published.
    pub deadline_ms: u64,
}

impl AlertNotice {
    /// Build a notice for an enriched event with the given deadline.
    pub fn for_event(event: &EnrichedEvent, deadline: DateTime<Utc>, deadline_ms: u64) -> Self {
        Self {
            event_id: event.id().clone(),
            description: event.event.description.clone(),
            location: event.event.location.clone(),
            zone_name: event.zone.name.clone(),
            threat_level: event.threat_level(),
            urgency_tier: event.urgency_tier,
            priority_score: event.priority_score,
            nearby_responders: event.zone.nearby_responders.clone(),
            deadline,
            deadline_ms,
        }
    }

    /// Whole seconds left before the deadline, measured from `now`.
    pub fn seconds_left(&self, now: DateTime<Utc>) -> u64 {
        let left = self.deadline.signed_duration_since(now).num_seconds();
        u64::try_from(left.max(0)).unwrap_or(0)
    }
}
