//! Notification target selection.

use hedgehog_types::{Decision, EnrichedEvent, ResponderId, RoutingDecision, Target, UrgencyTier};

/// Turns a resolved decision into the set of targets to notify.
///
/// The audit log is always a target. A maximum-urgency event that would
/// otherwise reach no responder is sent to the primary responder.
#[derive(Debug, Clone)]
pub struct ResponseRouter {
    primary: ResponderId,
}

impl ResponseRouter {
    /// Create a router with the given primary responder.
    pub const fn new(primary: ResponderId) -> Self {
        Self { primary }
    }

    /// Targets for `decision` on `event`.
    pub fn route(&self, event: &EnrichedEvent, decision: &Decision) -> RoutingDecision {
        let mut routing = RoutingDecision::default();
        routing.targets.insert(Target::AuditLog);
        routing.targets.extend(
            decision
                .chosen_responders
                .iter()
                .cloned()
                .map(Target::Responder),
        );
        if event.urgency_tier == UrgencyTier::Maximum && decision.chosen_responders.is_empty() {
            tracing::info!(
                event_id = %event.id(),
                primary = %self.primary,
                "maximum urgency with no responders chosen, forcing primary"
            );
            routing.targets.insert(Target::Responder(self.primary.clone()));
        }
        routing
    }
}

#[cfg(test)]
mod tests {
    use hedgehog_types::{DecisionOrigin, ThreatLevel};

    use super::*;
    use crate::test_support::{enriched, selection};

    fn router() -> ResponseRouter {
        ResponseRouter::new(ResponderId::new("Sonic"))
    }

    fn decision(event: &EnrichedEvent, names: &[&str]) -> Decision {
        Decision::new(event.id().clone(), DecisionOrigin::Human, selection(names))
    }

    #[test]
    fn audit_log_always_included() {
        let event = enriched("EVT-1", ThreatLevel::Low, &[]);
        let routing = router().route(&event, &decision(&event, &[]));
        assert_eq!(routing.targets.len(), 1);
        assert!(routing.targets.contains(&Target::AuditLog));
    }

    #[test]
    fn chosen_responders_are_targets() {
        let event = enriched("EVT-2", ThreatLevel::High, &[]);
        let routing = router().route(&event, &decision(&event, &["Tails", "Knuckles"]));
        let responders: Vec<&str> = routing.responders().map(ResponderId::as_str).collect();
        assert_eq!(responders, vec!["Knuckles", "Tails"]);
        assert!(routing.targets.contains(&Target::AuditLog));
    }

    #[test]
    fn maximum_urgency_never_goes_unanswered() {
        let event = enriched("EVT-3", ThreatLevel::Critical, &[]);
        let routing = router().route(&event, &decision(&event, &[]));
        let responders: Vec<&str> = routing.responders().map(ResponderId::as_str).collect();
        assert_eq!(responders, vec!["Sonic"]);
    }

    #[test]
    fn maximum_urgency_keeps_explicit_choice() {
        let event = enriched("EVT-4", ThreatLevel::Critical, &[]);
        let routing = router().route(&event, &decision(&event, &["Tails"]));
        let responders: Vec<&str> = routing.responders().map(ResponderId::as_str).collect();
        assert_eq!(responders, vec!["Tails"]);
    }
}
