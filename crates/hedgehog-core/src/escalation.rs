//! Responder choice when nobody decided in time.
//!
//! The policy is deterministic: the same event and roster always produce
//! the same selection, so timeout and fallback decisions can be reasoned
//! about after the fact.

use std::collections::BTreeSet;
use std::sync::Arc;

use hedgehog_types::{EnrichedEvent, ResponderId, ThreatLevel};

use crate::roster::ResponderRoster;

/// Threat-level driven responder selection.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    roster: Arc<ResponderRoster>,
}

impl EscalationPolicy {
    /// Create a policy over the given roster.
    pub const fn new(roster: Arc<ResponderRoster>) -> Self {
        Self { roster }
    }

    /// Responders to dispatch for `event`.
    ///
    /// - critical: every known responder
    /// - high: the primary plus every nearby responder
    /// - medium: the first nearby responder in roster order, or the primary
    ///   if nobody is nearby
    /// - low: nobody (log only)
    pub fn choose(&self, event: &EnrichedEvent) -> BTreeSet<ResponderId> {
        let nearby = &event.zone.nearby_responders;
        match event.threat_level() {
            ThreatLevel::Critical => self.roster.all(),
            ThreatLevel::High => {
                let mut chosen: BTreeSet<ResponderId> = nearby
                    .iter()
                    .filter(|id| self.roster.contains(id.as_str()))
                    .cloned()
                    .collect();
                chosen.insert(self.roster.primary().clone());
                chosen
            }
            ThreatLevel::Medium => {
                let pick = self
                    .roster
                    .iter()
                    .find(|id| nearby.contains(*id))
                    .unwrap_or_else(|| self.roster.primary());
                BTreeSet::from([pick.clone()])
            }
            ThreatLevel::Low => BTreeSet::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{enriched, roster};

    fn names(set: &BTreeSet<ResponderId>) -> Vec<&str> {
        set.iter().map(ResponderId::as_str).collect()
    }

    #[test]
    fn critical_sends_everyone() {
        let policy = EscalationPolicy::new(Arc::new(roster()));
        let chosen = policy.choose(&enriched("EVT-1", ThreatLevel::Critical, &[]));
        assert_eq!(names(&chosen), vec!["Knuckles", "Sonic", "Tails"]);
    }

    #[test]
    fn high_sends_primary_and_nearby() {
        let policy = EscalationPolicy::new(Arc::new(roster()));
        let chosen = policy.choose(&enriched("EVT-1", ThreatLevel::High, &["Knuckles"]));
        assert_eq!(names(&chosen), vec!["Knuckles", "Sonic"]);

        let alone = policy.choose(&enriched("EVT-2", ThreatLevel::High, &[]));
        assert_eq!(names(&alone), vec!["Sonic"]);
    }

    #[test]
    fn medium_sends_first_nearby_in_roster_order() {
        let policy = EscalationPolicy::new(Arc::new(roster()));
        // Roster order is Sonic, Tails, Knuckles.
        let chosen = policy.choose(&enriched("EVT-1", ThreatLevel::Medium, &["Knuckles", "Tails"]));
        assert_eq!(names(&chosen), vec!["Tails"]);
    }

    #[test]
    fn medium_without_nearby_sends_primary() {
        let policy = EscalationPolicy::new(Arc::new(roster()));
        let chosen = policy.choose(&enriched("EVT-1", ThreatLevel::Medium, &[]));
        assert_eq!(names(&chosen), vec!["Sonic"]);
    }

    #[test]
    fn low_sends_nobody() {
        let policy = EscalationPolicy::new(Arc::new(roster()));
        assert!(policy.choose(&enriched("EVT-1", ThreatLevel::Low, &["Tails"])).is_empty());
    }
}
