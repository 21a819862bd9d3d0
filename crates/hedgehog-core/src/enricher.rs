//! Zone lookup and urgency derivation.
//!
//! The [`ZoneTable`] is built once from config and validated: it must
//! contain an [`UNKNOWN_ZONE`] entry, and every nearby responder it names
//! must be on the roster. Lookups never fail; a location that is not in the
//! table resolves to the unknown zone.

use std::collections::{BTreeMap, BTreeSet};

use hedgehog_types::{EnrichedEvent, Event, ResponderId, UrgencyTier, ZoneInfo};

use crate::config::ZoneEntry;
use crate::roster::ResponderRoster;

/// Key of the fallback zone used for unrecognised locations.
pub const UNKNOWN_ZONE: &str = "Unknown";

/// Errors building a [`ZoneTable`].
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// The table has no fallback entry.
    #[error("zone table has no `{UNKNOWN_ZONE}` entry")]
    MissingUnknownZone,

    /// A zone lists a responder that is not on the roster.
    #[error("zone {zone} lists unknown responder {responder}")]
    UnknownResponder {
        /// The zone key.
        zone: String,
        /// The offending responder name.
        responder: String,
    },
}

/// Read-only mapping from location key to zone context.
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: BTreeMap<String, ZoneInfo>,
    fallback: ZoneInfo,
}

impl ZoneTable {
    /// Build a table from resolved zones.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError`] if the fallback zone is missing or a zone
    /// names a responder the roster does not know.
    pub fn new(
        mut zones: BTreeMap<String, ZoneInfo>,
        roster: &ResponderRoster,
    ) -> Result<Self, ZoneError> {
        for (key, zone) in &zones {
            if let Some(stranger) = zone
                .nearby_responders
                .iter()
                .find(|id| !roster.contains(id.as_str()))
            {
                return Err(ZoneError::UnknownResponder {
                    zone: key.clone(),
                    responder: stranger.to_string(),
                });
            }
        }
        let fallback = zones
            .remove(UNKNOWN_ZONE)
            .ok_or(ZoneError::MissingUnknownZone)?;
        Ok(Self { zones, fallback })
    }

    /// Build a table from the `zones` config section.
    ///
    /// # Errors
    ///
    /// See [`ZoneTable::new`].
    pub fn from_config(
        entries: &BTreeMap<String, ZoneEntry>,
        roster: &ResponderRoster,
    ) -> Result<Self, ZoneError> {
        let zones = entries
            .iter()
            .map(|(key, entry)| {
                let info = ZoneInfo {
                    name: entry.name.clone().unwrap_or_else(|| key.clone()),
                    description: entry.description.clone(),
                    nearby_responders: entry
                        .nearby_responders
                        .iter()
                        .map(|n| ResponderId::new(n.as_str()))
                        .collect::<BTreeSet<_>>(),
                };
                (key.clone(), info)
            })
            .collect();
        Self::new(zones, roster)
    }

    /// Zone for `location`, or the unknown zone if there is none.
    pub fn lookup(&self, location: &str) -> &ZoneInfo {
        self.zones.get(location).unwrap_or(&self.fallback)
    }

    /// Whether `location` has its own entry.
    pub fn knows(&self, location: &str) -> bool {
        self.zones.contains_key(location)
    }

    /// Known location keys (the unknown zone excluded).
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }
}

/// Urgency tier for a priority score.
///
/// Urgency is a pure function of priority so that the same event always
/// lands in the same tier.
pub const fn urgency_for(priority_score: u32) -> UrgencyTier {
    match priority_score {
        10.. => UrgencyTier::Maximum,
        7..=9 => UrgencyTier::High,
        5..=6 => UrgencyTier::Medium,
        _ => UrgencyTier::Low,
    }
}

/// Attaches zone context and urgency to classified events.
#[derive(Debug, Clone)]
pub struct Enricher {
    zones: ZoneTable,
}

impl Enricher {
    /// Create an enricher over a validated zone table.
    pub const fn new(zones: ZoneTable) -> Self {
        Self { zones }
    }

    /// The zone table in use.
    pub const fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    /// Enrich a classified event.
    pub fn enrich(&self, event: Event, priority_score: u32) -> EnrichedEvent {
        if !self.zones.knows(&event.location) {
            tracing::debug!(
                event_id = %event.id,
                location = %event.location,
                "location not in zone table, using unknown zone"
            );
        }
        let zone = self.zones.lookup(&event.location).clone();
        EnrichedEvent {
            event,
            priority_score,
            urgency_tier: urgency_for(priority_score),
            zone,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use hedgehog_types::{EventId, ThreatLevel};

    use super::*;
    use crate::config::AlertConfig;

    fn table() -> ZoneTable {
        let config = AlertConfig::default();
        let roster = config.roster().unwrap();
        config.zone_table(&roster).unwrap()
    }

    fn event(location: &str) -> Event {
        Event {
            id: EventId::new("EVT-TEST-0001"),
            timestamp: Utc::now(),
            location: location.to_owned(),
            threat_level: ThreatLevel::High,
            description: "Eggman robot".to_owned(),
            source_tag: "RADAR".to_owned(),
            raw_payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn urgency_tiers() {
        assert_eq!(urgency_for(10), UrgencyTier::Maximum);
        assert_eq!(urgency_for(7), UrgencyTier::High);
        assert_eq!(urgency_for(5), UrgencyTier::Medium);
        assert_eq!(urgency_for(2), UrgencyTier::Low);
        assert_eq!(urgency_for(0), UrgencyTier::Low);
    }

    #[test]
    fn known_location_gets_its_zone() {
        let enriched = Enricher::new(table()).enrich(event("Angel Island"), 7);
        assert_eq!(enriched.zone.name, "Angel Island");
        assert!(enriched.zone.nearby_responders.contains("Knuckles"));
        assert_eq!(enriched.urgency_tier, UrgencyTier::High);
    }

    #[test]
    fn unknown_location_falls_back() {
        let enriched = Enricher::new(table()).enrich(event("Little Planet"), 2);
        assert_eq!(enriched.zone.name, UNKNOWN_ZONE);
        assert!(enriched.zone.nearby_responders.is_empty());
        assert_eq!(enriched.event.location, "Little Planet");
    }

    #[test]
    fn unknown_zone_is_not_listed_as_a_location() {
        let table = table();
        assert!(!table.knows(UNKNOWN_ZONE));
        assert!(table.locations().all(|l| l != UNKNOWN_ZONE));
    }
}
