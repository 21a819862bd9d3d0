//! Simulated sensor feed.
//!
//! [`SimulatedSource`] stands in for the real monitoring systems. Each
//! call picks a sensor, a location that sensor watches, a threat level,
//! and an activity, and returns the report as a [`RawEvent`] with the
//! sensor reading in `raw_payload`.
//!
//! Threat levels are emitted as free text in a few spellings so the
//! classifier's normalisation is exercised on every run.

use hedgehog_core::pipeline::EventSource;
use hedgehog_types::RawEvent;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// One reporting system.
#[derive(Debug, Clone)]
struct Sensor {
    name: &'static str,
    tag: &'static str,
    reading: &'static str,
    /// Fixed watch list. Empty means the sensor sweeps every known location.
    locations: &'static [&'static str],
}

const SENSORS: &[Sensor] = &[
    Sensor {
        name: "Sensor Tails",
        tag: "SENSOR_TAILS",
        reading: "chaos_energy",
        locations: &["Tails' Workshop", "Mystic Ruins"],
    },
    Sensor {
        name: "Radar G.U.N.",
        tag: "RADAR_GUN",
        reading: "contact_count",
        locations: &["Station Square", "G.U.N. HQ"],
    },
    Sensor {
        name: "Orbital Satellite",
        tag: "SATELLITE",
        reading: "thermal_signature",
        locations: &[],
    },
];

const THREAT_TEXT: &[&str] = &[
    "low", "minor", "medium", "Moderate", "high", "HIGH", "critical", "severe",
];

const ACTIVITIES: &[&str] = &[
    "Badnik swarm",
    "Chaos energy spike",
    "Egg Pawn patrol",
    "Unidentified aircraft",
    "Seismic disturbance",
];

/// Location reported when a sweep picks up something off the map.
const UNCHARTED: &str = "Sky Sanctuary";

/// Chance that a sweeping sensor reports an uncharted location.
const UNCHARTED_CHANCE: f64 = 0.1;

/// Endless random event feed.
#[derive(Debug)]
pub struct SimulatedSource {
    rng: StdRng,
    known_locations: Vec<String>,
    emitted: u64,
}

impl SimulatedSource {
    /// A source seeded from the thread RNG.
    ///
    /// Returns `None` if `known_locations` is empty; sweeping sensors
    /// need somewhere to report on.
    pub fn new(known_locations: Vec<String>) -> Option<Self> {
        Self::with_rng(known_locations, StdRng::from_rng(&mut rand::rng()))
    }

    /// A source driven by the given RNG.
    pub fn with_rng(known_locations: Vec<String>, rng: StdRng) -> Option<Self> {
        if known_locations.is_empty() {
            return None;
        }
        Some(Self {
            rng,
            known_locations,
            emitted: 0,
        })
    }

    /// Events produced so far.
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    fn pick_location(&mut self, sensor: &Sensor) -> String {
        if let Some(location) = sensor.locations.choose(&mut self.rng) {
            return (*location).to_owned();
        }
        if self.rng.random_bool(UNCHARTED_CHANCE) {
            return UNCHARTED.to_owned();
        }
        self.known_locations
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| UNCHARTED.to_owned())
    }
}

impl EventSource for SimulatedSource {
    fn next_event(&mut self) -> Option<RawEvent> {
        let sensor = SENSORS.choose(&mut self.rng)?;
        let location = self.pick_location(sensor);
        let threat_text = (*THREAT_TEXT.choose(&mut self.rng)?).to_owned();
        let activity = ACTIVITIES.choose(&mut self.rng)?;
        let value = self.rng.random_range(0..1000_u32);
        self.emitted = self.emitted.saturating_add(1);

        Some(RawEvent {
            description: format!("{activity} detected at {location}"),
            location,
            threat_text,
            source_tag: sensor.tag.to_owned(),
            raw_payload: serde_json::json!({
                "sensor": sensor.name,
                "reading_type": sensor.reading,
                "value": value,
            }),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use hedgehog_core::classifier::parse_threat_level;

    use super::*;

    fn seeded(seed: u64) -> SimulatedSource {
        SimulatedSource::with_rng(
            vec!["Green Hill Zone".to_owned(), "Angel Island".to_owned()],
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn empty_location_list_is_rejected() {
        assert!(SimulatedSource::new(Vec::new()).is_none());
    }

    #[test]
    fn source_never_runs_dry() {
        let mut source = seeded(7);
        for _ in 0..200 {
            assert!(source.next_event().is_some());
        }
        assert_eq!(source.emitted(), 200);
    }

    #[test]
    fn every_threat_text_is_recognised() {
        let mut source = seeded(11);
        for _ in 0..200 {
            let raw = source.next_event().unwrap();
            assert!(
                parse_threat_level(&raw.threat_text).is_some(),
                "unrecognised level {:?}",
                raw.threat_text
            );
        }
    }

    #[test]
    fn sensors_report_their_own_locations() {
        let mut source = seeded(3);
        for _ in 0..300 {
            let raw = source.next_event().unwrap();
            let sensor = SENSORS.iter().find(|s| s.tag == raw.source_tag).unwrap();
            if sensor.locations.is_empty() {
                assert!(
                    raw.location == UNCHARTED
                        || raw.location == "Green Hill Zone"
                        || raw.location == "Angel Island",
                    "sweep reported {}",
                    raw.location
                );
            } else {
                assert!(sensor.locations.contains(&raw.location.as_str()));
            }
            assert_eq!(raw.raw_payload["sensor"], sensor.name);
            assert!(raw.description.ends_with(&raw.location));
        }
    }

    #[test]
    fn same_seed_same_feed() {
        let mut a = seeded(42);
        let mut b = seeded(42);
        for _ in 0..20 {
            assert_eq!(a.next_event(), b.next_event());
        }
    }
}
