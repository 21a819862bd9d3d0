//! Fixtures shared by the unit tests in this crate.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::Utc;
use hedgehog_types::{
    AlertNotice, Decision, EnrichedEvent, Event, EventId, ResponderId, ThreatLevel, ZoneInfo,
};

use crate::arbiter::{AlertPublisher, PublishError};
use crate::classifier::priority_for;
use crate::config::RespondersConfig;
use crate::enricher::urgency_for;
use crate::roster::ResponderRoster;

/// Sonic (primary), Tails, Knuckles.
pub fn roster() -> ResponderRoster {
    ResponderRoster::from_config(&RespondersConfig::default()).unwrap()
}

pub fn selection(names: &[&str]) -> BTreeSet<ResponderId> {
    names.iter().map(|n| ResponderId::new(*n)).collect()
}

pub fn enriched(id: &str, level: ThreatLevel, nearby: &[&str]) -> EnrichedEvent {
    let priority = priority_for(level);
    EnrichedEvent {
        event: Event {
            id: EventId::new(id),
            timestamp: Utc::now(),
            location: "Test Zone".to_owned(),
            threat_level: level,
            description: "Badnik swarm".to_owned(),
            source_tag: "TEST".to_owned(),
            raw_payload: serde_json::Value::Null,
        },
        priority_score: priority,
        urgency_tier: urgency_for(priority),
        zone: ZoneInfo {
            name: "Test Zone".to_owned(),
            description: String::new(),
            nearby_responders: selection(nearby),
        },
    }
}

/// Publisher that records what it was shown.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    fail: bool,
    notices: Mutex<Vec<AlertNotice>>,
    resolutions: Mutex<Vec<Decision>>,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn notices(&self) -> Vec<AlertNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn resolutions(&self) -> Vec<Decision> {
        self.resolutions.lock().unwrap().clone()
    }
}

impl AlertPublisher for RecordingPublisher {
    fn publish(&self, notice: &AlertNotice) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Unavailable("console offline".to_owned()));
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }

    fn resolved(&self, decision: &Decision) {
        self.resolutions.lock().unwrap().push(decision.clone());
    }
}
