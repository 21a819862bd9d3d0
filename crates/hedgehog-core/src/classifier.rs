//! Threat classification.
//!
//! A [`Classifier`] turns the free-text threat description of a
//! [`RawEvent`] into a [`ThreatLevel`] and a numeric priority. The default
//! [`LevelClassifier`] reads the level name directly; swapping in a smarter
//! implementation only requires implementing the trait.

use hedgehog_types::{RawEvent, ThreatLevel};

/// The classifier's verdict for one raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Severity of the threat.
    pub threat_level: ThreatLevel,
    /// Numeric priority; higher is more urgent.
    pub priority_score: u32,
}

impl Classification {
    /// Classification with the standard priority for `level`.
    pub const fn for_level(level: ThreatLevel) -> Self {
        Self {
            threat_level: level,
            priority_score: priority_for(level),
        }
    }
}

/// Anything that can assign a threat level to a raw event.
pub trait Classifier: Send + Sync {
    /// Classify a raw event. Never fails: unrecognised input maps to a
    /// valid low-severity classification.
    fn classify(&self, raw: &RawEvent) -> Classification;
}

/// Standard priority for each threat level.
pub const fn priority_for(level: ThreatLevel) -> u32 {
    match level {
        ThreatLevel::Critical => 10,
        ThreatLevel::High => 7,
        ThreatLevel::Medium => 5,
        ThreatLevel::Low => 2,
    }
}

/// Parse a free-text threat level. Case and surrounding whitespace are
/// ignored. Returns `None` for unrecognised text.
pub fn parse_threat_level(text: &str) -> Option<ThreatLevel> {
    match text.trim().to_ascii_lowercase().as_str() {
        "critical" | "crit" | "severe" => Some(ThreatLevel::Critical),
        "high" => Some(ThreatLevel::High),
        "medium" | "med" | "moderate" => Some(ThreatLevel::Medium),
        "low" | "minor" => Some(ThreatLevel::Low),
        _ => None,
    }
}

/// Classifier that reads the level name from `threat_text`.
///
/// Unrecognised text is classified as [`ThreatLevel::Low`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelClassifier;

impl Classifier for LevelClassifier {
    fn classify(&self, raw: &RawEvent) -> Classification {
        let level = parse_threat_level(&raw.threat_text).unwrap_or_else(|| {
            tracing::debug!(
                threat_text = %raw.threat_text,
                "unrecognised threat text, classifying as low"
            );
            ThreatLevel::Low
        });
        Classification::for_level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(threat: &str) -> RawEvent {
        RawEvent {
            location: "Station Square".to_owned(),
            threat_text: threat.to_owned(),
            description: "Badniks sighted".to_owned(),
            source_tag: "RADAR".to_owned(),
            raw_payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn priorities_follow_levels() {
        let c = LevelClassifier;
        assert_eq!(c.classify(&raw("critical")).priority_score, 10);
        assert_eq!(c.classify(&raw("HIGH")).priority_score, 7);
        assert_eq!(c.classify(&raw(" Medium ")).priority_score, 5);
        assert_eq!(c.classify(&raw("low")).priority_score, 2);
    }

    #[test]
    fn unknown_text_is_low() {
        let verdict = LevelClassifier.classify(&raw("apocalyptic"));
        assert_eq!(verdict, Classification::for_level(ThreatLevel::Low));
        assert_eq!(LevelClassifier.classify(&raw("")).threat_level, ThreatLevel::Low);
    }

    #[test]
    fn every_level_round_trips_through_its_name() {
        for level in ThreatLevel::ALL {
            assert_eq!(parse_threat_level(level.as_str()), Some(level));
        }
    }
}
