//! Configuration loading and typed config structures for the alert processor.
//!
//! The canonical configuration lives in `hedgehog-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure and provides a loader that reads, overrides from the
//! environment, and validates the file. Every field has a default, so an
//! absent file or an empty section yields a runnable configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::enricher::{ZoneError, ZoneTable};
use crate::roster::{ResponderRoster, RosterError};

/// Longest decision deadline accepted (one day).
pub const MAX_DECISION_TIMEOUT_MS: u64 = 86_400_000;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is present but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// The responder roster is inconsistent.
    #[error("invalid responders section: {source}")]
    Roster {
        /// The underlying roster error.
        #[from]
        source: RosterError,
    },

    /// The zone table is inconsistent.
    #[error("invalid zones section: {source}")]
    Zones {
        /// The underlying zone error.
        #[from]
        source: ZoneError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `hedgehog-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlertConfig {
    /// Run loop pacing and limits.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Decision deadline settings.
    #[serde(default)]
    pub arbiter: ArbiterConfig,

    /// Operator console listener.
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Responder directory and delivery timeout.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Known responders and the primary responder.
    #[serde(default)]
    pub responders: RespondersConfig,

    /// Zone knowledge table keyed by location.
    #[serde(default = "default_zones")]
    pub zones: BTreeMap<String, ZoneEntry>,

    /// Initial score counters.
    #[serde(default)]
    pub game: GameConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            arbiter: ArbiterConfig::default(),
            console: ConsoleConfig::default(),
            notifier: NotifierConfig::default(),
            responders: RespondersConfig::default(),
            zones: default_zones(),
            game: GameConfig::default(),
        }
    }
}

impl AlertConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `HEDGEHOG_CONSOLE_PORT` overrides `console.port`
    /// - `HEDGEHOG_DECISION_TIMEOUT_MS` overrides `arbiter.decision_timeout_ms`
    ///
    /// The result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or a
    /// validation error if the content is inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse, override, and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or a
    /// validation error if the content is inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override is not a number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("HEDGEHOG_CONSOLE_PORT") {
            self.console.port = val
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("HEDGEHOG_CONSOLE_PORT: {e}")))?;
        }
        if let Ok(val) = std::env::var("HEDGEHOG_DECISION_TIMEOUT_MS") {
            self.arbiter.decision_timeout_ms = val.parse().map_err(|e| {
                ConfigError::Invalid(format!("HEDGEHOG_DECISION_TIMEOUT_MS: {e}"))
            })?;
        }
        Ok(())
    }

    /// Check cross-field consistency.
    ///
    /// Builds the responder roster and zone table to make sure they can be
    /// built at startup, so a bad config fails before any event is read.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arbiter.decision_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "arbiter.decision_timeout_ms must be greater than 0".to_owned(),
            ));
        }
        if self.arbiter.decision_timeout_ms > MAX_DECISION_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "arbiter.decision_timeout_ms ({}) exceeds {MAX_DECISION_TIMEOUT_MS}",
                self.arbiter.decision_timeout_ms
            )));
        }
        if self.pipeline.interval_min_ms > self.pipeline.interval_max_ms {
            return Err(ConfigError::Invalid(format!(
                "pipeline.interval_min_ms ({}) exceeds interval_max_ms ({})",
                self.pipeline.interval_min_ms, self.pipeline.interval_max_ms
            )));
        }
        if self.notifier.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "notifier.request_timeout_ms must be greater than 0".to_owned(),
            ));
        }
        let roster = self.roster()?;
        self.zone_table(&roster)?;
        Ok(())
    }

    /// Build the responder roster described by this config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Roster`] if the roster is inconsistent.
    pub fn roster(&self) -> Result<ResponderRoster, ConfigError> {
        Ok(ResponderRoster::from_config(&self.responders)?)
    }

    /// Build the zone table described by this config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Zones`] if the table is inconsistent.
    pub fn zone_table(&self, roster: &ResponderRoster) -> Result<ZoneTable, ConfigError> {
        Ok(ZoneTable::from_config(&self.zones, roster)?)
    }
}

/// Run loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    /// Minimum pause between cycles in milliseconds.
    #[serde(default = "default_interval_min_ms")]
    pub interval_min_ms: u64,

    /// Maximum pause between cycles in milliseconds.
    #[serde(default = "default_interval_max_ms")]
    pub interval_max_ms: u64,

    /// Stop after this many cycles (0 = unlimited).
    #[serde(default)]
    pub max_cycles: u64,
}

impl PipelineConfig {
    /// Minimum inter-cycle pause.
    pub const fn interval_min(&self) -> Duration {
        Duration::from_millis(self.interval_min_ms)
    }

    /// Maximum inter-cycle pause.
    pub const fn interval_max(&self) -> Duration {
        Duration::from_millis(self.interval_max_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interval_min_ms: default_interval_min_ms(),
            interval_max_ms: default_interval_max_ms(),
            max_cycles: 0,
        }
    }
}

/// Decision arbitration configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArbiterConfig {
    /// Milliseconds the operator has to decide before the timeout policy applies.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: u64,
}

impl ArbiterConfig {
    /// The decision window as a [`Duration`].
    pub const fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            decision_timeout_ms: default_decision_timeout_ms(),
        }
    }
}

/// Operator console listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleConfig {
    /// Whether to start the console at all. When disabled every event
    /// resolves through the error-fallback path.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind.
    #[serde(default = "default_console_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_console_port")]
    pub port: u16,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_console_host(),
            port: default_console_port(),
        }
    }
}

/// Responder directory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotifierConfig {
    /// Per-delivery timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Delivery address per target (`AuditLog` for the audit sink).
    #[serde(default = "default_endpoints")]
    pub endpoints: BTreeMap<String, String>,
}

impl NotifierConfig {
    /// The per-delivery timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            endpoints: default_endpoints(),
        }
    }
}

/// Known responders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RespondersConfig {
    /// Every responder that can be dispatched, in preference order.
    #[serde(default = "default_roster")]
    pub roster: Vec<String>,

    /// The designated primary responder (must appear in `roster`).
    #[serde(default = "default_primary")]
    pub primary: String,
}

impl Default for RespondersConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            primary: default_primary(),
        }
    }
}

/// One entry in the zone knowledge table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneEntry {
    /// Display name; defaults to the location key.
    #[serde(default)]
    pub name: Option<String>,

    /// Short description of the zone.
    #[serde(default)]
    pub description: String,

    /// Responders stationed near this zone.
    #[serde(default)]
    pub nearby_responders: Vec<String>,
}

/// Initial score counters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Attacker health at start (clamped to 100).
    #[serde(default = "default_initial_attacker_health")]
    pub initial_attacker_health: u8,

    /// Panic level at start (clamped to 100).
    #[serde(default)]
    pub initial_panic_level: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_attacker_health: default_initial_attacker_health(),
            initial_panic_level: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_interval_min_ms() -> u64 {
    5_000
}

const fn default_interval_max_ms() -> u64 {
    10_000
}

const fn default_decision_timeout_ms() -> u64 {
    40_000
}

fn default_console_host() -> String {
    String::from("0.0.0.0")
}

const fn default_console_port() -> u16 {
    5005
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}

const fn default_initial_attacker_health() -> u8 {
    100
}

fn default_roster() -> Vec<String> {
    vec![
        String::from("Sonic"),
        String::from("Tails"),
        String::from("Knuckles"),
    ]
}

fn default_primary() -> String {
    String::from("Sonic")
}

fn default_endpoints() -> BTreeMap<String, String> {
    [
        ("Sonic", "http://127.0.0.1:5001/alert"),
        ("Knuckles", "http://127.0.0.1:5002/alert"),
        ("Tails", "http://127.0.0.1:5003/alert"),
        ("AuditLog", "http://127.0.0.1:5004/alert"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

fn zone(description: &str, nearby: &[&str]) -> ZoneEntry {
    ZoneEntry {
        name: None,
        description: description.to_owned(),
        nearby_responders: nearby.iter().map(|s| (*s).to_owned()).collect(),
    }
}

fn default_zones() -> BTreeMap<String, ZoneEntry> {
    let mut zones = BTreeMap::new();
    zones.insert(
        "Green Hill Zone".to_owned(),
        zone("Rolling green hills and loops.", &["Sonic", "Tails"]),
    );
    zones.insert(
        "Chemical Plant".to_owned(),
        zone("Industrial complex full of pipes.", &["Sonic"]),
    );
    zones.insert(
        "Station Square".to_owned(),
        zone("Busy city centre.", &["Sonic", "Knuckles"]),
    );
    zones.insert(
        "Angel Island".to_owned(),
        zone("Floating island guarding the Master Emerald.", &["Knuckles"]),
    );
    zones.insert(
        "Mystic Ruins".to_owned(),
        zone("Jungle ruins and an old workshop.", &["Tails", "Knuckles"]),
    );
    zones.insert(
        "Tails' Workshop".to_owned(),
        zone("Hangar and lab.", &["Tails"]),
    );
    zones.insert("G.U.N. HQ".to_owned(), zone("Military headquarters.", &[]));
    zones.insert(
        crate::enricher::UNKNOWN_ZONE.to_owned(),
        zone("Location not in the knowledge table.", &[]),
    );
    zones
}
