//! The set of responders that may be dispatched.
//!
//! The roster is fixed at startup. Its order is the preference order the
//! escalation policy uses when it has to pick a single responder.

use std::collections::BTreeSet;

use hedgehog_types::ResponderId;

use crate::config::RespondersConfig;

/// Errors building a [`ResponderRoster`].
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// No responders were configured.
    #[error("responder roster is empty")]
    Empty,

    /// The same responder appears twice.
    #[error("responder {0} listed more than once")]
    Duplicate(String),

    /// The primary responder is not on the roster.
    #[error("primary responder {0} is not on the roster")]
    UnknownPrimary(String),
}

/// Known responders plus the designated primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderRoster {
    responders: Vec<ResponderId>,
    primary: ResponderId,
}

impl ResponderRoster {
    /// Build a roster, checking for duplicates and a known primary.
    ///
    /// # Errors
    ///
    /// Returns a [`RosterError`] if the roster is empty, contains a
    /// duplicate, or does not contain the primary.
    pub fn new(responders: Vec<ResponderId>, primary: ResponderId) -> Result<Self, RosterError> {
        if responders.is_empty() {
            return Err(RosterError::Empty);
        }
        let mut seen = BTreeSet::new();
        for id in &responders {
            if !seen.insert(id) {
                return Err(RosterError::Duplicate(id.to_string()));
            }
        }
        if !seen.contains(&primary) {
            return Err(RosterError::UnknownPrimary(primary.into_inner()));
        }
        Ok(Self {
            responders,
            primary,
        })
    }

    /// Build a roster from the `responders` config section.
    ///
    /// # Errors
    ///
    /// See [`ResponderRoster::new`].
    pub fn from_config(config: &RespondersConfig) -> Result<Self, RosterError> {
        Self::new(
            config.roster.iter().map(|name| ResponderId::new(name.as_str())).collect(),
            ResponderId::new(config.primary.as_str()),
        )
    }

    /// The designated primary responder.
    pub const fn primary(&self) -> &ResponderId {
        &self.primary
    }

    /// Whether `name` is a known responder.
    pub fn contains(&self, name: &str) -> bool {
        self.responders.iter().any(|r| r.as_str() == name)
    }

    /// Responders in preference order.
    pub fn iter(&self) -> impl Iterator<Item = &ResponderId> {
        self.responders.iter()
    }

    /// Every known responder.
    pub fn all(&self) -> BTreeSet<ResponderId> {
        self.responders.iter().cloned().collect()
    }

    /// Number of known responders.
    pub fn len(&self) -> usize {
        self.responders.len()
    }

    /// Always false: a roster is never empty once built.
    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    /// Members of `selection` that are not on the roster, in order.
    pub fn unknown_in(&self, selection: &BTreeSet<ResponderId>) -> Vec<ResponderId> {
        selection
            .iter()
            .filter(|id| !self.contains(id.as_str()))
            .cloned()
            .collect()
    }
}
