//! Type-safe identifier wrappers around [`String`].
//!
//! Events and responders are identified by human-readable strings (the
//! operator sees them on the console and types them back in), so unlike
//! UUID-keyed stores the wrappers here are string newtypes. Keeping them as
//! distinct types still prevents mixing an event id with a responder id at
//! compile time.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a threat event (e.g. `EVT-20250101120000-0001`).
    EventId
}

define_id! {
    /// Identifier of a responder that can be dispatched to an event.
    ResponderId
}

/// Name used for the audit log in the responder directory.
pub const AUDIT_LOG_KEY: &str = "AuditLog";

/// A notification target: either a responder or the audit log.
///
/// The audit log is not a responder (it can never be chosen by the
/// operator) but it receives every alert.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Target {
    /// The audit log sink that records every resolved alert.
    AuditLog,
    /// A responder endpoint.
    Responder(ResponderId),
}

impl Target {
    /// Key used to look this target up in the responder directory.
    pub fn directory_key(&self) -> &str {
        match self {
            Self::AuditLog => AUDIT_LOG_KEY,
            Self::Responder(id) => id.as_str(),
        }
    }

    /// Return the responder id, or `None` for the audit log.
    pub const fn responder(&self) -> Option<&ResponderId> {
        match self {
            Self::AuditLog => None,
            Self::Responder(id) => Some(id),
        }
    }
}

impl core::fmt::Display for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.directory_key())
    }
}

impl From<ResponderId> for Target {
    fn from(id: ResponderId) -> Self {
        Self::Responder(id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ResponderId::new("Sonic");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"Sonic\""));
    }

    #[test]
    fn responder_set_lookup_by_str() {
        let set: BTreeSet<ResponderId> = ["Sonic", "Tails"].into_iter().map(ResponderId::from).collect();
        assert!(set.contains("Tails"));
        assert!(!set.contains("Knuckles"));
    }

    #[test]
    fn audit_log_sorts_before_responders() {
        let mut targets = BTreeSet::new();
        targets.insert(Target::Responder(ResponderId::new("Amy")));
        targets.insert(Target::AuditLog);
        assert_eq!(targets.first(), Some(&Target::AuditLog));
    }

    #[test]
    fn target_directory_keys() {
        assert_eq!(Target::AuditLog.directory_key(), AUDIT_LOG_KEY);
        assert_eq!(Target::from(ResponderId::new("Tails")).directory_key(), "Tails");
        assert!(Target::AuditLog.responder().is_none());
    }
}
