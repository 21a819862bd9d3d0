//! Where each notification target receives alerts.

use std::collections::BTreeMap;

use hedgehog_core::config::NotifierConfig;
use hedgehog_types::Target;

/// Delivery address per target, keyed by [`Target::directory_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponderDirectory {
    addresses: BTreeMap<String, String>,
}

impl ResponderDirectory {
    /// Create a directory from a key to address map.
    pub const fn new(addresses: BTreeMap<String, String>) -> Self {
        Self { addresses }
    }

    /// Directory from the `notifier.endpoints` config section.
    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(config.endpoints.clone())
    }

    /// Address for `target`, if one is configured.
    pub fn address(&self, target: &Target) -> Option<&str> {
        self.addresses.get(target.directory_key()).map(String::as_str)
    }

    /// Number of configured addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether no addresses are configured.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use hedgehog_types::ResponderId;

    use super::*;

    #[test]
    fn default_config_covers_audit_log_and_roster() {
        let directory = ResponderDirectory::from_config(&NotifierConfig::default());
        assert_eq!(directory.address(&Target::AuditLog), Some("http://127.0.0.1:5004/alert"));
        for name in ["Sonic", "Tails", "Knuckles"] {
            assert!(directory.address(&Target::Responder(ResponderId::new(name))).is_some());
        }
        assert!(directory.address(&Target::Responder(ResponderId::new("Amy"))).is_none());
    }
}
