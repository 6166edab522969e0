use std::collections::BTreeMap;
use std::time::Duration;

use device_registry_sdk::ArchSynonyms;
use serde::{Deserialize, Serialize};

/// Configuration for the device registry module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceRegistryConfig {
    /// Extra architecture aliases (alias -> canonical), merged over the
    /// built-in table.
    #[serde(default)]
    pub arch_synonyms: BTreeMap<String, String>,

    /// How long a successful credential validation is trusted before the
    /// validator is consulted again.
    #[serde(
        default = "default_credential_validity",
        with = "modkit_utils::humantime_serde"
    )]
    pub credential_validity: Duration,

    /// Allow a configured device to re-enter `configuring`.
    #[serde(default = "default_allow_reregistration")]
    pub allow_reregistration: bool,
}

fn default_credential_validity() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_allow_reregistration() -> bool {
    true
}

impl DeviceRegistryConfig {
    /// Built-in synonyms extended by `arch_synonyms`.
    #[must_use]
    pub fn arch_table(&self) -> ArchSynonyms {
        ArchSynonyms::with_overrides(
            self.arch_synonyms
                .iter()
                .map(|(alias, canonical)| (alias.as_str(), canonical.as_str())),
        )
    }
}

impl Default for DeviceRegistryConfig {
    fn default() -> Self {
        Self {
            arch_synonyms: BTreeMap::new(),
            credential_validity: default_credential_validity(),
            allow_reregistration: default_allow_reregistration(),
        }
    }
}
