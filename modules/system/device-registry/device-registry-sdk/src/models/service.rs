use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Attribute, braced_list, or_not_set};
use crate::error::DeviceModelError;
use crate::version::VersionRange;

/// Upgrade policy applied when `auto_upgrade` is unset.
pub const DEFAULT_AUTO_UPGRADE: bool = true;
/// Agreement policy applied when `active_upgrade` is unset.
pub const DEFAULT_ACTIVE_UPGRADE: bool = false;

/// Configuration of one service the device offers.
///
/// `url`, `org`, `arch` and `version_range` together select the descriptor
/// for a running service; see [`crate::resolver::resolve_service`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub url: Option<String>,
    #[serde(rename = "organization")]
    pub org: Option<String>,
    pub name: Option<String>,
    /// May be a synonym such as `x86_64`; compare through
    /// [`crate::arch::ArchSynonyms`].
    pub arch: Option<String>,
    #[serde(rename = "versionRange")]
    pub version_range: Option<String>,
    /// Accept new matching versions without operator action.
    pub auto_upgrade: Option<bool>,
    /// Terminate agreements on upgrade instead of letting them drain.
    pub active_upgrade: Option<bool>,
    pub attributes: Option<Vec<Attribute>>,
}

impl Service {
    /// A descriptor with the default upgrade policy and no attributes.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        org: impl Into<String>,
        name: impl Into<String>,
        arch: impl Into<String>,
        version_range: impl Into<String>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            org: Some(org.into()),
            name: Some(name.into()),
            arch: Some(arch.into()),
            version_range: Some(version_range.into()),
            auto_upgrade: Some(DEFAULT_AUTO_UPGRADE),
            active_upgrade: Some(DEFAULT_ACTIVE_UPGRADE),
            attributes: Some(Vec::new()),
        }
    }

    /// Append a validated attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::InvalidAttribute`] if `attr` breaks its
    /// construction rules; the descriptor is left unchanged.
    pub fn add_attribute(&mut self, attr: Attribute) -> Result<(), DeviceModelError> {
        attr.validate()?;
        self.attributes.get_or_insert_with(Vec::new).push(attr);
        Ok(())
    }

    #[must_use]
    pub fn auto_upgrade(&self) -> bool {
        self.auto_upgrade.unwrap_or(DEFAULT_AUTO_UPGRADE)
    }

    #[must_use]
    pub fn active_upgrade(&self) -> bool {
        self.active_upgrade.unwrap_or(DEFAULT_ACTIVE_UPGRADE)
    }

    /// Attributes in declaration order; empty when unset.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        self.attributes.as_deref().unwrap_or_default()
    }

    /// Parsed `versionRange`.
    ///
    /// # Errors
    ///
    /// [`DeviceModelError::MissingRequiredField`] when unset, or
    /// [`DeviceModelError::MalformedVersionRange`] when it does not parse.
    pub fn version_range(&self) -> Result<VersionRange, DeviceModelError> {
        let expr = self
            .version_range
            .as_deref()
            .ok_or_else(|| DeviceModelError::missing("service", "versionRange"))?;
        VersionRange::parse(expr)
    }

    /// Check everything the resolver and negotiation engine rely on.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a missing `url`, `organization`,
    /// `arch` or `versionRange`, an unparseable range, or an invalid attribute.
    pub fn validate(&self) -> Result<(), DeviceModelError> {
        require(self.url.as_deref(), "url")?;
        require(self.org.as_deref(), "organization")?;
        require(self.arch.as_deref(), "arch")?;
        require(self.version_range.as_deref(), "versionRange")?;
        self.version_range()?;
        self.attributes().iter().try_for_each(Attribute::validate)
    }

    /// Fill unset upgrade flags and attributes with their defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.auto_upgrade.get_or_insert(DEFAULT_AUTO_UPGRADE);
        self.active_upgrade.get_or_insert(DEFAULT_ACTIVE_UPGRADE);
        self.attributes.get_or_insert_with(Vec::new);
        self
    }

    /// The copy handed to a negotiation counterparty: only publishable
    /// attributes are kept.
    #[must_use]
    pub fn for_counterparty(&self) -> Self {
        Self {
            attributes: self.attributes.as_ref().map(|attrs| {
                attrs
                    .iter()
                    .filter(|a| a.is_publishable())
                    .cloned()
                    .collect()
            }),
            ..self.clone()
        }
    }
}

fn require(value: Option<&str>, field: &'static str) -> Result<(), DeviceModelError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(DeviceModelError::missing("service", field)),
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "URL: {}, Org: {}, Name: {}, Arch: {}, VersionRange: {}, AutoUpgrade: {}, ActiveUpgrade: {}, Attributes: ",
            or_not_set(self.url.as_deref()),
            or_not_set(self.org.as_deref()),
            or_not_set(self.name.as_deref()),
            or_not_set(self.arch.as_deref()),
            or_not_set(self.version_range.as_deref()),
            or_not_set(self.auto_upgrade.as_ref()),
            or_not_set(self.active_upgrade.as_ref()),
        )?;
        match self.attributes.as_deref() {
            Some(attrs) => write!(f, "{}", braced_list(attrs)),
            None => f.write_str(super::NOT_SET),
        }
    }
}
