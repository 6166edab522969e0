use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NOT_SET, list, or_not_set};
use crate::error::DeviceModelError;

/// Attribute-specific settings. The schema is owned by the attribute `type`.
pub type Mappings = BTreeMap<String, MappingValue>;

/// A dynamically typed mapping value.
///
/// Integers that fit `i64` deserialize as `Integer`, larger ones as
/// `Unsigned`. `Float` must be finite to survive serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingValue {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Sequence(Vec<MappingValue>),
    Mapping(Mappings),
}

impl From<bool> for MappingValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MappingValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u64> for MappingValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Self::Unsigned(v), Self::Integer)
    }
}

impl From<f64> for MappingValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MappingValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for MappingValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<MappingValue>> for MappingValue {
    fn from(v: Vec<MappingValue>) -> Self {
        Self::Sequence(v)
    }
}

impl From<Mappings> for MappingValue {
    fn from(v: Mappings) -> Self {
        Self::Mapping(v)
    }
}

impl MappingValue {
    /// `true` when this value and everything nested in it can be serialized
    /// and read back unchanged.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        match self {
            Self::Float(v) => v.is_finite(),
            Self::Sequence(items) => items.iter().all(Self::is_portable),
            Self::Mapping(map) => map.values().all(Self::is_portable),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::Unsigned(_)
            | Self::String(_) => true,
        }
    }
}

impl fmt::Display for MappingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "\"{v}\""),
            Self::Sequence(items) => write!(f, "{}", list(items)),
            Self::Mapping(map) => write!(f, "{}", DisplayMappings(map)),
        }
    }
}

struct DisplayMappings<'a>(&'a Mappings);

impl fmt::Display for DisplayMappings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

/// A typed key/value descriptor attached to a service.
///
/// Visibility:
/// - `publishable`: the value may be shown to a negotiation counterparty.
/// - `host_only`: the value is for local configuration and never leaves the
///   device. A host-only attribute is never publishable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Assigned once the attribute is persisted.
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub attr_type: Option<String>,
    /// Sensor URLs this attribute applies to; empty means all.
    pub sensor_urls: Option<Vec<String>>,
    pub label: Option<String>,
    pub publishable: Option<bool>,
    pub host_only: Option<bool>,
    pub mappings: Option<Mappings>,
}

impl Attribute {
    /// Build an attribute with every field set.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::InvalidAttribute`] when `attr_type` is blank,
    /// when both `publishable` and `host_only` are requested, or when a
    /// mapping holds a NaN or infinite float.
    pub fn new(
        attr_type: impl Into<String>,
        sensor_urls: Vec<String>,
        label: impl Into<String>,
        publishable: bool,
        host_only: bool,
        mappings: Mappings,
    ) -> Result<Self, DeviceModelError> {
        let attr = Self {
            id: None,
            attr_type: Some(attr_type.into()),
            sensor_urls: Some(sensor_urls),
            label: Some(label.into()),
            publishable: Some(publishable),
            host_only: Some(host_only),
            mappings: Some(mappings),
        };
        attr.validate()?;
        Ok(attr)
    }

    /// Apply the construction rules to a value that arrived by other means,
    /// typically deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::InvalidAttribute`] when `type` is missing or
    /// blank, when both visibility flags are set, or when a mapping value is
    /// a non-finite float.
    pub fn validate(&self) -> Result<(), DeviceModelError> {
        if self.attr_type.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(DeviceModelError::invalid_attribute(
                "missing required field 'type'",
            ));
        }
        if self.publishable == Some(true) && self.host_only == Some(true) {
            return Err(DeviceModelError::invalid_attribute(format!(
                "attribute '{}' cannot be both publishable and host_only",
                self.attr_type.as_deref().unwrap_or(NOT_SET)
            )));
        }
        if let Some((key, _)) = self
            .mappings
            .iter()
            .flatten()
            .find(|(_, v)| !v.is_portable())
        {
            return Err(DeviceModelError::invalid_attribute(format!(
                "mapping '{key}' holds a non-finite number"
            )));
        }
        Ok(())
    }

    /// May this attribute be sent to a counterparty. `host_only` wins over
    /// `publishable`.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.publishable == Some(true) && !self.is_host_only()
    }

    #[must_use]
    pub fn is_host_only(&self) -> bool {
        self.host_only == Some(true)
    }

    /// `true` when the attribute applies to `sensor_url` (an empty or absent
    /// URL list applies to every sensor).
    #[must_use]
    pub fn applies_to(&self, sensor_url: &str) -> bool {
        match self.sensor_urls.as_deref() {
            None | Some([]) => true,
            Some(urls) => urls.iter().any(|u| u == sensor_url),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Id: {}, Type: {}, SensorUrls: ",
            or_not_set(self.id.as_deref()),
            or_not_set(self.attr_type.as_deref()),
        )?;
        match self.sensor_urls.as_deref() {
            Some(urls) => write!(f, "{}", list(urls))?,
            None => f.write_str(NOT_SET)?,
        }
        write!(
            f,
            ", Label: {}, Publishable: {}, HostOnly: {}, Mappings: ",
            or_not_set(self.label.as_deref()),
            or_not_set(self.publishable.as_ref()),
            or_not_set(self.host_only.as_ref()),
        )?;
        match &self.mappings {
            Some(m) => write!(f, "{}", DisplayMappings(m)),
            None => f.write_str(NOT_SET),
        }
    }
}
