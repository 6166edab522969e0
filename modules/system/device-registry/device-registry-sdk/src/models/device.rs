use std::fmt;

use modkit_utils::SecretString;
use serde::{Deserialize, Serialize};

use super::{ConfigState, or_not_set};
use crate::error::DeviceModelError;

/// The device's identity, credential and configuration state as seen by API
/// callers.
///
/// The `token` is accepted from registration requests but is never
/// serialized, and values built by [`DeviceIdentity::from_persisted`] never
/// carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Stable once assigned.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "organization", default)]
    pub org: Option<String>,
    /// Deployment pattern name, not prefixed with the org.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_last_valid_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ha: Option<bool>,
    #[serde(rename = "configstate", default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigState>,
}

impl DeviceIdentity {
    /// Build the API view of a canonical record.
    ///
    /// This is the redaction boundary: fields are copied one by one and the
    /// token is left out. A field added to [`PersistedDevice`] stays hidden
    /// until it is explicitly mapped here.
    #[must_use]
    pub fn from_persisted(record: &PersistedDevice) -> Self {
        Self {
            id: Some(record.id.clone()),
            org: Some(record.org.clone()),
            pattern: Some(record.pattern.clone()),
            name: Some(record.name.clone()),
            token: None,
            token_last_valid_time: Some(record.token_last_valid_time),
            token_valid: Some(record.token_valid),
            ha: Some(record.ha),
            config: Some(record.config),
        }
    }

    /// A copy of this value with the token removed.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            token: None,
            ..self.clone()
        }
    }

    /// `true` when a non-empty token is present.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Check the fields a registration request must carry: `id`,
    /// `organization` and a non-empty `token`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceModelError::MissingRequiredField`] for the first absent
    /// field.
    pub fn validate_registration(&self) -> Result<(), DeviceModelError> {
        if self.id.as_deref().is_none_or(str::is_empty) {
            return Err(DeviceModelError::missing("device", "id"));
        }
        if self.org.as_deref().is_none_or(str::is_empty) {
            return Err(DeviceModelError::missing("device", "organization"));
        }
        if !self.has_token() {
            return Err(DeviceModelError::missing("device", "token"));
        }
        Ok(())
    }
}

impl From<&PersistedDevice> for DeviceIdentity {
    fn from(record: &PersistedDevice) -> Self {
        Self::from_persisted(record)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.has_token() { "set" } else { "not set" };
        write!(
            f,
            "Id: {}, Org: {}, Pattern: {}, Name: {}, Token: [{token}], TokenLastValidTime: {}, TokenValid: {}, HA: {}, ",
            or_not_set(self.id.as_deref()),
            or_not_set(self.org.as_deref()),
            or_not_set(self.pattern.as_deref()),
            or_not_set(self.name.as_deref()),
            or_not_set(self.token_last_valid_time.as_ref()),
            or_not_set(self.token_valid.as_ref()),
            or_not_set(self.ha.as_ref()),
        )?;
        match &self.config {
            Some(config) => write!(f, "{config}"),
            None => f.write_str("Configstate: not set"),
        }
    }
}

/// The canonical device record as held by the persistence layer.
///
/// Only ever exposed to API callers through [`DeviceIdentity::from_persisted`].
/// `Debug` is safe to log: the token prints as `[REDACTED]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistedDevice {
    pub id: String,
    pub org: String,
    pub pattern: String,
    pub name: String,
    pub token: SecretString,
    #[serde(default)]
    pub token_last_valid_time: u64,
    #[serde(default)]
    pub token_valid: bool,
    #[serde(default)]
    pub ha: bool,
    #[serde(default)]
    pub config: ConfigState,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::use_debug)]

    use super::*;
    use crate::models::ConfigPhase;

    const SECRET: &str = "s3cr3t-Tok3n-zq9X";

    fn record() -> PersistedDevice {
        PersistedDevice {
            id: "node-1".to_owned(),
            org: "acme".to_owned(),
            pattern: "netspeed".to_owned(),
            name: "edge box".to_owned(),
            token: SecretString::new(SECRET),
            token_last_valid_time: 1_700_000_000,
            token_valid: true,
            ha: false,
            config: ConfigState {
                state: Some(ConfigPhase::Configured),
                last_update_time: Some(1_700_000_100),
            },
        }
    }

    #[test]
    fn conversion_copies_fields_and_drops_token() {
        let rec = record();
        let dev = DeviceIdentity::from_persisted(&rec);

        assert_eq!(dev.id.as_deref(), Some("node-1"));
        assert_eq!(dev.org.as_deref(), Some("acme"));
        assert_eq!(dev.pattern.as_deref(), Some("netspeed"));
        assert_eq!(dev.name.as_deref(), Some("edge box"));
        assert_eq!(dev.token_last_valid_time, Some(1_700_000_000));
        assert_eq!(dev.token_valid, Some(true));
        assert_eq!(dev.ha, Some(false));
        assert_eq!(dev.config, Some(rec.config));
        assert!(dev.token.is_none());

        // input is untouched
        assert_eq!(rec, record());
    }

    #[test]
    fn converted_value_never_leaks_the_token() {
        let dev = DeviceIdentity::from(&record());
        let json = serde_json::to_string(&dev).unwrap();
        let shown = dev.to_string();
        let debug = format!("{dev:?}");

        for rendered in [&json, &shown, &debug] {
            assert!(!rendered.contains(SECRET), "leaked in {rendered}");
            // any sizeable fragment of the secret
            for window in SECRET.as_bytes().windows(6) {
                let frag = std::str::from_utf8(window).unwrap();
                assert!(!rendered.contains(frag), "fragment {frag} leaked in {rendered}");
            }
        }
        assert!(shown.contains("Token: [not set]"));
    }

    #[test]
    fn persisted_debug_is_redacted() {
        let debug = format!("{:?}", record());
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn registration_request_accepts_token_but_never_emits_it() {
        let req: DeviceIdentity = serde_json::from_str(&format!(
            r#"{{"id":"node-1","organization":"acme","pattern":"p","token":"{SECRET}"}}"#
        ))
        .unwrap();
        assert!(req.has_token());
        assert!(req.validate_registration().is_ok());
        assert!(req.to_string().contains("Token: [set]"));

        let out = serde_json::to_value(&req).unwrap();
        assert!(out.get("token").is_none());
        assert!(!out.to_string().contains(SECRET));
        assert!(req.redacted().token.is_none());
    }

    #[test]
    fn wire_format_nulls_and_omissions() {
        let out = serde_json::to_value(DeviceIdentity::default()).unwrap();
        assert_eq!(
            out,
            serde_json::json!({ "id": null, "organization": null, "pattern": null })
        );

        let out = serde_json::to_value(DeviceIdentity::from(&record())).unwrap();
        assert_eq!(out["organization"], "acme");
        assert_eq!(out["token_valid"], true);
        assert_eq!(out["ha"], false);
        assert_eq!(out["configstate"]["state"], "configured");
    }

    #[test]
    fn registration_requires_id_org_and_token() {
        let mut req = DeviceIdentity {
            id: Some("node-1".to_owned()),
            org: Some("acme".to_owned()),
            token: Some(SecretString::new("")),
            ..DeviceIdentity::default()
        };
        assert_eq!(
            req.validate_registration(),
            Err(DeviceModelError::MissingRequiredField {
                entity: "device",
                field: "token"
            })
        );

        req.token = Some(SecretString::new("t"));
        req.org = None;
        assert!(matches!(
            req.validate_registration(),
            Err(DeviceModelError::MissingRequiredField {
                field: "organization",
                ..
            })
        ));
    }

    #[test]
    fn zero_value_renders_sentinels() {
        let shown = DeviceIdentity::default().to_string();
        assert!(!shown.is_empty());
        assert!(shown.starts_with("Id: not set, Org: not set"));
        assert!(shown.ends_with("Configstate: not set"));
    }
}
