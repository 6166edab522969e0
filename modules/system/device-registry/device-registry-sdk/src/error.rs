//! Error types for the device registration model.

use thiserror::Error;

use crate::models::ConfigPhase;

/// Conditions surfaced by construction, transition and resolution.
///
/// Every variant is a recoverable, value-returned condition. Callers such as
/// API handlers translate them into user-facing messages; this crate only
/// guarantees they are distinguishable by kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceModelError {
    /// The configuration state machine has no edge `from -> to`.
    #[error("invalid configuration state transition from {from} to {to}")]
    InvalidTransition {
        /// Current phase.
        from: ConfigPhase,
        /// Requested phase.
        to: ConfigPhase,
    },

    /// More than one service descriptor matched a candidate service.
    #[error(
        "ambiguous configuration: {matches} service configurations match org {org}, url {url}, arch {arch}, version {version}"
    )]
    AmbiguousConfiguration {
        /// Candidate organization.
        org: String,
        /// Candidate service URL.
        url: String,
        /// Candidate architecture, after synonym normalization.
        arch: String,
        /// Candidate version.
        version: String,
        /// Number of matching descriptors.
        matches: usize,
    },

    /// An attribute violates its construction rules.
    #[error("invalid attribute: {reason}")]
    InvalidAttribute {
        /// What is wrong with the attribute.
        reason: String,
    },

    /// A version or version-range expression could not be parsed.
    #[error("malformed version range '{expression}': {reason}")]
    MalformedVersionRange {
        /// The offending expression.
        expression: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A field required at this boundary is absent.
    #[error("{entity} is missing required field '{field}'")]
    MissingRequiredField {
        /// Entity kind, e.g. `service` or `device`.
        entity: &'static str,
        /// Serialized field name.
        field: &'static str,
    },
}

impl DeviceModelError {
    pub(crate) fn invalid_attribute(reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_range(expression: &str, reason: impl Into<String>) -> Self {
        Self::MalformedVersionRange {
            expression: expression.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(entity: &'static str, field: &'static str) -> Self {
        Self::MissingRequiredField { entity, field }
    }
}
