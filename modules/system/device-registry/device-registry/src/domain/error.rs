use device_registry_sdk::{ConfigPhase, DeviceModelError};

/// Domain-level errors for the device registry
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Device is not registered")]
    DeviceNotRegistered,

    #[error("Device already registered with id {0}")]
    AlreadyRegistered(String),

    #[error("Services cannot be configured while the device is {state}")]
    NotConfigurable { state: ConfigPhase },

    #[error("Credential validation failed: {0}")]
    CredentialValidationFailed(String),

    #[error(transparent)]
    Model(#[from] DeviceModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
