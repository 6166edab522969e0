//! Device Registry Module
//!
//! Owns the registration of the local edge device and the configuration of
//! the services it offers.
//!
//! A device moves through `unconfigured -> configuring -> configured`. While
//! configuring, service descriptors can be added; running service instances
//! are later matched to exactly one descriptor by org, url, arch and version.
//!
//! The canonical record (including the device token) never leaves this crate;
//! every read returns a [`device_registry_sdk::DeviceIdentity`] built through
//! the redaction boundary.

pub mod config;
pub use config::DeviceRegistryConfig;

pub mod domain;
pub use domain::credentials::{CredentialValidator, LocalCredentialValidator};
pub use domain::error::DomainError;
pub use domain::service::RegistrationService;
