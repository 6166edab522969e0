//! Device Registry SDK
//!
//! Data model shared by the device registration service and its API callers:
//!
//! - [`DeviceIdentity`] and [`PersistedDevice`] - API view and canonical record;
//!   [`DeviceIdentity::from_persisted`] is the credential redaction boundary
//! - [`ConfigState`] / [`ConfigPhase`] - registration lifecycle state machine
//! - [`Service`] and [`Attribute`] - service descriptors and their attributes
//! - [`resolve_service`] - descriptor selection by org, url, arch and version
//! - [`DeviceModelError`] - error types
//!
//! ## Usage
//!
//! ```
//! # use device_registry_sdk::{ArchSynonyms, Service, ServiceCandidate, resolve_service};
//! let services = vec![Service::new("https://svc", "acme", "gps", "amd64", "[1.0.0,2.0.0)")];
//! let candidate = ServiceCandidate::new("acme", "https://svc", "x86_64", "1.4.2");
//! let found = resolve_service(&services, &candidate, &ArchSynonyms::default())?;
//! assert!(found.is_some());
//! # Ok::<(), device_registry_sdk::DeviceModelError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod arch;
pub mod error;
pub mod models;
pub mod resolver;
pub mod version;

// Re-export main types at crate root
pub use arch::ArchSynonyms;
pub use error::DeviceModelError;
pub use models::{
    Attribute, ConfigPhase, ConfigState, DeviceIdentity, MappingValue, Mappings, PersistedDevice,
    Service, now_epoch_secs,
};
pub use resolver::{ServiceCandidate, resolve_service};
pub use version::{Version, VersionRange};
