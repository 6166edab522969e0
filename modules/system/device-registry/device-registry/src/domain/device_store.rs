use std::sync::atomic::{AtomicU64, Ordering};

use device_registry_sdk::{PersistedDevice, Service};
use parking_lot::RwLock;

/// The registered device and its service descriptors.
#[derive(Debug, Clone)]
pub struct Registration {
    pub record: PersistedDevice,
    pub services: Vec<Service>,
    /// Changes whenever the device registers or re-registers.
    pub generation: u64,
}

/// In-memory storage for the local device registration.
///
/// Holds at most one registration. Readers get clones; writers run their
/// closure under the write lock so each mutation is applied atomically.
pub struct DeviceStore {
    registration: RwLock<Option<Registration>>,
    generations: AtomicU64,
}

impl DeviceStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registration: RwLock::new(None),
            generations: AtomicU64::new(0),
        }
    }

    /// A generation number never handed out before by this store.
    #[must_use]
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Snapshot of the canonical record with its registration generation.
    #[must_use]
    pub fn record_with_generation(&self) -> Option<(PersistedDevice, u64)> {
        self.registration
            .read()
            .as_ref()
            .map(|r| (r.record.clone(), r.generation))
    }

    /// Snapshot of the canonical record, if registered.
    #[must_use]
    pub fn record(&self) -> Option<PersistedDevice> {
        self.registration.read().as_ref().map(|r| r.record.clone())
    }

    /// Snapshot of the service descriptors, if registered.
    #[must_use]
    pub fn services(&self) -> Option<Vec<Service>> {
        self.registration.read().as_ref().map(|r| r.services.clone())
    }

    /// Run `f` on the slot under the write lock. `f` may create, replace or
    /// clear the registration.
    pub fn update<T>(&self, f: impl FnOnce(&mut Option<Registration>) -> T) -> T {
        let mut guard = self.registration.write();
        f(&mut guard)
    }

    /// Run `f` on the registration under the write lock; `None` if there is
    /// no registration.
    pub fn update_registered<T>(&self, f: impl FnOnce(&mut Registration) -> T) -> Option<T> {
        self.registration.write().as_mut().map(f)
    }

    /// Remove and return the registration.
    pub fn take(&self) -> Option<Registration> {
        self.registration.write().take()
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}
