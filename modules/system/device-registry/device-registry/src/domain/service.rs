use std::sync::Arc;
use std::time::Duration;

use device_registry_sdk::{
    ArchSynonyms, ConfigPhase, ConfigState, DeviceIdentity, PersistedDevice, Service,
    ServiceCandidate, now_epoch_secs, resolve_service,
};
use modkit_utils::SecretString;

use crate::config::DeviceRegistryConfig;
use crate::domain::credentials::CredentialValidator;
use crate::domain::device_store::{DeviceStore, Registration};
use crate::domain::error::DomainError;

/// Service for registering the local device and configuring its services
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<DeviceStore>,
    validator: Arc<dyn CredentialValidator>,
    synonyms: Arc<ArchSynonyms>,
    credential_validity: Duration,
    allow_reregistration: bool,
}

impl RegistrationService {
    #[must_use]
    pub fn new(config: &DeviceRegistryConfig, validator: Arc<dyn CredentialValidator>) -> Self {
        Self {
            store: Arc::new(DeviceStore::new()),
            validator,
            synonyms: Arc::new(config.arch_table()),
            credential_validity: config.credential_validity,
            allow_reregistration: config.allow_reregistration,
        }
    }

    /// Register the device and move it to `configuring`.
    ///
    /// Registering again with the same id re-enters `configuring` from
    /// `configured` (when allowed) and replaces the token; the existing
    /// service descriptors are kept.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Model`] if the request lacks `id`, `organization` or a
    ///   token, or the current phase cannot move to `configuring`
    /// - [`DomainError::AlreadyRegistered`] if a different device is
    ///   registered, or re-registration is disabled
    pub fn register(&self, request: &DeviceIdentity) -> Result<DeviceIdentity, DomainError> {
        request.validate_registration()?;
        let id = request.id.clone().unwrap_or_default();
        let org = request.org.clone().unwrap_or_default();
        let token = request
            .token
            .clone()
            .ok_or_else(|| DomainError::Internal("validated request has no token".to_owned()))?;

        let record = self.store.update(|slot| match slot {
            Some(existing) if existing.record.id != id || !self.allow_reregistration => {
                Err(DomainError::AlreadyRegistered(existing.record.id.clone()))
            }
            Some(existing) => {
                let config = existing.record.config.transition_to(ConfigPhase::Configuring)?;
                existing.record = new_record(request, id.clone(), org.clone(), token, config);
                existing.generation = self.store.next_generation();
                Ok(existing.record.clone())
            }
            None => {
                let config = ConfigState::new().transition_to(ConfigPhase::Configuring)?;
                let registration = Registration {
                    record: new_record(request, id.clone(), org.clone(), token, config),
                    services: Vec::new(),
                    generation: self.store.next_generation(),
                };
                let record = registration.record.clone();
                *slot = Some(registration);
                Ok(record)
            }
        });

        match &record {
            Ok(r) => tracing::info!(
                device_id = %r.id,
                org = %r.org,
                pattern = %r.pattern,
                "Device registered, configuring"
            ),
            Err(e) => tracing::warn!(device_id = %id, error = %e, "Device registration rejected"),
        }

        record.map(|r| DeviceIdentity::from_persisted(&r))
    }

    /// API view of the registered device.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DeviceNotRegistered`] if no device is registered.
    pub fn device(&self) -> Result<DeviceIdentity, DomainError> {
        self.store
            .record()
            .map(|r| DeviceIdentity::from_persisted(&r))
            .ok_or(DomainError::DeviceNotRegistered)
    }

    /// Move the device to `target`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::DeviceNotRegistered`] if no device is registered
    /// - [`DomainError::NotConfigurable`] for `configured -> configuring`
    ///   when re-registration is disabled
    /// - [`DomainError::Model`] if the state machine has no such edge
    pub fn transition(&self, target: ConfigPhase) -> Result<DeviceIdentity, DomainError> {
        let record = self
            .store
            .update_registered(|reg| {
                let from = reg.record.config.phase();
                if from == ConfigPhase::Configured
                    && target == ConfigPhase::Configuring
                    && !self.allow_reregistration
                {
                    return Err(DomainError::NotConfigurable { state: from });
                }
                reg.record.config = reg.record.config.transition_to(target)?;
                tracing::info!(
                    device_id = %reg.record.id,
                    %from,
                    to = %target,
                    "Device state changed"
                );
                Ok(reg.record.clone())
            })
            .ok_or(DomainError::DeviceNotRegistered)??;
        Ok(DeviceIdentity::from_persisted(&record))
    }

    /// Add a service descriptor. Unset upgrade flags take their defaults.
    ///
    /// # Errors
    ///
    /// - [`DomainError::DeviceNotRegistered`] if no device is registered
    /// - [`DomainError::NotConfigurable`] unless the device is `configuring`
    /// - [`DomainError::Model`] if the descriptor is invalid
    pub fn add_service(&self, service: Service) -> Result<(), DomainError> {
        service.validate()?;
        let service = service.with_defaults();

        self.store
            .update_registered(|reg| {
                let state = reg.record.config.phase();
                if state != ConfigPhase::Configuring {
                    return Err(DomainError::NotConfigurable { state });
                }
                tracing::debug!(
                    device_id = %reg.record.id,
                    url = service.url.as_deref().unwrap_or_default(),
                    org = service.org.as_deref().unwrap_or_default(),
                    version_range = service.version_range.as_deref().unwrap_or_default(),
                    "Service configured"
                );
                reg.services.push(service);
                Ok(())
            })
            .ok_or(DomainError::DeviceNotRegistered)?
    }

    /// Configured service descriptors, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DeviceNotRegistered`] if no device is registered.
    pub fn services(&self) -> Result<Vec<Service>, DomainError> {
        self.store.services().ok_or(DomainError::DeviceNotRegistered)
    }

    /// Find the descriptor configuring `candidate`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::DeviceNotRegistered`] if no device is registered
    /// - [`DomainError::Model`] on ambiguous configuration or malformed input
    pub fn resolve(&self, candidate: &ServiceCandidate) -> Result<Option<Service>, DomainError> {
        let services = self.services()?;
        let found = resolve_service(&services, candidate, &self.synonyms)?;
        Ok(found.cloned())
    }

    /// Validate the device token and record the outcome.
    ///
    /// A token validated within the configured validity window is not checked
    /// again. The validator runs without holding the store lock; its result is
    /// dropped if the device was unregistered or registered again meanwhile.
    ///
    /// # Errors
    ///
    /// - [`DomainError::DeviceNotRegistered`] if no device is registered, or it
    ///   changed while validating
    /// - [`DomainError::CredentialValidationFailed`] if the validator failed
    pub async fn validate_credentials(&self) -> Result<DeviceIdentity, DomainError> {
        let (record, generation) = self
            .store
            .record_with_generation()
            .ok_or(DomainError::DeviceNotRegistered)?;
        let now = now_epoch_secs();

        if record.token_valid
            && now.saturating_sub(record.token_last_valid_time) < self.credential_validity.as_secs()
        {
            tracing::debug!(device_id = %record.id, "Credentials still within validity window");
            return Ok(DeviceIdentity::from_persisted(&record));
        }

        let valid = self
            .validator
            .validate(&record.id, &record.org, &record.token)
            .await
            .map_err(|e| {
                tracing::warn!(device_id = %record.id, error = %e, "Credential validation failed");
                DomainError::CredentialValidationFailed(e.to_string())
            })?;

        let updated = self
            .store
            .update_registered(|reg| {
                if reg.generation != generation {
                    return None;
                }
                reg.record.token_valid = valid;
                if valid {
                    reg.record.token_last_valid_time =
                        reg.record.token_last_valid_time.max(now_epoch_secs());
                }
                Some(reg.record.clone())
            })
            .flatten()
            .ok_or(DomainError::DeviceNotRegistered)?;

        if valid {
            tracing::info!(device_id = %updated.id, "Device credentials validated");
        } else {
            tracing::warn!(device_id = %updated.id, "Device credentials rejected");
        }
        Ok(DeviceIdentity::from_persisted(&updated))
    }

    /// Remove the registration and its services.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DeviceNotRegistered`] if no device is registered.
    pub fn unregister(&self) -> Result<DeviceIdentity, DomainError> {
        let reg = self.store.take().ok_or(DomainError::DeviceNotRegistered)?;
        tracing::info!(
            device_id = %reg.record.id,
            services = reg.services.len(),
            "Device unregistered"
        );
        Ok(DeviceIdentity::from_persisted(&reg.record))
    }
}

fn new_record(
    request: &DeviceIdentity,
    id: String,
    org: String,
    token: SecretString,
    config: ConfigState,
) -> PersistedDevice {
    PersistedDevice {
        id,
        org,
        pattern: request.pattern.clone().unwrap_or_default(),
        name: request.name.clone().unwrap_or_default(),
        token,
        token_last_valid_time: 0,
        token_valid: false,
        ha: request.ha.unwrap_or(false),
        config,
    }
}
