//! Device credential validation.

use async_trait::async_trait;
use modkit_utils::SecretString;

/// Checks a device token against its issuer.
///
/// Implementations typically call out to the management hub; the registry
/// never holds its store lock across this call.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Returns `Ok(true)` when the token is currently accepted for
    /// `device_id` in `org`, and `Ok(false)` when it is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error when the validity could not be determined.
    async fn validate(&self, device_id: &str, org: &str, token: &SecretString)
    -> anyhow::Result<bool>;
}

/// Offline validator: any non-empty token is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCredentialValidator;

#[async_trait]
impl CredentialValidator for LocalCredentialValidator {
    async fn validate(
        &self,
        device_id: &str,
        _org: &str,
        token: &SecretString,
    ) -> anyhow::Result<bool> {
        if device_id.is_empty() {
            anyhow::bail!("device id is empty");
        }
        Ok(!token.is_empty())
    }
}
