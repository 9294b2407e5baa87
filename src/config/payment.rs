//! Payment webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider settings.
///
/// Only the webhook signing secret is needed; checkout sessions are created
/// elsewhere. A missing secret does not stop the service from starting, but
/// every payment delivery is then refused with a configuration error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Shared secret for `Payment-Signature` verification
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,
}

impl PaymentConfig {
    pub fn is_configured(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        validate_webhook_secret("payment.webhook_secret", &self.webhook_secret, production)
    }
}

/// Shared by every webhook source: an empty secret is never valid and a
/// missing one is only tolerated outside production.
pub(super) fn validate_webhook_secret(
    name: &'static str,
    secret: &Option<SecretString>,
    production: bool,
) -> Result<(), ValidationError> {
    match secret {
        Some(secret) if secret.expose_secret().trim().is_empty() => {
            Err(ValidationError::EmptyWebhookSecret(name))
        }
        Some(_) => Ok(()),
        None if production => Err(ValidationError::MissingRequired(name)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret(secret: &str) -> PaymentConfig {
        PaymentConfig {
            webhook_secret: Some(SecretString::new(secret.to_string())),
        }
    }

    #[test]
    fn test_missing_secret_allowed_outside_production() {
        let config = PaymentConfig::default();
        assert!(!config.is_configured());
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_missing_secret_rejected_in_production() {
        assert!(matches!(
            PaymentConfig::default().validate(true),
            Err(ValidationError::MissingRequired("payment.webhook_secret"))
        ));
    }

    #[test]
    fn test_blank_secret_rejected() {
        assert!(matches!(
            with_secret("  ").validate(false),
            Err(ValidationError::EmptyWebhookSecret(_))
        ));
    }

    #[test]
    fn test_secret_not_printed_by_debug() {
        let config = with_secret("whsec_super_secret");
        assert!(config.is_configured());
        assert!(!format!("{:?}", config).contains("whsec_super_secret"));
    }
}
