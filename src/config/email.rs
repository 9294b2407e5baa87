//! Email delivery webhook configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use super::payment::validate_webhook_secret;

/// Email provider settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailConfig {
    /// Shared secret for `Delivery-Signature` verification
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.webhook_secret.is_some()
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        validate_webhook_secret("email.webhook_secret", &self.webhook_secret, production)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_names_email_section() {
        assert!(matches!(
            EmailConfig::default().validate(true),
            Err(ValidationError::MissingRequired("email.webhook_secret"))
        ));
    }

    #[test]
    fn test_configured_secret_validates() {
        let config = EmailConfig {
            webhook_secret: Some(SecretString::new("email-signing-secret".to_string())),
        };
        assert!(config.is_configured());
        assert!(config.validate(true).is_ok());
    }
}
