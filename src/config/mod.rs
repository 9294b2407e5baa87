//! Application configuration module
//!
//! Configuration is read from environment variables with the `GUIDE_LEDGER`
//! prefix, using `__` between nested keys. A `.env` file is honored in
//! development.
//!
//! # Example
//!
//! ```no_run
//! use guide_ledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod decay;
mod email;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use decay::DecayConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Payment webhook settings
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Email delivery webhook settings
    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub decay: DecayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `GUIDE_LEDGER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `GUIDE_LEDGER__PAYMENT__WEBHOOK_SECRET=...` -> `payment.webhook_secret`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or a value
    /// cannot be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GUIDE_LEDGER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Webhook secrets are only mandatory in production. Elsewhere a missing
    /// secret leaves that endpoint refusing deliveries.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate(production)?;
        self.email.validate(production)?;
        self.decay.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
