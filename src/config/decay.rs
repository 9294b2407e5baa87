//! Credit decay sweep configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Settings for the background decay sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct DecayConfig {
    /// Run the sweep inside this process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl DecayConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(60..=86_400).contains(&self.sweep_interval_secs) {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    900
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecayConfig::default();
        assert!(config.enabled);
        assert_eq!(config.sweep_interval(), Duration::from_secs(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interval_bounds() {
        let too_fast = DecayConfig {
            sweep_interval_secs: 5,
            ..Default::default()
        };
        assert!(too_fast.validate().is_err());

        let too_slow = DecayConfig {
            sweep_interval_secs: 172_800,
            ..Default::default()
        };
        assert!(too_slow.validate().is_err());
    }
}
