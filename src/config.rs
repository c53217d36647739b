//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Onboarding flow configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// How long the username input must stay unchanged before an
    /// availability lookup fires.
    pub handle_debounce: Duration,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            handle_debounce: Duration::from_millis(300),
        }
    }
}

/// Identity/profile backend connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Publishable API key sent with every request.
    pub api_key: SecretString,
}

impl BackendConfig {
    /// Build from `KEWIT_BACKEND_URL` and `KEWIT_BACKEND_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("KEWIT_BACKEND_URL")
            .map_err(|_| ConfigError::MissingEnvVar("KEWIT_BACKEND_URL".to_string()))?;
        let api_key = std::env::var("KEWIT_BACKEND_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("KEWIT_BACKEND_KEY".to_string()))?;

        if base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "KEWIT_BACKEND_URL".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_debounce_is_300ms() {
        let config = OnboardingConfig::default();
        assert_eq!(config.handle_debounce, Duration::from_millis(300));
    }
}
