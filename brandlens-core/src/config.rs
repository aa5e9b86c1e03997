//! Provider configuration
//!
//! Built once at startup and passed explicitly into each endpoint adapter;
//! nothing in the pipeline reads the environment after construction.

use crate::error::BrandLensError;
use crate::provider::Provider;

/// Credentials and model selection for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Read the provider's API key from the environment (first matching
    /// variable wins) and pair it with the provider's default model.
    pub fn from_env(provider: Provider) -> Result<Self, BrandLensError> {
        let api_key = provider
            .env_keys()
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                BrandLensError::config(format!(
                    "{} not set; export an API key for {}",
                    provider.env_keys().join(" / "),
                    provider
                ))
            })?;

        Ok(Self::new(api_key, provider.default_model()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model_overrides_default() {
        let config = ProviderConfig::new("sk-test", "gpt-5-mini").with_model("gpt-5");
        assert_eq!(config.model, "gpt-5");
        assert_eq!(config.api_key, "sk-test");
    }
}
