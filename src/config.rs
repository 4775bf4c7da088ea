//! Configuration loading and management for textsummary.
//!
//! Tunables come from an optional `textsummary.toml`; the endpoint, key and
//! deployment names come from the environment (optionally seeded from `.env`).

use crate::stats::Pricing;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_ENDPOINT: &str = "AZURE_OAI_ENDPOINT";
pub const ENV_KEY: &str = "AZURE_OAI_KEY";
pub const ENV_DEPLOYMENT: &str = "AZURE_OAI_DEPLOYMENT";
pub const ENV_DEPLOYMENT_PREMIUM: &str = "AZURE_OAI_DEPLOYMENT_GPT4";
pub const ENV_API_VERSION: &str = "AZURE_OAI_API_VERSION";

const CONFIG_FILE_NAME: &str = "textsummary.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read system message from {}: {source}", path.display())]
    SystemMessage {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Standard or premium model deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelTier {
    #[default]
    Standard,
    Premium,
}

impl ModelTier {
    pub fn from_flag(premium: bool) -> Self {
        if premium {
            ModelTier::Premium
        } else {
            ModelTier::Standard
        }
    }

    /// Environment variable holding this tier's deployment name
    pub fn deployment_var(self) -> &'static str {
        match self {
            ModelTier::Standard => ENV_DEPLOYMENT,
            ModelTier::Premium => ENV_DEPLOYMENT_PREMIUM,
        }
    }
}

/// Per-tier pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_standard_pricing")]
    pub standard: Pricing,
    #[serde(default = "default_premium_pricing")]
    pub premium: Pricing,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            standard: default_standard_pricing(),
            premium: default_premium_pricing(),
        }
    }
}

impl PricingConfig {
    pub fn for_tier(&self, tier: ModelTier) -> Pricing {
        match tier {
            ModelTier::Standard => self.standard,
            ModelTier::Premium => self.premium,
        }
    }
}

/// Contents of `textsummary.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the system instruction template
    pub system_message: PathBuf,
    /// Azure OpenAI REST API version
    pub api_version: String,
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Inputs longer than this many characters are rejected before sending
    pub max_input_chars: usize,
    /// HTTP timeout in seconds; unset means wait indefinitely
    pub timeout_secs: Option<u64>,
    pub pricing: PricingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_message: PathBuf::from("system_message.txt"),
            api_version: "2024-02-15-preview".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            max_input_chars: 200_000,
            timeout_secs: None,
            pricing: PricingConfig::default(),
        }
    }
}

fn default_standard_pricing() -> Pricing {
    Pricing::Tiered {
        input_per_1k: 0.003,
        output_per_1k: 0.004,
    }
}

fn default_premium_pricing() -> Pricing {
    Pricing::Tiered {
        input_per_1k: 0.06,
        output_per_1k: 0.12,
    }
}

impl Settings {
    /// Load settings from an explicit path, or from the default locations.
    ///
    /// An explicit path must exist; the default locations fall back to
    /// built-in defaults when no file is present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from(path),
            None => match Self::find_config_file() {
                Some(path) => Self::load_from(&path),
                None => {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::home_dir()
            .map(|home| {
                home.join(".config")
                    .join("textsummary")
                    .join(CONFIG_FILE_NAME)
            })
            .filter(|path| path.exists())
    }
}

/// Everything a single run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub tier: ModelTier,
    pub show_stats: bool,
    pub temperature: f32,
    pub max_tokens: u32,
    pub pricing: Pricing,
    pub max_input_chars: usize,
    pub system_message: PathBuf,
    pub timeout: Option<Duration>,
}

/// Command-line choices that feed into [`RunConfig`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    pub premium: bool,
    pub stats: bool,
    pub max_tokens: Option<u32>,
}

impl RunConfig {
    /// Resolve from the process environment
    pub fn from_env(settings: &Settings, flags: Flags) -> Result<Self, ConfigError> {
        Self::resolve(settings, flags, |name| std::env::var(name).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    ///
    /// Only the deployment variable of the selected tier is required.
    pub fn resolve<F>(settings: &Settings, flags: Flags, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let tier = ModelTier::from_flag(flags.premium);
        let endpoint = require(ENV_ENDPOINT)?;
        let api_key = require(ENV_KEY)?;
        let deployment = require(tier.deployment_var())?;
        let api_version = lookup(ENV_API_VERSION)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| settings.api_version.clone());

        Ok(Self {
            endpoint,
            api_key,
            deployment,
            api_version,
            tier,
            show_stats: flags.stats,
            temperature: settings.temperature,
            max_tokens: flags.max_tokens.unwrap_or(settings.max_tokens),
            pricing: settings.pricing.for_tier(tier),
            max_input_chars: settings.max_input_chars,
            system_message: settings.system_message.clone(),
            timeout: settings.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Read the system instruction template
    pub fn load_system_message(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.system_message).map_err(|source| {
            ConfigError::SystemMessage {
                path: self.system_message.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            (ENV_ENDPOINT, "https://example.openai.azure.com/"),
            (ENV_KEY, "secret"),
            (ENV_DEPLOYMENT, "gpt35"),
            (ENV_DEPLOYMENT_PREMIUM, "gpt4"),
        ])
    }

    #[test]
    fn standard_tier_uses_standard_deployment_and_pricing() {
        let vars = full_env();
        let config = RunConfig::resolve(&Settings::default(), Flags::default(), |k| {
            vars.get(k).cloned()
        })
        .unwrap();

        assert_eq!(config.deployment, "gpt35");
        assert_eq!(config.tier, ModelTier::Standard);
        assert_eq!(config.pricing, default_standard_pricing());
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.api_version, "2024-02-15-preview");
    }

    #[test]
    fn premium_flag_selects_premium_deployment_and_pricing() {
        let vars = full_env();
        let flags = Flags {
            premium: true,
            ..Flags::default()
        };
        let config =
            RunConfig::resolve(&Settings::default(), flags, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.deployment, "gpt4");
        assert_eq!(config.pricing, default_premium_pricing());
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let mut vars = full_env();
        vars.remove(ENV_KEY);
        let err = RunConfig::resolve(&Settings::default(), Flags::default(), |k| {
            vars.get(k).cloned()
        })
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingVar(ENV_KEY)));
    }

    #[test]
    fn premium_deployment_only_required_for_premium_tier() {
        let mut vars = full_env();
        vars.remove(ENV_DEPLOYMENT_PREMIUM);

        assert!(RunConfig::resolve(&Settings::default(), Flags::default(), |k| {
            vars.get(k).cloned()
        })
        .is_ok());

        let flags = Flags {
            premium: true,
            ..Flags::default()
        };
        let err =
            RunConfig::resolve(&Settings::default(), flags, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_DEPLOYMENT_PREMIUM)));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = full_env();
        vars.insert(ENV_ENDPOINT.to_string(), "   ".to_string());
        let err = RunConfig::resolve(&Settings::default(), Flags::default(), |k| {
            vars.get(k).cloned()
        })
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingVar(ENV_ENDPOINT)));
    }

    #[test]
    fn max_tokens_flag_overrides_settings() {
        let vars = full_env();
        let flags = Flags {
            max_tokens: Some(400),
            ..Flags::default()
        };
        let config =
            RunConfig::resolve(&Settings::default(), flags, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.max_tokens, 400);
    }

    #[test]
    fn api_version_env_overrides_settings() {
        let mut vars = full_env();
        vars.insert(ENV_API_VERSION.to_string(), "2024-06-01".to_string());
        let config = RunConfig::resolve(&Settings::default(), Flags::default(), |k| {
            vars.get(k).cloned()
        })
        .unwrap();

        assert_eq!(config.api_version, "2024-06-01");
    }

    #[test]
    fn partial_settings_file_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            max_tokens = 400
            timeout_secs = 30

            [pricing.standard]
            model = "blended"
            per_1k = 0.002
            "#,
        )
        .unwrap();

        assert_eq!(settings.max_tokens, 400);
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.timeout_secs, Some(30));
        assert_eq!(settings.pricing.standard, Pricing::Blended { per_1k: 0.002 });
        assert_eq!(settings.pricing.premium, default_premium_pricing());
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/textsummary.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn malformed_settings_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textsummary.toml");
        std::fs::write(&path, "max_tokens = \"lots\"").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unreadable_settings_path_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = Settings::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn missing_system_message_is_reported_with_path() {
        let vars = full_env();
        let settings = Settings {
            system_message: PathBuf::from("/nonexistent/system_message.txt"),
            ..Settings::default()
        };
        let config =
            RunConfig::resolve(&settings, Flags::default(), |k| vars.get(k).cloned()).unwrap();

        let err = config.load_system_message().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/system_message.txt"));
    }
}
