//! Layered configuration for schemactl.
//!
//! Resolution order, lowest to highest precedence:
//! - built-in defaults
//! - TOML configuration file (`.schemactl/settings.toml` or `--config`)
//! - environment variable overrides
//! - CLI argument overrides (applied by the commands themselves)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SCHEMACTL_` and use
//! double underscores to separate nested levels:
//! - `SCHEMACTL_REGISTRY__ENDPOINT` sets `registry.endpoint`
//! - `SCHEMACTL_REGISTRY__ACCESS_TOKEN` sets `registry.access_token`
//! - `SCHEMACTL_USAGE__PERIOD_DAYS=30` sets `usage.period_days`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::usage::UsageValidationConfig;

/// Default config file location, relative to the working directory.
pub const CONFIG_FILE: &str = ".schemactl/settings.toml";

/// Registry endpoint used when neither flag, env var, nor config file
/// provides one.
pub const DEFAULT_REGISTRY_ENDPOINT: &str = "https://registry.schemactl.dev/api";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Registry connection settings
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Usage-safety decision parameters
    #[serde(default)]
    pub usage: UsageValidationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistrySettings {
    /// Registry API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Registry access token. Usually supplied through the environment
    /// rather than the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_token: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_endpoint() -> String {
    DEFAULT_REGISTRY_ENDPOINT.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            registry: RegistrySettings::default(),
            usage: UsageValidationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings with the full layering applied.
    pub fn load(custom_path: Option<&Path>) -> Result<Self, figment::Error> {
        let config_path = custom_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SCHEMACTL_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.registry.endpoint, DEFAULT_REGISTRY_ENDPOINT);
        assert!(settings.registry.access_token.is_none());
        assert_eq!(settings.usage.period_days, 7);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[registry]\nendpoint = \"https://registry.internal/api\"\n\n[usage]\nperiod_days = 30\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.registry.endpoint, "https://registry.internal/api");
        assert_eq!(settings.usage.period_days, 30);
        // Untouched sections keep their defaults.
        assert_eq!(settings.usage.top_operations_limit, 10);
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings::default();
        let rendered = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.registry.endpoint, settings.registry.endpoint);
    }
}
