//! CLI configuration management.

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::{Error, Result};
use tessera_licensing::{KeyRing, Policy, VerifyKey};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "TESSERA_CONFIG";

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Trusted verify keys (base64 or hex).
    #[serde(default)]
    pub trusted_keys: Vec<String>,
    /// Product licenses must be issued for.
    pub product: Option<String>,
    /// Tolerated clock skew when checking the validity window.
    #[serde(default)]
    pub clock_skew_seconds: u32,
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl CliConfig {
    /// Load configuration from the default location.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(serde_yaml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let dirs = directories::ProjectDirs::from("dev", "tessera", "tessera")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "trusted_key" => {
                let key = VerifyKey::parse(value)?;
                let encoded = key.to_base64();
                if !self.trusted_keys.contains(&encoded) {
                    self.trusted_keys.push(encoded);
                }
            }
            "product" => self.product = Some(value.to_string()),
            "clock_skew_seconds" => {
                self.clock_skew_seconds = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid clock skew: {}", value)))?;
            }
            "output_format" => {
                self.output_format = OutputFormat::from_str(value, true)
                    .map_err(|_| Error::Config(format!("Invalid output format: {}", value)))?;
            }
            _ => return Err(Error::Config(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }

    /// Trusted keys: explicit flags win over the configured list.
    pub fn keyring(&self, overrides: &[String]) -> Result<KeyRing> {
        if overrides.is_empty() {
            KeyRing::from_encoded(&self.trusted_keys)
        } else {
            KeyRing::from_encoded(overrides)
        }
    }

    /// Base policy from configuration.
    pub fn policy(&self) -> Policy {
        let mut policy =
            Policy::new().clock_skew(chrono::Duration::seconds(self.clock_skew_seconds.into()));
        if let Some(product) = &self.product {
            policy = policy.expect_product(product.as_str());
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_licensing::SigningKey;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_from(&dir.path().join("none.yaml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = CliConfig::default();
        config.set("product", "acme-desktop").unwrap();
        config.set("output_format", "json").unwrap();
        config.save_to(&path).unwrap();

        assert_eq!(CliConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_set_trusted_key_validates_and_dedupes() {
        let key = SigningKey::generate().verify_key();
        let mut config = CliConfig::default();

        config.set("trusted_key", &key.to_hex()).unwrap();
        config.set("trusted_key", &key.to_base64()).unwrap();
        assert_eq!(config.trusted_keys, vec![key.to_base64()]);

        assert!(matches!(
            config.set("trusted_key", "garbage"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = CliConfig::default();
        assert!(matches!(config.set("output_format", "xml"), Err(Error::Config(_))));
        assert!(matches!(config.set("clock_skew_seconds", "-3"), Err(Error::Config(_))));
        assert!(matches!(config.set("nope", "x"), Err(Error::Config(_))));
        assert_eq!(config, CliConfig::default());

        config.set("output_format", "YAML").unwrap();
        assert_eq!(config.output_format, OutputFormat::Yaml);
    }

    #[test]
    fn test_flag_keys_override_config() {
        let configured = SigningKey::generate().verify_key();
        let flagged = SigningKey::generate().verify_key();
        let config = CliConfig {
            trusted_keys: vec![configured.to_base64()],
            ..Default::default()
        };

        let ring = config.keyring(&[flagged.to_base64()]).unwrap();
        assert_eq!(ring.len(), 1);
        assert!(ring.get(flagged.id()).is_some());

        let ring = config.keyring(&[]).unwrap();
        assert!(ring.get(configured.id()).is_some());
    }
}
