//! Configuration Loader
//!
//! Environment-aware configuration loading. Layers, lowest precedence first:
//! built-in defaults, `sellerbot.toml`, `sellerbot.{environment}.toml`, then
//! `SELLERBOT__SECTION__KEY` environment variables.

use super::error::ConfigResult;
use super::SellerbotConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ConfigManager {
    config: Arc<SellerbotConfig>,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = environment,
            backend = ?config.persistence.backend,
            max_attempts = config.execution.max_attempts,
            "⚙️ Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config: Arc::new(config),
            environment: environment.to_string(),
            config_directory,
        }))
    }

    fn load_and_merge_config(directory: &Path, environment: &str) -> ConfigResult<SellerbotConfig> {
        let base = directory.join("sellerbot.toml");
        let overlay = directory.join(format!("sellerbot.{environment}.toml"));

        let merged = Config::builder()
            .add_source(Config::try_from(&SellerbotConfig::default())?)
            .add_source(File::from(base).required(false))
            .add_source(File::from(overlay).required(false))
            .add_source(
                Environment::with_prefix("SELLERBOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(merged.try_deserialize()?)
    }

    /// Detect the current environment from `SELLERBOT_ENV`
    pub fn detect_environment() -> String {
        env::var("SELLERBOT_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("SELLERBOT_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    pub fn config(&self) -> &SellerbotConfig {
        &self.config
    }

    /// Shared handle for components that outlive the manager
    pub fn shared_config(&self) -> Arc<SellerbotConfig> {
        Arc::clone(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigurationError, PersistenceBackend};
    use crate::constants::JobType;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().join("absent")), "test")
                .unwrap();

        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().backoff.initial_backoff_ms, 500);
        assert_eq!(manager.config().persistence.backend, PersistenceBackend::Memory);
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sellerbot.toml"),
            "[backoff]\ninitial_backoff_ms = 100\nmax_backoff_ms = 800\n\n[jobs.sku_backfill]\nauto_resume_on_restart = true\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("sellerbot.staging.toml"),
            "[backoff]\ninitial_backoff_ms = 250\n",
        )
        .unwrap();

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "staging")
                .unwrap();
        let config = manager.config();

        assert_eq!(config.backoff.initial_backoff_ms, 250);
        assert_eq!(config.backoff.max_backoff_ms, 800);
        assert!(config.jobs.policy(JobType::SkuBackfill).auto_resume_on_restart);
        // untouched sections keep their defaults
        assert!(config.jobs.policy(JobType::Monitor).auto_resume_on_restart);
        assert_eq!(config.alerts.max_retained, 200);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sellerbot.toml"),
            "[persistence]\nbackend = \"file\"\n",
        )
        .unwrap();

        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingRequiredField { .. })
        ));
    }
}
