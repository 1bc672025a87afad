//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::RoyaleClientConfig;
use crate::ingest::IngestConfig;
use crate::storage::StorageConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Environment variable {0} is not set")]
    MissingToken(String),
}

/// Game API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Clan search: minimum member count
    #[serde(default = "default_clan_min_members")]
    pub clan_min_members: u32,

    /// Clan search: page size
    #[serde(default = "default_clan_limit")]
    pub clan_limit: u32,
}

fn default_base_url() -> String {
    "https://api.clashroyale.com/v1".to_string()
}

fn default_token_env() -> String {
    "API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_clan_min_members() -> u32 {
    10
}

fn default_clan_limit() -> u32 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_seconds: default_timeout(),
            clan_min_members: default_clan_min_members(),
            clan_limit: default_clan_limit(),
        }
    }
}

impl ApiConfig {
    /// Client configuration, with the token read from `token_env`.
    pub fn client_config(&self) -> Result<RoyaleClientConfig, ConfigError> {
        let token = std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.token_env.clone()))?;

        Ok(RoyaleClientConfig {
            base_url: self.base_url.clone(),
            token,
            timeout: Duration::from_secs(self.timeout_seconds),
            clan_min_members: self.clan_min_members,
            clan_limit: self.clan_limit,
        })
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Clan names to search for
    #[serde(default)]
    pub clans: Vec<String>,

    /// Players ingested at the same time
    #[serde(default = "default_player_concurrency")]
    pub player_concurrency: usize,
}

fn default_player_concurrency() -> usize {
    4
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            clans: Vec::new(),
            player_concurrency: default_player_concurrency(),
        }
    }
}

impl IngestSettings {
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            clans: self.clans.clone(),
            player_concurrency: self.player_concurrency,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub ingest: IngestSettings,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            api: ApiConfig::default(),
            ingest: IngestSettings::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if self.api.clan_limit == 0 {
            return Err(ConfigError::ValidationError(
                "Clan search limit must be greater than 0".to_string(),
            ));
        }

        if self.ingest.player_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "Player concurrency must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.api.base_url, "https://api.clashroyale.com/v1");
        assert_eq!(config.api.token_env, "API_KEY");
        assert_eq!(config.ingest.player_concurrency, 4);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_clan_search_defaults() {
        let api = ApiConfig::default();
        assert_eq!(api.clan_min_members, 10);
        assert_eq!(api.clan_limit, 10);
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_concurrency() {
        let mut config = AppConfig::default();
        config.ingest.player_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            data_dir = "/var/lib/royale"

            [ingest]
            clans = ["Kings", "Nova EG"]
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/royale"));
        assert_eq!(config.ingest.clans, vec!["Kings", "Nova EG"]);
        assert_eq!(config.ingest.player_concurrency, 4);
        assert_eq!(config.api.clan_limit, 10);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_file_without_ingest_section_is_valid() {
        let config: AppConfig = toml::from_str("log_level = \"debug\"\n").unwrap();
        assert_eq!(config.ingest.player_concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&temp_dir.path().join("none.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_token_env() {
        let api = ApiConfig {
            token_env: "ROYALE_META_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            api.client_config(),
            Err(ConfigError::MissingToken(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.api.clan_limit, parsed.api.clan_limit);
    }
}
