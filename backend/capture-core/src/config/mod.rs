mod duration;
mod env;

pub use env::{CLIENT_DOMAIN_ENV, CLIENT_ID_ENV, CLIENT_SECRET_ENV};

use crate::credentials::ClientCredentials;
use crate::error::config::ConfigError;
use crate::{DEFAULT_API_BASE_URL, DEFAULT_USER_CENTER_BASE_URL, SDK_USER_AGENT};

use common::{ErrorLocation, RedactedSecret};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Deserializer, Serialize};

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = "capture-sdk";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_center_url")]
    pub user_center_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            user_center_url: default_user_center_url(),
        }
    }
}

/// Client registration. The secret is never written back to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing, deserialize_with = "deserialize_secret")]
    pub secret: Option<RedactedSecret>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_poll_interval", with = "duration")]
    pub poll_interval: Duration,
    #[serde(default = "default_feedback_retry_delay", with = "duration")]
    pub feedback_retry_delay: Duration,
    #[serde(default = "default_feedback_retries")]
    pub feedback_retries: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            feedback_retry_delay: default_feedback_retry_delay(),
            feedback_retries: default_feedback_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: ApiConfig::default(),
            client: ClientConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_user_center_url() -> String {
    DEFAULT_USER_CENTER_BASE_URL.to_string()
}
fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}
fn default_feedback_retry_delay() -> Duration {
    Duration::from_secs(5)
}
fn default_feedback_retries() -> u32 {
    3
}
fn default_log_level() -> String {
    "info".to_string()
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<RedactedSecret>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(RedactedSecret::new))
}

// ============================================
// IMPLEMENTATION
// ============================================

impl SdkConfig {
    /// Platform config directory: `{config_dir}/capture-sdk`.
    pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .ok_or_else(|| ConfigError::DirectoryNotFound {
                location: ErrorLocation::from(Location::caller()),
                path: PathBuf::from(CONFIG_DIR_NAME),
            })
    }

    /// Load config from {config_dir}/config.toml.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config = Self::parse(&contents).map_err(|e| match e {
            ConfigError::ParseError {
                location, reason, ..
            } => ConfigError::ParseError {
                location,
                path: config_path.clone(),
                reason,
            },
            other => other,
        })?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: SdkConfig = toml::from_str(contents).map_err(|e| {
            warn!("Failed to parse config TOML: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: PathBuf::from(CONFIG_FILE_NAME),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `config_dir`, then apply `.env` / environment overrides.
    pub fn load_with_env(config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(config_dir)?;
        env::try_load_dotenv();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Take client id/secret/domain from `CAPTURE_CLIENT_*` variables when set.
    pub fn apply_env_overrides(&mut self) {
        env::apply_overrides(self);
    }

    /// Save config to {config_dir}/config.toml using atomic write.
    ///
    /// The client secret is skipped.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, contents).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        // Atomic rename (POSIX guarantees atomicity)
        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation_error(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        validate_url("api.base_url", &self.api.base_url)?;
        validate_url("api.user_center_url", &self.api.user_center_url)?;

        if self.analysis.poll_interval.is_zero() {
            return Err(validation_error(
                "analysis.poll_interval must be greater than zero".to_string(),
            ));
        }

        if LevelFilter::from_str(&self.logging.level).is_err() {
            return Err(validation_error(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Client registration, required before any authenticated call.
    pub fn client_credentials(&self) -> Result<ClientCredentials, ConfigError> {
        let id = required(self.client.id.as_deref(), "client.id")?;
        let domain = required(self.client.domain.as_deref(), "client.domain")?;
        let secret = self
            .client
            .secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| validation_error("client.secret is required".to_string()))?;

        Ok(ClientCredentials {
            id: id.to_string(),
            secret,
            domain: domain.to_string(),
        })
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.logging.level).unwrap_or(LevelFilter::Info)
    }

    /// Shared HTTP client. No request timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .user_agent(SDK_USER_AGENT)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            })
    }
}

#[track_caller]
fn validation_error(reason: String) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason,
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(validation_error(format!("{name} is required"))),
    }
}

fn validate_url(name: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(validation_error(format!("Invalid URL format for {name}: {value}")));
    }

    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| validation_error(format!("Invalid URL for {name}: {e}")))
}
