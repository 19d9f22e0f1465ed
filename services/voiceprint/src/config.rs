use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration for the voiceprint service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Voiceprint storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Voiceprint file storage and upload limits
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory; files land at `{root_dir}/{device_id}/{file_name}`
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Maximum accepted upload size in bytes (10MB default)
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    /// Accepted upload content types, compared case-insensitively
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    /// How many generated file names to try before giving up on collisions
    #[serde(default = "default_max_name_attempts")]
    pub max_name_attempts: u32,
}

// Default value functions
fn default_service_name() -> String {
    "voiceprint-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("/data/voiceprints")
}

fn default_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_content_types() -> Vec<String> {
    [
        "audio/wav",
        "audio/mp3",
        "audio/mpeg",
        "audio/ogg",
        "audio/flac",
        "audio/aac",
        "audio/m4a",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

fn default_max_name_attempts() -> u32 {
    5
}

/// Environment variable prefix: VOICEPRINT__STORAGE__ROOT_DIR -> storage.root_dir
const ENV_PREFIX: &str = "VOICEPRINT";

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = Self::defaults()?
            // Add config file if present
            .add_source(config::File::with_name("config/voiceprint").required(false))
            .add_source(config::File::with_name("/etc/nier/voiceprint").required(false))
            // Override with environment variables
            .add_source(environment(ENV_PREFIX));

        Self::from_builder(builder)
    }

    /// Builder seeded with default values, before any file or env source
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("service.name", "voiceprint-service")?
            .set_default("service.log_level", "info")
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        builder.build()?.try_deserialize().map_err(Into::into)
    }
}

/// Environment source; `allowed_content_types` is read as a comma-separated list
fn environment(prefix: &str) -> config::Environment {
    config::Environment::with_prefix(prefix)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("storage.allowed_content_types")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            max_file_size_bytes: default_max_file_size_bytes(),
            allowed_content_types: default_allowed_content_types(),
            max_name_attempts: default_max_name_attempts(),
        }
    }
}

impl StorageConfig {
    /// Storage configuration rooted at `root_dir` with default limits
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }
}
