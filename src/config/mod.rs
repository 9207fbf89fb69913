// Required external crates for configuration management and serialization
use serde::Deserialize;
use std::path::{Path, PathBuf};
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};

/// Prefix for environment overrides, e.g. `MODELHUB_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "MODELHUB";

/// Which backing store holds the registry
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile, lost on exit
    Memory,
    /// One directory per model under `storage.directory`
    Filesystem,
}

/// Configuration for the HTTP server
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port number to listen on
    pub port: u16,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Maximum request body size for uploads, in bytes
    pub max_upload_bytes: usize,
}

/// Configuration for the model store
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory used by the filesystem backend
    pub directory: PathBuf,
}

/// Configuration for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Optional directory for daily rolling log files
    pub file: Option<PathBuf>,
}

/// Main settings struct that contains all configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Settings {
    /// Loads settings in the following order of precedence (highest to lowest):
    /// 1. Command line overrides
    /// 2. `PORT`, then environment variables prefixed with `MODELHUB_`
    /// 3. Local config file (`local.toml`) if present
    /// 4. Default config file (`default.toml`) if present
    /// 5. Built-in defaults
    pub fn load(config_dir: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::build(config_dir, overrides, true)
    }

    fn build(config_dir: &Path, overrides: &Overrides, with_env: bool) -> Result<Self, ConfigError> {
        let default_config = config_dir.join("default.toml");
        let local_config = config_dir.join("local.toml");

        let mut builder = Self::defaults()?
            .add_source(File::from(default_config).required(false))
            .add_source(File::from(local_config).required(false));

        if with_env {
            builder = builder
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator("_")
                        .separator("__")
                        .list_separator(",")
                        .with_list_parse_key("server.cors_origins")
                        .try_parsing(true),
                )
                .set_override_option("server.port", std::env::var("PORT").ok())?;
        }

        let settings = builder
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("storage.backend", overrides.backend.clone())?
            .set_override_option(
                "storage.directory",
                overrides.storage_dir.as_ref().map(|p| p.to_string_lossy().to_string()),
            )?
            .set_override_option("logging.level", overrides.log_level.clone())?
            .build()?
            .try_deserialize::<Settings>()?;

        // Validate settings after loading
        settings.validate()?;

        Ok(settings)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4000)?
            .set_default("server.cors_origins", Vec::<String>::new())?
            .set_default("server.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.directory", "uploads")?
            .set_default("logging.level", "info")
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Port must be between 1 and 65535, got: 0".to_string()));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "max_upload_bytes must be greater than 0".to_string()
            ));
        }

        // Validate logging level
        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigError::Message(
                format!("Invalid logging level: {}. Must be one of: error, warn, info, debug, trace",
                    self.logging.level)
            )),
        }?;

        // Create the storage directory if the filesystem backend needs it
        if self.storage.backend == StorageBackend::Filesystem && !self.storage.directory.exists() {
            std::fs::create_dir_all(&self.storage.directory).map_err(|e| {
                ConfigError::Message(format!(
                    "Failed to create storage directory at {}: {}",
                    self.storage.directory.display(), e
                ))
            })?;
        }

        // Create log directory if configured and doesn't exist
        if let Some(log_dir) = &self.logging.file {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir).map_err(|e| {
                    ConfigError::Message(format!(
                        "Failed to create log directory at {}: {}",
                        log_dir.display(), e
                    ))
                })?;
            }
        }

        Ok(())
    }
}
