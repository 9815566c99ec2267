use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{SmaError, SmaResult};
use crate::logging::{LogConfig, LogLevel};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// File name used when no path is configured
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub log_level: LogLevel,
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(default_config_path())
    }
}

impl AppConfig {
    /// Create configuration for an explicit state file
    pub fn new<P: Into<PathBuf>>(config_path: P) -> Self {
        Self {
            config_path: config_path.into(),
            log_level: LogLevel::Info,
            json_logs: false,
        }
    }

    /// Resolve configuration from the environment.
    ///
    /// A `.env` file in the working directory is honoured before reading
    /// `CONFIG_PATH`. `explicit` (e.g. a CLI flag) wins over both.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        dotenv::dotenv().ok();
        let from_env = env::var(CONFIG_PATH_ENV).ok();
        Self::new(resolve_config_path(explicit, from_env))
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig::new(self.log_level).json_format(self.json_logs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> SmaResult<()> {
        if self.config_path.as_os_str().is_empty() {
            return Err(SmaError::ConfigError("config path cannot be empty".to_string()));
        }

        if self.config_path.is_dir() {
            return Err(SmaError::ConfigError(format!(
                "config path {} is a directory",
                self.config_path.display()
            )));
        }

        Ok(())
    }
}

/// Pick the state file: explicit path, then the environment value, then the
/// platform config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>, from_env: Option<String>) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return path;
    }

    match from_env {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => default_config_path(),
    }
}

/// Platform config dir (e.g. `~/.config/sma/config.json`), or the working
/// directory when no home directory is known.
pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("", "", "sma") {
        Some(dirs) => dirs.config_dir().join(DEFAULT_CONFIG_FILE),
        None => Path::new(DEFAULT_CONFIG_FILE).to_path_buf(),
    }
}
