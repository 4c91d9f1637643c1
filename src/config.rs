//! Configuration file support.
//!
//! Application settings live in a versioned JSON file under the user's
//! config directory. Project-specific state is kept separately in each
//! project's `project.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PROJECT_NAME;

/// Verbosity of the `log` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Errors and warnings
    Warn,
    /// Adds export summaries and project events
    #[default]
    Info,
    /// Adds per-file details
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Levels ordered from quietest to loudest.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Matching `log` filter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// One step more verbose, saturating at `Trace`.
    pub fn more_verbose(&self) -> LogLevel {
        let all = Self::all();
        let index = all.iter().position(|l| l == self).unwrap_or(0);
        all[(index + 1).min(all.len() - 1)]
    }
}

/// Version written to new config files. Files with a higher version are
/// rejected.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// File format version
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,
}

/// The `preferences` object of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Directory holding all projects
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,

    /// Output directory used when an export names none
    #[serde(default)]
    pub export_folder: String,

    /// Project name used for exports that don't name one
    #[serde(default = "default_project_name")]
    pub default_project_name: String,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_projects_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("labelai-projects"))
        .unwrap_or_else(|| PathBuf::from("projects"))
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            export_folder: String::new(),
            default_project_name: default_project_name(),
            log_level: LogLevel::default(),
        }
    }
}

impl AppConfig {
    /// Default configuration at the current version.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "labelai-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("labelai").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("labelai")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Configuration from [`default_path`](Self::default_path), or `None`
    /// when it is missing or invalid.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                Some(config)
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Write to [`default_path`](Self::default_path).
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Config file load and save errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let mut config = AppConfig::new();
        config.preferences.log_level = LogLevel::Debug;
        config.preferences.export_folder = "/tmp/exports".into();

        let json = config.to_json().unwrap();
        let loaded = AppConfig::from_json(&json).unwrap();

        assert_eq!(loaded.version, CONFIG_VERSION);
        assert_eq!(loaded.preferences.log_level, LogLevel::Debug);
        assert_eq!(loaded.preferences.export_folder, "/tmp/exports");
        assert_eq!(loaded.preferences.default_project_name, DEFAULT_PROJECT_NAME);
    }

    #[test]
    fn test_missing_preferences_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(config.preferences.log_level, LogLevel::Info);
        assert_eq!(config.preferences.default_project_name, "dataset_export");
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        let result = AppConfig::from_json(&json);
        assert!(matches!(result, Err(ConfigError::VersionTooNew { .. })));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            AppConfig::from_json("not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_log_level_filters() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Info.more_verbose(), LogLevel::Debug);
        assert_eq!(LogLevel::Trace.more_verbose(), LogLevel::Trace);
        let json = serde_json::to_string(&LogLevel::Trace).unwrap();
        assert_eq!(json, "\"trace\"");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AppConfig::default_filename());
        AppConfig::new().to_json().map(|j| std::fs::write(&path, j)).unwrap().unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.version, CONFIG_VERSION);
    }
}
