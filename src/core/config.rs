//! Process-wide defaults and per-destination options
//!
//! [`LoggerConfig`] holds the defaults a [`LogManager`](super::LogManager)
//! falls back to when a destination is registered. [`DestinationOptions`]
//! overrides any of them for one registration, and [`resolve`] merges the two
//! into the [`DestinationSettings`] a writer is built from.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::log_mode::LogMode;
use super::message_format::MessageFormat;
use crate::appenders::rotating_file::{FileHandling, FileTag};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default shutdown timeout for writer cleanup (5 seconds)
///
/// Used by `close_all` and when a manager is dropped without an explicit
/// shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages kept per unbound module before new ones are dropped
pub const DEFAULT_BACKLOG_CAPACITY: usize = 100;

/// Size at which a `Split` file is rotated (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Manager-wide defaults
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes.
///
/// # Example
///
/// ```
/// use rust_module_logger::{LoggerConfig, LogLevel};
///
/// let config = LoggerConfig::from_json_str(r#"{ "default_level": "Debug" }"#).unwrap();
/// assert_eq!(config.default_level, LogLevel::Debug);
/// assert_eq!(config.default_folder, "logs");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub default_target: String,
    pub default_folder: String,
    pub default_level: LogLevel,
    pub default_mode: LogMode,
    pub default_file_handling: FileHandling,
    pub default_file_tag: FileTag,
    pub default_message_format: MessageFormat,
    pub max_file_size: u64,
    pub backlog_capacity: usize,
    pub shutdown_timeout_ms: u64,
    pub console_colors: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default_target: "logger.log".to_string(),
            default_folder: "logs".to_string(),
            default_level: LogLevel::Info,
            default_mode: LogMode::OnlyFile,
            default_file_handling: FileHandling::Split,
            default_file_tag: FileTag::DateTime,
            default_message_format: MessageFormat::Default,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            backlog_capacity: DEFAULT_BACKLOG_CAPACITY,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64,
            console_colors: true,
        }
    }
}

impl LoggerConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "loading logger configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(LoggerError::config(
                "LoggerConfig",
                "max_file_size must be greater than zero",
            ));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(LoggerError::config(
                "LoggerConfig",
                "shutdown_timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Per-registration overrides; `None` means "use the manager default"
///
/// # Example
///
/// ```
/// use rust_module_logger::{DestinationOptions, LogLevel, LogMode};
///
/// let options = DestinationOptions::new()
///     .level(LogLevel::Warning)
///     .mode(LogMode::Full)
///     .notify(true);
/// assert_eq!(options.level, Some(LogLevel::Warning));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestinationOptions {
    pub level: Option<LogLevel>,
    pub folder: Option<String>,
    pub mode: Option<LogMode>,
    pub file_handling: Option<FileHandling>,
    pub file_tag: Option<FileTag>,
    pub message_format: Option<MessageFormat>,
    pub max_file_size: Option<u64>,
    /// Write `Adding destination!` to the new destination
    pub notify: bool,
}

impl DestinationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mode(mut self, mode: LogMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file_handling(mut self, handling: FileHandling) -> Self {
        self.file_handling = Some(handling);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file_tag(mut self, tag: FileTag) -> Self {
        self.file_tag = Some(tag);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn message_format(mut self, format: MessageFormat) -> Self {
        self.message_format = Some(format);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    /// Merge with the manager defaults for the given target
    pub fn resolve(&self, config: &LoggerConfig, target: &str) -> DestinationSettings {
        let target = if target.is_empty() {
            config.default_target.as_str()
        } else {
            target
        };

        let mut file_name = PathBuf::from(target);
        if file_name.extension().is_none() {
            file_name.set_extension("log");
        }

        let folder = self.folder.as_deref().unwrap_or(&config.default_folder);

        DestinationSettings {
            path: Path::new(folder).join(file_name),
            level: self.level.unwrap_or(config.default_level),
            mode: self.mode.unwrap_or(config.default_mode),
            file_handling: self.file_handling.unwrap_or(config.default_file_handling),
            file_tag: self.file_tag.unwrap_or(config.default_file_tag),
            message_format: self.message_format.unwrap_or(config.default_message_format),
            max_file_size: self.max_file_size.unwrap_or(config.max_file_size),
            console_colors: config.console_colors,
        }
    }
}

/// Fully resolved settings a destination writer is created with
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationSettings {
    pub path: PathBuf,
    pub level: LogLevel,
    pub mode: LogMode,
    pub file_handling: FileHandling,
    pub file_tag: FileTag,
    pub message_format: MessageFormat,
    pub max_file_size: u64,
    pub console_colors: bool,
}

impl DestinationSettings {
    /// Settings for `path` with every other value at its default
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        let config = LoggerConfig::default();
        Self {
            path: path.as_ref().to_path_buf(),
            level: config.default_level,
            mode: config.default_mode,
            file_handling: config.default_file_handling,
            file_tag: config.default_file_tag,
            message_format: config.default_message_format,
            max_file_size: config.max_file_size,
            console_colors: config.console_colors,
        }
    }
}
