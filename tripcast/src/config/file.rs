//! The INI configuration file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::parse::{format_duration, parse_duration, parse_size};
use crate::cache::{
    ServiceCacheConfig, StoreConfig, CACHE_PREFIX, DEFAULT_FAST_CAPACITY, DEFAULT_SWEEP_INTERVAL,
};

const CONFIG_DIR_NAME: &str = ".tripcast";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Directory holding the configuration file and default data directories.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Directory of the durable store. `None` keeps the persistent tier in
    /// memory for the life of the process.
    pub directory: Option<PathBuf>,
    pub memory_entries: usize,
    pub prefix: String,
    pub sweep_interval: Duration,
    pub store_quota: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: Some(config_dir().join("cache")),
            memory_entries: DEFAULT_FAST_CAPACITY,
            prefix: CACHE_PREFIX.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            store_quota: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory for daily log files. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
    /// Default level for the `tripcast` crates, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            level: "info".to_string(),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from [`config_file_path`], or defaults if the file is missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::default();

        if let Some(section) = ini.section(Some("cache")) {
            if let Some(v) = section.get("directory") {
                config.cache.directory = optional_path(v);
            }
            if let Some(v) = section.get("memory_entries") {
                config.cache.memory_entries = parse_entries("cache.memory_entries", v)?;
            }
            if let Some(v) = section.get("prefix") {
                config.cache.prefix = v.trim().to_string();
            }
            if let Some(v) = section.get("sweep_interval") {
                config.cache.sweep_interval = parse_interval("cache.sweep_interval", v)?;
            }
            if let Some(v) = section.get("store_quota") {
                config.cache.store_quota = parse_quota("cache.store_quota", v)?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(v) = section.get("directory") {
                config.logging.directory = optional_path(v);
            }
            if let Some(v) = section.get("level") {
                config.logging.level = parse_level("logging.level", v)?;
            }
        }

        Ok(config)
    }

    /// Save to [`config_file_path`], creating its directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)
    }

    /// Build the cache service configuration these settings describe.
    pub fn to_service_config(&self) -> ServiceCacheConfig {
        let store = match &self.cache.directory {
            Some(directory) => StoreConfig::File {
                directory: directory.clone(),
                quota_bytes: self.cache.store_quota,
            },
            None => StoreConfig::Memory {
                quota_bytes: self.cache.store_quota,
            },
        };

        ServiceCacheConfig {
            fast_capacity: self.cache.memory_entries,
            prefix: self.cache.prefix.clone(),
            sweep_interval: self.cache.sweep_interval,
            store,
        }
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("cache"))
            .set("directory", path_value(&self.cache.directory))
            .set("memory_entries", self.cache.memory_entries.to_string())
            .set("prefix", self.cache.prefix.as_str())
            .set("sweep_interval", format_duration(self.cache.sweep_interval))
            .set(
                "store_quota",
                self.cache.store_quota.map(quota_value).unwrap_or_default(),
            );

        ini.with_section(Some("logging"))
            .set("directory", path_value(&self.logging.directory))
            .set("level", self.logging.level.as_str());

        ini
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

/// Write a quota in the largest unit that holds it exactly.
fn quota_value(bytes: u64) -> String {
    for (unit, size) in [("GB", 1u64 << 30), ("MB", 1 << 20), ("KB", 1 << 10)] {
        if bytes >= size && bytes % size == 0 {
            return format!("{}{}", bytes / size, unit);
        }
    }
    bytes.to_string()
}

fn path_value(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub(super) fn parse_entries(key: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid(key, value, "must be at least 1")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(key, value, e.to_string())),
    }
}

pub(super) fn parse_interval(key: &str, value: &str) -> Result<Duration, ConfigError> {
    match parse_duration(value) {
        Ok(d) if d.is_zero() => Err(invalid(key, value, "must be greater than zero")),
        Ok(d) => Ok(d),
        Err(reason) => Err(invalid(key, value, reason)),
    }
}

pub(super) fn parse_quota(key: &str, value: &str) -> Result<Option<u64>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_size(value)
        .map(Some)
        .map_err(|reason| invalid(key, value, reason))
}

pub(super) fn parse_level(key: &str, value: &str) -> Result<String, ConfigError> {
    let level = value.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(level),
        _ => Err(invalid(
            key,
            value,
            "expected one of trace, debug, info, warn, error",
        )),
    }
}

pub(super) fn parse_path(value: &str) -> Option<PathBuf> {
    optional_path(value)
}
