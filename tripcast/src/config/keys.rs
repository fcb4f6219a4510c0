//! Addressable configuration keys for `config get` / `config set`.

use std::fmt;
use std::str::FromStr;

use super::file::{
    parse_entries, parse_interval, parse_level, parse_path, parse_quota, ConfigError, ConfigFile,
};
use super::parse::{format_duration, format_size};

/// A single setting addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    CacheDirectory,
    CacheMemoryEntries,
    CachePrefix,
    CacheSweepInterval,
    CacheStoreQuota,
    LoggingDirectory,
    LoggingLevel,
}

const ALL_KEYS: [ConfigKey; 7] = [
    ConfigKey::CacheDirectory,
    ConfigKey::CacheMemoryEntries,
    ConfigKey::CachePrefix,
    ConfigKey::CacheSweepInterval,
    ConfigKey::CacheStoreQuota,
    ConfigKey::LoggingDirectory,
    ConfigKey::LoggingLevel,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::CacheDirectory => "cache.directory",
            ConfigKey::CacheMemoryEntries => "cache.memory_entries",
            ConfigKey::CachePrefix => "cache.prefix",
            ConfigKey::CacheSweepInterval => "cache.sweep_interval",
            ConfigKey::CacheStoreQuota => "cache.store_quota",
            ConfigKey::LoggingDirectory => "logging.directory",
            ConfigKey::LoggingLevel => "logging.level",
        }
    }

    pub fn section(&self) -> &'static str {
        self.split().0
    }

    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or((name, ""))
    }

    /// Current value as text. Unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::CacheDirectory => display_path(&config.cache.directory),
            ConfigKey::CacheMemoryEntries => config.cache.memory_entries.to_string(),
            ConfigKey::CachePrefix => config.cache.prefix.clone(),
            ConfigKey::CacheSweepInterval => format_duration(config.cache.sweep_interval),
            ConfigKey::CacheStoreQuota => config
                .cache
                .store_quota
                .map(format_size)
                .unwrap_or_default(),
            ConfigKey::LoggingDirectory => display_path(&config.logging.directory),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Validate `value` and apply it. An empty value clears optional
    /// settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let name = self.name();
        match self {
            ConfigKey::CacheDirectory => config.cache.directory = parse_path(value),
            ConfigKey::CacheMemoryEntries => {
                config.cache.memory_entries = parse_entries(name, value)?
            }
            ConfigKey::CachePrefix => config.cache.prefix = value.trim().to_string(),
            ConfigKey::CacheSweepInterval => {
                config.cache.sweep_interval = parse_interval(name, value)?
            }
            ConfigKey::CacheStoreQuota => config.cache.store_quota = parse_quota(name, value)?,
            ConfigKey::LoggingDirectory => config.logging.directory = parse_path(value),
            ConfigKey::LoggingLevel => config.logging.level = parse_level(name, value)?,
        }
        Ok(())
    }
}

fn display_path(path: &Option<std::path::PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `section.key` name that matches no setting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown configuration key '{0}'")]
pub struct UnknownConfigKey(pub String);

impl FromStr for ConfigKey {
    type Err = UnknownConfigKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| UnknownConfigKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_names() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>(), Ok(*key));
        }
        assert_eq!(
            "Cache.Prefix".parse::<ConfigKey>(),
            Ok(ConfigKey::CachePrefix)
        );
        assert!("cache.colour".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_section_and_key_name() {
        assert_eq!(ConfigKey::CacheSweepInterval.section(), "cache");
        assert_eq!(ConfigKey::CacheSweepInterval.key_name(), "sweep_interval");
        assert_eq!(ConfigKey::LoggingLevel.section(), "logging");
    }

    #[test]
    fn test_set_then_get() {
        let mut config = ConfigFile::default();

        ConfigKey::CacheSweepInterval.set(&mut config, "10m").unwrap();
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(600));
        assert_eq!(ConfigKey::CacheSweepInterval.get(&config), "10m");

        ConfigKey::CacheStoreQuota.set(&mut config, "2MB").unwrap();
        assert_eq!(ConfigKey::CacheStoreQuota.get(&config), "2.0 MB");

        ConfigKey::CacheStoreQuota.set(&mut config, "").unwrap();
        assert_eq!(config.cache.store_quota, None);
        assert_eq!(ConfigKey::CacheStoreQuota.get(&config), "");

        ConfigKey::CacheDirectory.set(&mut config, "").unwrap();
        assert_eq!(config.cache.directory, None);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = ConfigFile::default();

        assert!(ConfigKey::CacheMemoryEntries.set(&mut config, "lots").is_err());
        assert!(ConfigKey::CacheSweepInterval.set(&mut config, "0s").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "loud").is_err());
        assert_eq!(config, ConfigFile::default());
    }
}
