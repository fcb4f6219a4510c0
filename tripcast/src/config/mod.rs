//! Configuration file support.
//!
//! Settings live in an INI file at `~/.tripcast/config.ini`:
//!
//! ```ini
//! [cache]
//! directory = /home/user/.tripcast/cache
//! memory_entries = 100
//! prefix = cache:
//! sweep_interval = 5m
//! store_quota = 10MB
//!
//! [logging]
//! directory = /home/user/.tripcast/logs
//! level = info
//! ```
//!
//! A missing file means all defaults. Values the user never set are not
//! required in the file.

mod file;
mod keys;
mod parse;

pub use file::{
    config_dir, config_file_path, CacheSettings, ConfigError, ConfigFile, LoggingSettings,
};
pub use keys::{ConfigKey, UnknownConfigKey};
pub use parse::{format_duration, format_size, parse_duration, parse_size};
