//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`.

use std::path::Path;

use clap::Subcommand;
use tripcast::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., cache.sweep_interval)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., cache.sweep_interval)
        key: String,

        /// Value to set; empty clears optional settings
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let path = config_file_path();
    let lines = match command {
        ConfigCommands::Get { key } => run_get(&path, &key)?,
        ConfigCommands::Set { key, value } => run_set(&path, &key, &value)?,
        ConfigCommands::List => run_list(&path)?,
        ConfigCommands::Path => vec![path.display().to_string()],
    };

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'tripcast config list' to see available keys.",
            key
        ))
    })
}

fn run_get(path: &Path, key: &str) -> Result<Vec<String>, CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load_from(path)?;
    let value = config_key.get(&config);

    if value.is_empty() {
        Ok(vec!["(not set)".to_string()])
    } else {
        Ok(vec![value])
    }
}

fn run_set(path: &Path, key: &str, value: &str) -> Result<Vec<String>, CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load_from(path)?;
    config_key.set(&mut config, value)?;
    config.save_to(path)?;

    Ok(vec![format!(
        "Set {} = {}",
        config_key.name(),
        config_key.get(&config)
    )])
}

fn run_list(path: &Path) -> Result<Vec<String>, CliError> {
    let config = ConfigFile::load_from(path)?;
    let mut lines = vec![
        "Configuration Settings".to_string(),
        "======================".to_string(),
    ];

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();

        // Section header when section changes
        if section != current_section {
            lines.push(String::new());
            lines.push(format!("[{}]", section));
            current_section = section;
        }

        let value = key.get(&config);
        if value.is_empty() {
            lines.push(format!("  {} = (not set)", key.key_name()));
        } else {
            lines.push(format!("  {} = {}", key.key_name(), value));
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        let set = run_set(&path, "cache.memory_entries", "250").unwrap();
        assert_eq!(set, vec!["Set cache.memory_entries = 250".to_string()]);

        let get = run_get(&path, "cache.memory_entries").unwrap();
        assert_eq!(get, vec!["250".to_string()]);
    }

    #[test]
    fn test_get_unset_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        let get = run_get(&path, "cache.store_quota").unwrap();
        assert_eq!(get, vec!["(not set)".to_string()]);
    }

    #[test]
    fn test_unknown_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        let err = run_get(&path, "cache.colour").unwrap_err();
        assert!(err.to_string().contains("tripcast config list"));
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_value_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        assert!(run_set(&path, "cache.sweep_interval", "never").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_list_groups_by_section() {
        let temp = TempDir::new().unwrap();
        let lines = run_list(&temp.path().join("config.ini")).unwrap();

        assert!(lines.contains(&"[cache]".to_string()));
        assert!(lines.contains(&"[logging]".to_string()));
        assert!(lines.contains(&"  prefix = cache:".to_string()));
        assert!(lines.contains(&"  level = info".to_string()));
    }
}
