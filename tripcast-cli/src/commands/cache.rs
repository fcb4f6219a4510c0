//! Cache management CLI commands.

use clap::Subcommand;
use tracing::debug;
use tripcast::app::{AppConfig, TripcastApp};
use tripcast::cache::{CacheStats, InventoryItem, JsonCache, KeyKind, Tier};
use tripcast::config::{format_size, ConfigFile};

use super::common::{format_remaining, format_timestamp};
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show hit/miss counters, entry counts per tier and store usage
    Stats,

    /// List cached keys with their tier and expiry
    Keys {
        /// Only list keys of one kind (weather, geocode, app, other)
        #[arg(long)]
        kind: Option<KeyKind>,
    },

    /// Show where a key lives and its metadata
    Inspect {
        /// Full cache key, e.g. geocode:Beijing
        key: String,
    },

    /// Delete one key from both tiers
    Delete {
        /// Full cache key
        key: String,
    },

    /// Delete every cached entry, or every entry of one kind
    Clear {
        /// Only delete keys of one kind (weather, geocode, app, other)
        #[arg(long)]
        kind: Option<KeyKind>,
    },

    /// Remove expired entries now
    Sweep,
}

/// Run a cache subcommand.
pub async fn run(action: CacheAction) -> Result<(), CliError> {
    debug!(?action, "Running cache command");
    let config = ConfigFile::load()?;
    match &config.cache.directory {
        Some(directory) => println!("Cache store: {}", directory.display()),
        None => println!("Cache store: in-memory (set cache.directory to persist)"),
    }

    let app = TripcastApp::start(AppConfig::from_config_file(&config)).await?;
    let result = execute(&app.cache(), action);
    app.shutdown().await;

    for line in result? {
        println!("{}", line);
    }
    Ok(())
}

/// Apply `action` to `cache` and return the lines to print.
fn execute(cache: &JsonCache, action: CacheAction) -> Result<Vec<String>, CliError> {
    match action {
        CacheAction::Stats => Ok(stats_lines(&cache.stats(), cache.store_usage_bytes())),
        CacheAction::Keys { kind } => {
            let now = cache.now_millis();
            let items: Vec<InventoryItem> = cache
                .inventory()
                .into_iter()
                .filter(|item| kind.map_or(true, |k| item.kind == k))
                .collect();

            if items.is_empty() {
                return Ok(vec!["(no entries)".to_string()]);
            }
            Ok(items.iter().map(|item| key_line(item, now)).collect())
        }
        CacheAction::Inspect { key } => {
            let info = cache.describe(&key);
            let Some(metadata) = info.metadata else {
                return Err(CliError::NotFound(key));
            };
            let now = cache.now_millis();
            Ok(vec![
                format!("Key:          {}", key),
                format!("Kind:         {}", KeyKind::classify(&key)),
                format!("Tier:         {}", info.tier),
                format!("Expires:      {}", format_timestamp(metadata.expires_at)),
                format!("Remaining:    {}", format_remaining(&metadata, now)),
                format!("Last access:  {}", format_timestamp(metadata.last_access)),
                format!("Access count: {}", metadata.access_count),
            ])
        }
        CacheAction::Delete { key } => {
            if cache.delete(&key) {
                Ok(vec![format!("Deleted {}", key)])
            } else {
                Err(CliError::NotFound(key))
            }
        }
        CacheAction::Clear { kind: Some(kind) } => {
            let removed = cache.delete_kind(kind);
            Ok(vec![format!("Deleted {} {} entries", removed, kind)])
        }
        CacheAction::Clear { kind: None } => {
            let count = cache.keys().len();
            cache.clear();
            Ok(vec![format!("Deleted {} entries", count)])
        }
        CacheAction::Sweep => {
            let removed = cache.sweep_expired();
            Ok(vec![format!("Removed {} expired entries", removed)])
        }
    }
}

fn stats_lines(stats: &CacheStats, store_bytes: u64) -> Vec<String> {
    vec![
        format!(
            "Fast tier:        {} entries, {} hits, {} misses",
            stats.fast_tier.size, stats.fast_tier.hits, stats.fast_tier.misses
        ),
        format!(
            "Persistent tier:  {} entries, {} hits, {} misses",
            stats.persistent_tier.size, stats.persistent_tier.hits, stats.persistent_tier.misses
        ),
        format!(
            "Total:            {} keys, hit rate {:.1}%",
            stats.total.size,
            stats.total.hit_rate * 100.0
        ),
        format!("Store usage:      {}", format_size(store_bytes)),
    ]
}

fn key_line(item: &InventoryItem, now: u64) -> String {
    let expiry = match (&item.info.tier, &item.info.metadata) {
        (Tier::Absent, _) | (_, None) => "-".to_string(),
        (_, Some(metadata)) => format_remaining(metadata, now),
    };
    format!(
        "{:<10} {:<10} {:>8}  {}",
        item.kind.as_str(),
        item.info.tier.as_str(),
        expiry,
        item.key
    )
}
