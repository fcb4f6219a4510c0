//! Cache key namespaces.
//!
//! Keys are plain strings. Their prefix says what kind of lookup they cache,
//! which lets diagnostics classify entries without a central registry:
//!
//! - Geocodes: `"geocode:{address}"` (e.g. `"geocode:Beijing"`)
//! - Weather: `"weather:{lat}:{lng}:{date}:{time}"`
//!   (e.g. `"weather:39.9:116.4:2025-06-01:09:00"`)

use std::fmt;
use std::str::FromStr;

/// Prefix for geocode entries.
pub const GEOCODE_PREFIX: &str = "geocode:";

/// Prefix for weather entries.
pub const WEATHER_PREFIX: &str = "weather:";

/// Prefix used by the default persistent namespace.
pub const CACHE_PREFIX: &str = "cache:";

/// Prefix of application data that may share the durable store.
pub const APP_PREFIX: &str = "timearea_";

/// Namespaces the persistent tier treats as its own when it runs without a
/// dedicated storage prefix.
pub const RECOGNIZED_PREFIXES: &[&str] = &[WEATHER_PREFIX, GEOCODE_PREFIX, CACHE_PREFIX];

/// Build the key for a geocode lookup.
///
/// Surrounding whitespace is ignored so `" Beijing"` and `"Beijing"` share
/// an entry.
pub fn geocode_key(address: &str) -> String {
    format!("{}{}", GEOCODE_PREFIX, address.trim())
}

/// Build the key for a weather lookup at the given coordinates and time.
pub fn weather_key(latitude: f64, longitude: f64, date: &str, time: &str) -> String {
    format!(
        "{}{}:{}:{}:{}",
        WEATHER_PREFIX, latitude, longitude, date, time
    )
}

/// Whether a raw storage key belongs to one of the recognized namespaces.
pub fn is_recognized(key: &str) -> bool {
    RECOGNIZED_PREFIXES.iter().any(|p| key.starts_with(p))
}

/// Classification of a cache key by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyKind {
    Weather,
    Geocode,
    App,
    Other,
}

impl KeyKind {
    /// Classify a key by its namespace prefix.
    pub fn classify(key: &str) -> Self {
        if key.starts_with(WEATHER_PREFIX) {
            KeyKind::Weather
        } else if key.starts_with(GEOCODE_PREFIX) {
            KeyKind::Geocode
        } else if key.starts_with(APP_PREFIX) {
            KeyKind::App
        } else {
            KeyKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Weather => "weather",
            KeyKind::Geocode => "geocode",
            KeyKind::App => "app",
            KeyKind::Other => "other",
        }
    }

    pub fn all() -> [KeyKind; 4] {
        [KeyKind::Weather, KeyKind::Geocode, KeyKind::App, KeyKind::Other]
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown key kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKeyKind(pub String);

impl fmt::Display for UnknownKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown key kind '{}' (expected weather, geocode, app or other)",
            self.0
        )
    }
}

impl std::error::Error for UnknownKeyKind {}

impl FromStr for KeyKind {
    type Err = UnknownKeyKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weather" => Ok(KeyKind::Weather),
            "geocode" => Ok(KeyKind::Geocode),
            "app" => Ok(KeyKind::App),
            "other" => Ok(KeyKind::Other),
            _ => Err(UnknownKeyKind(s.to_string())),
        }
    }
}
