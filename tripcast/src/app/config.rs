//! Application configuration for [`TripcastApp`](super::TripcastApp).

use crate::cache::ServiceCacheConfig;
use crate::config::ConfigFile;

/// Everything needed to bootstrap the application.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Cache service configuration.
    pub cache: ServiceCacheConfig,
}

impl AppConfig {
    pub fn new(cache: ServiceCacheConfig) -> Self {
        Self { cache }
    }

    /// Build the application config from the user's configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self::new(config.to_service_config())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(ServiceCacheConfig::default())
    }
}
