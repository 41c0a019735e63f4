//! Application state for the biodiversity API.

use std::sync::Arc;

use anyhow::Result;

use crate::common_names::{CommonNameCache, GbifClient};
use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Process-wide common-name cache.
    pub common_names: Arc<CommonNameCache>,
}

impl AppState {
    /// Create a new AppState from environment configuration.
    pub fn new() -> Result<Self> {
        let config = ServiceConfig::from_env();

        let gbif = Arc::new(GbifClient::new(config.gbif_base_url.clone()));
        let common_names = Arc::new(CommonNameCache::new(config.cache_file.clone(), gbif));

        Ok(Self {
            config,
            common_names,
        })
    }
}
