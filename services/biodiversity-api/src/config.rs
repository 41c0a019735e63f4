//! Service configuration from environment variables.

use std::path::PathBuf;

/// Runtime configuration for the biodiversity service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Candidate dataset paths, tried in order; first existing wins.
    pub dataset_candidates: Vec<PathBuf>,

    /// Persisted common-name cache file.
    pub cache_file: PathBuf,

    /// Pre-computed wildlife forecast JSON (opaque passthrough).
    pub forecast_file: PathBuf,

    /// Base URL of the GBIF species API.
    pub gbif_base_url: String,
}

impl ServiceConfig {
    /// Build configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let dataset_candidates = match std::env::var("ECOLENS_DATASET_PATH") {
            Ok(path) => vec![PathBuf::from(path)],
            Err(_) => vec![
                PathBuf::from("public/biodiversity.csv"),
                PathBuf::from("backend/datasets/biodiversity.csv"),
            ],
        };

        let cache_file = std::env::var("ECOLENS_CACHE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".cache/common-names-cache.json"));

        let forecast_file = std::env::var("ECOLENS_FORECAST_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("backend/ml_models/wildlife_forecast.json"));

        let gbif_base_url = std::env::var("GBIF_BASE_URL")
            .unwrap_or_else(|_| "https://api.gbif.org/v1".to_string());

        Self {
            dataset_candidates,
            cache_file,
            forecast_file,
            gbif_base_url,
        }
    }
}
