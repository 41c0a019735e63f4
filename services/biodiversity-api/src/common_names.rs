//! Common-name resolution cache.
//!
//! Two tiers: an in-memory map loaded once per process from a persisted
//! JSON file, and a rate-limited remote GBIF lookup for misses. Every
//! resolution is cached permanently, including the scientific-name
//! fallback when nothing was found, so a species is looked up remotely
//! at most once per cache lifetime.
//!
//! ## Concurrency contract
//! Reads never mutate. Background enrichment tasks are the only writers;
//! two concurrent batches may race on the persisted file and the last
//! write wins. A lost update is bounded, re-derivable data, not a
//! correctness violation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

/// At most this many remote lookups per batch; the rest fall back to
/// the scientific name without waiting.
const MAX_REMOTE_PER_BATCH: usize = 10;

/// Courtesy delay between consecutive remote lookups.
const REMOTE_CALL_DELAY: Duration = Duration::from_millis(200);

/// Remote vernacular-name lookup.
///
/// A trait seam so tests can substitute call-counting stubs for the
/// live GBIF client.
#[async_trait]
pub trait VernacularLookup: Send + Sync {
    /// Best-effort lookup; `None` when no usable name was found or the
    /// remote call failed.
    async fn lookup(&self, scientific_name: &str) -> Option<String>;
}

/// GBIF species API client.
///
/// Two-step resolution: match the scientific name to a usage key, then
/// fetch vernacular names for that key, preferring English.
pub struct GbifClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SpeciesMatch {
    #[serde(rename = "usageKey")]
    usage_key: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VernacularNames {
    #[serde(default)]
    results: Vec<VernacularName>,
}

#[derive(Debug, Deserialize)]
struct VernacularName {
    #[serde(rename = "vernacularName")]
    vernacular_name: Option<String>,
    #[serde(default)]
    language: String,
}

impl GbifClient {
    /// Create a client against the given API base URL.
    ///
    /// No explicit timeout: a slow lookup only ever delays background
    /// enrichment, never a primary response.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, scientific_name: &str) -> Result<Option<String>, reqwest::Error> {
        let match_url = format!("{}/species/match", self.base_url);
        let matched: SpeciesMatch = self
            .client
            .get(&match_url)
            .query(&[("name", scientific_name)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(usage_key) = matched.usage_key else {
            return Ok(None);
        };

        let vernacular_url = format!("{}/species/{}/vernacularNames", self.base_url, usage_key);
        let names: VernacularNames = self
            .client
            .get(&vernacular_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let english = names
            .results
            .iter()
            .find(|v| v.language == "eng" || v.language == "en")
            .and_then(|v| v.vernacular_name.clone());

        Ok(english.or_else(|| {
            names
                .results
                .first()
                .and_then(|v| v.vernacular_name.clone())
        }))
    }
}

#[async_trait]
impl VernacularLookup for GbifClient {
    async fn lookup(&self, scientific_name: &str) -> Option<String> {
        match self.fetch(scientific_name).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("GBIF lookup failed for {}: {}", scientific_name, e);
                None
            }
        }
    }
}

#[derive(Default)]
struct CacheState {
    loaded: bool,
    names: HashMap<String, String>,
}

/// Process-wide common-name cache.
///
/// Explicitly constructed and injected through `AppState`; there is no
/// module-level global. Load happens once, on first access.
pub struct CommonNameCache {
    path: PathBuf,
    lookup: Arc<dyn VernacularLookup>,
    state: RwLock<CacheState>,
}

impl CommonNameCache {
    pub fn new(path: PathBuf, lookup: Arc<dyn VernacularLookup>) -> Self {
        Self {
            path,
            lookup,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Load the persisted cache on first call; later calls are no-ops.
    ///
    /// Fail-open: a missing or corrupt file resets to an empty map. An
    /// empty cache is seeded with a small table of well-known species.
    pub async fn ensure_loaded(&self) {
        {
            let state = self.state.read().await;
            if state.loaded {
                return;
            }
        }

        let mut state = self.state.write().await;
        if state.loaded {
            return;
        }

        if let Some(dir) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                tracing::warn!("Failed to create cache directory {:?}: {}", dir, e);
            }
        }

        state.names = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(names) => names,
                Err(e) => {
                    tracing::warn!("Corrupt common-name cache {:?}: {}", self.path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        if state.names.is_empty() {
            state.names = seed_names();
            write_cache_file(&self.path, &state.names).await;
        }

        state.loaded = true;
        tracing::info!("Loaded {} cached common names", state.names.len());
    }

    /// Pure in-memory read; no I/O, always available synchronously.
    pub async fn get_cached(&self, scientific_name: &str) -> Option<String> {
        self.state.read().await.names.get(scientific_name).cloned()
    }

    /// Number of cached names.
    pub async fn len(&self) -> usize {
        self.state.read().await.names.len()
    }

    /// Resolve one name, using the remote lookup on a miss.
    ///
    /// Never fails: a lookup miss or remote failure caches and returns
    /// the scientific name itself, permanently.
    pub async fn resolve(&self, scientific_name: &str) -> String {
        self.ensure_loaded().await;

        if let Some(name) = self.get_cached(scientific_name).await {
            return name;
        }

        tracing::debug!("Fetching common name for: {}", scientific_name);
        let resolved = self
            .lookup
            .lookup(scientific_name)
            .await
            .unwrap_or_else(|| scientific_name.to_string());

        let mut state = self.state.write().await;
        state
            .names
            .insert(scientific_name.to_string(), resolved.clone());
        write_cache_file(&self.path, &state.names).await;

        resolved
    }

    /// Resolve a batch, cache-first, with remote rate limiting.
    ///
    /// At most [`MAX_REMOTE_PER_BATCH`] names go through the remote
    /// path, spaced by [`REMOTE_CALL_DELAY`]; names beyond the cap map
    /// to themselves without waiting.
    pub async fn resolve_batch(&self, names: &[String]) -> HashMap<String, String> {
        self.ensure_loaded().await;

        let mut results = HashMap::new();
        let mut to_fetch = Vec::new();

        for name in names {
            match self.get_cached(name).await {
                Some(cached) => {
                    results.insert(name.clone(), cached);
                }
                None => to_fetch.push(name.clone()),
            }
        }

        for (i, name) in to_fetch.iter().enumerate() {
            if i >= MAX_REMOTE_PER_BATCH {
                tracing::debug!(
                    "Rate limit reached, skipping remaining {} names",
                    to_fetch.len() - i
                );
                results.insert(name.clone(), name.clone());
                continue;
            }
            if i > 0 {
                tokio::time::sleep(REMOTE_CALL_DELAY).await;
            }
            let resolved = self.resolve(name).await;
            results.insert(name.clone(), resolved);
        }

        results
    }
}

/// Write the full cache map to disk; failures are logged, never raised.
async fn write_cache_file(path: &std::path::Path, names: &HashMap<String, String>) {
    let json = match serde_json::to_string_pretty(names) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to serialize common-name cache: {}", e);
            return;
        }
    };
    if let Err(e) = tokio::fs::write(path, json).await {
        tracing::warn!("Failed to persist common-name cache {:?}: {}", path, e);
    }
}

/// Well-known species seeded into an empty cache to avoid remote calls
/// for the names the dashboard shows most often.
fn seed_names() -> HashMap<String, String> {
    [
        ("Pavo cristatus", "Indian Peafowl"),
        ("Panthera tigris", "Bengal Tiger"),
        ("Elephas maximus", "Asian Elephant"),
        ("Corvus splendens", "House Crow"),
        ("Acridotheres tristis", "Common Myna"),
        ("Columba livia", "Rock Pigeon"),
        ("Psittacula krameri", "Rose-ringed Parakeet"),
        ("Halcyon smyrnensis", "White-throated Kingfisher"),
        ("Dendrocitta vagabunda", "Rufous Treepie"),
        ("Dicrurus macrocercus", "Black Drongo"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub lookup that counts calls and replies with a fixed answer.
    struct CountingLookup {
        calls: AtomicUsize,
        response: Option<String>,
    }

    impl CountingLookup {
        fn found(name: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Some(name.to_string()),
            }
        }

        fn not_found() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: None,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VernacularLookup for CountingLookup {
        async fn lookup(&self, _scientific_name: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn cache_with(lookup: Arc<CountingLookup>) -> (CommonNameCache, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.json");
        (CommonNameCache::new(path, lookup), dir)
    }

    #[tokio::test]
    async fn test_resolve_hits_remote_at_most_once() {
        let lookup = Arc::new(CountingLookup::found("Bengal Fox"));
        let (cache, _dir) = cache_with(Arc::clone(&lookup));

        assert_eq!(cache.resolve("Vulpes bengalensis").await, "Bengal Fox");
        assert_eq!(cache.resolve("Vulpes bengalensis").await, "Bengal Fox");
        assert_eq!(lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_not_found_falls_back_and_is_cached() {
        let lookup = Arc::new(CountingLookup::not_found());
        let (cache, _dir) = cache_with(Arc::clone(&lookup));

        assert_eq!(cache.resolve("Micrixalus herrei").await, "Micrixalus herrei");
        // The fallback is cached: no second remote call.
        assert_eq!(cache.resolve("Micrixalus herrei").await, "Micrixalus herrei");
        assert_eq!(lookup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_seeded_defaults_never_hit_remote() {
        let lookup = Arc::new(CountingLookup::found("unused"));
        let (cache, _dir) = cache_with(Arc::clone(&lookup));
        cache.ensure_loaded().await;

        assert_eq!(
            cache.get_cached("Panthera tigris").await.as_deref(),
            Some("Bengal Tiger")
        );
        assert_eq!(cache.resolve("Panthera tigris").await, "Bengal Tiger");
        assert_eq!(lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.json");

        let lookup = Arc::new(CountingLookup::found("Great Hornbill"));
        let cache = CommonNameCache::new(path.clone(), lookup.clone());
        cache.resolve("Buceros bicornis").await;

        // Fresh cache instance over the same file; loads from disk.
        let lookup2 = Arc::new(CountingLookup::found("unused"));
        let cache2 = CommonNameCache::new(path, lookup2.clone());
        cache2.ensure_loaded().await;
        assert_eq!(
            cache2.get_cached("Buceros bicornis").await.as_deref(),
            Some("Great Hornbill")
        );
        assert_eq!(lookup2.call_count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_resets_to_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let lookup = Arc::new(CountingLookup::not_found());
        let cache = CommonNameCache::new(path, lookup);
        cache.ensure_loaded().await;
        assert_eq!(cache.len().await, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_caps_remote_calls() {
        let lookup = Arc::new(CountingLookup::not_found());
        let (cache, _dir) = cache_with(Arc::clone(&lookup));

        let names: Vec<String> = (0..15).map(|i| format!("Species number{}", i)).collect();
        let resolved = cache.resolve_batch(&names).await;

        assert_eq!(resolved.len(), 15);
        assert_eq!(lookup.call_count(), MAX_REMOTE_PER_BATCH);
        // Overflow names map to themselves.
        assert_eq!(resolved["Species number14"], "Species number14");
    }

    #[tokio::test]
    async fn test_batch_prefers_cache() {
        let lookup = Arc::new(CountingLookup::found("ignored"));
        let (cache, _dir) = cache_with(Arc::clone(&lookup));
        cache.ensure_loaded().await;

        let names = vec!["Pavo cristatus".to_string(), "Columba livia".to_string()];
        let resolved = cache.resolve_batch(&names).await;
        assert_eq!(resolved["Pavo cristatus"], "Indian Peafowl");
        assert_eq!(resolved["Columba livia"], "Rock Pigeon");
        assert_eq!(lookup.call_count(), 0);
    }
}
