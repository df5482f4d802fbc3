//! Weights source fetching and per-location caching
//!
//! Each source location is fetched and parsed at most once until it is
//! explicitly invalidated. A failed fetch is not cached, so the next page
//! render simply tries again.
//!
//! # Locations
//! - `http://...` / `https://...`: HTTP GET (the published spreadsheet export)
//! - `file://...` or a bare path: read from disk

use async_trait::async_trait;
use nest_common::{Error, Result, WeightsTable};
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Request timeout for remote weights sources
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the raw CSV text behind a source location
#[async_trait]
pub trait WeightsSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<String>;
}

/// Dispatches on the location scheme: HTTP(S) via reqwest, otherwise disk
pub struct LocationSource {
    http_client: Client,
}

impl LocationSource {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    async fn fetch_http(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::DataSource(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DataSource(format!(
                "Weights source {} returned HTTP {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::DataSource(format!("Failed to read body from {}: {}", url, e)))
    }

    async fn fetch_file(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::DataSource(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl WeightsSource for LocationSource {
    async fn fetch(&self, location: &str) -> Result<String> {
        if location.starts_with("http://") || location.starts_with("https://") {
            self.fetch_http(location).await
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            self.fetch_file(Path::new(path)).await
        }
    }
}

/// Parsed weights tables keyed by source location
#[derive(Clone)]
pub struct WeightsCache {
    source: Arc<dyn WeightsSource>,
    tables: Arc<Mutex<HashMap<String, Arc<WeightsTable>>>>,
}

impl WeightsCache {
    pub fn new(source: Arc<dyn WeightsSource>) -> Self {
        Self {
            source,
            tables: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cached table for `location`, fetching and parsing it on first use
    ///
    /// The lock is held across the fetch, so concurrent first requests for a
    /// location issue a single fetch.
    pub async fn get_or_fetch(&self, location: &str) -> Result<Arc<WeightsTable>> {
        let mut tables = self.tables.lock().await;

        if let Some(table) = tables.get(location) {
            debug!(location, "Weights table cache hit");
            return Ok(Arc::clone(table));
        }

        info!(location, "Fetching weights table");
        let text = match self.source.fetch(location).await {
            Ok(text) => text,
            Err(e) => {
                warn!(location, error = %e, "Weights fetch failed");
                return Err(e);
            }
        };

        let table = match WeightsTable::from_csv_str(&text) {
            Ok(table) => Arc::new(table),
            Err(e) => {
                warn!(location, error = %e, "Weights parse failed");
                return Err(e);
            }
        };

        info!(
            location,
            rows = table.len(),
            categories = table.categories().len(),
            "✓ Weights table loaded"
        );
        tables.insert(location.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table for a location; true if one was cached
    pub async fn invalidate(&self, location: &str) -> bool {
        let removed = self.tables.lock().await.remove(location).is_some();
        if removed {
            info!(location, "Weights table invalidated");
        }
        removed
    }

    pub async fn invalidate_all(&self) {
        let mut tables = self.tables.lock().await;
        info!(count = tables.len(), "Invalidating all weights tables");
        tables.clear();
    }

    pub async fn is_cached(&self, location: &str) -> bool {
        self.tables.lock().await.contains_key(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed CSV body per location and counts fetches
    struct CountingSource {
        bodies: HashMap<String, String>,
        fetches: AtomicUsize,
    }

    impl CountingSource {
        fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                bodies: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeightsSource for CountingSource {
        async fn fetch(&self, location: &str) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(location)
                .cloned()
                .ok_or_else(|| Error::DataSource(format!("unreachable: {}", location)))
        }
    }

    const CSV_A: &str = "Category,KPI,Tier,Weights\nA,View,VIP,1\n";
    const CSV_B: &str = "Category,KPI,Tier,Weights\nB,View,VIP,2\n";

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let source = CountingSource::new(&[("mem://a", CSV_A)]);
        let cache = WeightsCache::new(source.clone());

        let first = cache.get_or_fetch("mem://a").await.unwrap();
        let second = cache.get_or_fetch("mem://a").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_locations_cached_independently() {
        let source = CountingSource::new(&[("mem://a", CSV_A), ("mem://b", CSV_B)]);
        let cache = WeightsCache::new(source.clone());

        let a = cache.get_or_fetch("mem://a").await.unwrap();
        let b = cache.get_or_fetch("mem://b").await.unwrap();

        assert_eq!(a.categories(), &["A".to_string()]);
        assert_eq!(b.categories(), &["B".to_string()]);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = CountingSource::new(&[("mem://a", CSV_A)]);
        let cache = WeightsCache::new(source.clone());

        let first = cache.get_or_fetch("mem://a").await.unwrap();
        assert!(cache.invalidate("mem://a").await);
        assert!(!cache.is_cached("mem://a").await);
        let second = cache.get_or_fetch("mem://a").await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches(), 2);
        assert!(!cache.invalidate("mem://missing").await);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let source = CountingSource::new(&[("mem://a", CSV_A), ("mem://b", CSV_B)]);
        let cache = WeightsCache::new(source.clone());
        cache.get_or_fetch("mem://a").await.unwrap();
        cache.get_or_fetch("mem://b").await.unwrap();

        cache.invalidate_all().await;

        assert!(!cache.is_cached("mem://a").await);
        assert!(!cache.is_cached("mem://b").await);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let source = CountingSource::new(&[]);
        let cache = WeightsCache::new(source.clone());

        assert!(matches!(
            cache.get_or_fetch("mem://down").await,
            Err(Error::DataSource(_))
        ));
        assert!(cache.get_or_fetch("mem://down").await.is_err());
        assert_eq!(source.fetches(), 2);
        assert!(!cache.is_cached("mem://down").await);
    }

    #[tokio::test]
    async fn test_unparseable_source_is_data_source_error() {
        let source = CountingSource::new(&[("mem://bad", "<html>not a csv</html>")]);
        let cache = WeightsCache::new(source);

        assert!(matches!(
            cache.get_or_fetch("mem://bad").await,
            Err(Error::DataSource(_))
        ));
    }

    #[tokio::test]
    async fn test_location_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");
        std::fs::write(&path, CSV_A).unwrap();

        let source = LocationSource::new().unwrap();
        let plain = source.fetch(path.to_str().unwrap()).await.unwrap();
        let url = source
            .fetch(&format!("file://{}", path.display()))
            .await
            .unwrap();

        assert_eq!(plain, CSV_A);
        assert_eq!(url, CSV_A);
    }

    #[tokio::test]
    async fn test_location_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocationSource::new().unwrap();
        let missing = dir.path().join("absent.csv");

        assert!(matches!(
            source.fetch(missing.to_str().unwrap()).await,
            Err(Error::DataSource(_))
        ));
    }
}
