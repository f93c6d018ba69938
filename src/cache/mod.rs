//! Caching module for press-review
//!
//! Memoizes analyses so a result seen again (a repeated search, a re-run of
//! `/analyze`) is not scored twice.

use crate::analysis::{AnalysisError, Scorer};
use crate::results::{AnalysisResult, SearchResult};
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

/// TTL cache of analyses keyed by [`analysis_cache_key`]
#[derive(Clone)]
pub struct AnalysisCache {
    cache: Cache<String, AnalysisResult>,
}

impl AnalysisCache {
    /// Create a new analysis cache with specified TTL
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    pub async fn get(&self, result: &SearchResult) -> Option<AnalysisResult> {
        self.cache.get(&analysis_cache_key(result)).await
    }

    pub async fn set(&self, result: &SearchResult, analysis: AnalysisResult) {
        self.cache.insert(analysis_cache_key(result), analysis).await;
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache size
    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(3600, 10_000)
    }
}

/// Scorer decorator that consults the cache first
pub struct CachedScorer<S> {
    inner: S,
    cache: AnalysisCache,
}

impl<S: Scorer> CachedScorer<S> {
    pub fn new(inner: S, ttl_seconds: u64, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: AnalysisCache::new(ttl_seconds, max_capacity),
        }
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }
}

#[async_trait]
impl<S: Scorer> Scorer for CachedScorer<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn score(&self, result: &SearchResult) -> Result<AnalysisResult, AnalysisError> {
        if let Some(hit) = self.cache.get(result).await {
            return Ok(hit);
        }
        // failures are not cached
        let analysis = self.inner.score(result).await?;
        self.cache.set(result, analysis.clone()).await;
        Ok(analysis)
    }
}

/// Generate a cache key for a result from its URL and title
pub fn analysis_cache_key(result: &SearchResult) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(result.url.as_bytes());
    hasher.update([0u8]);
    hasher.update(result.title.as_bytes());

    format!("{:x}", hasher.finalize())
}
