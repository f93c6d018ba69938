//! Metrics collection module
//!
//! Tracks provider performance, error rates and how often the synthetic
//! fallback had to step in.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Rolling window of response times kept per provider
const RESPONSE_WINDOW: usize = 100;

/// Pipeline metrics shared by the orchestrator and the web layer
pub struct Metrics {
    /// Total search count
    total_searches: AtomicU64,
    /// Searches answered by synthetic results
    synthetic_fallbacks: AtomicU64,
    /// Attempts per provider
    provider_attempts: RwLock<HashMap<String, u64>>,
    /// Provider response times (rolling window in ms)
    provider_response_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Provider error counts, keyed by provider then error kind
    provider_errors: RwLock<HashMap<String, HashMap<&'static str, u64>>>,
    /// Provider success counts
    provider_successes: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            synthetic_fallbacks: AtomicU64::new(0),
            provider_attempts: RwLock::new(HashMap::new()),
            provider_response_times: RwLock::new(HashMap::new()),
            provider_errors: RwLock::new(HashMap::new()),
            provider_successes: RwLock::new(HashMap::new()),
        }
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that the synthetic generator answered a search
    pub fn inc_synthetic(&self) {
        self.synthetic_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a provider attempt
    pub fn record_attempt(&self, provider: &str) {
        if let Ok(mut attempts) = self.provider_attempts.write() {
            *attempts.entry(provider.to_string()).or_insert(0) += 1;
        }
    }

    /// Record provider response time
    pub fn record_response_time(&self, provider: &str, time_ms: u64) {
        if let Ok(mut times) = self.provider_response_times.write() {
            let entry = times.entry(provider.to_string()).or_default();
            if entry.len() >= RESPONSE_WINDOW {
                entry.remove(0);
            }
            entry.push(time_ms);
        }
    }

    /// Record a provider error of the given kind
    pub fn record_error(&self, provider: &str, kind: &'static str) {
        if let Ok(mut errors) = self.provider_errors.write() {
            *errors
                .entry(provider.to_string())
                .or_default()
                .entry(kind)
                .or_insert(0) += 1;
        }
    }

    /// Record provider success
    pub fn record_success(&self, provider: &str) {
        if let Ok(mut successes) = self.provider_successes.write() {
            *successes.entry(provider.to_string()).or_insert(0) += 1;
        }
    }

    /// Get total searches
    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Get synthetic fallback count
    pub fn synthetic_fallbacks(&self) -> u64 {
        self.synthetic_fallbacks.load(Ordering::Relaxed)
    }

    /// Get average response time for a provider
    pub fn avg_response_time(&self, provider: &str) -> Option<u64> {
        let times = self.provider_response_times.read().ok()?;
        times
            .get(provider)
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().sum::<u64>() / t.len() as u64)
    }

    fn error_count(&self, provider: &str) -> u64 {
        self.provider_errors
            .read()
            .ok()
            .and_then(|errors| errors.get(provider).map(|kinds| kinds.values().sum()))
            .unwrap_or(0)
    }

    fn success_count(&self, provider: &str) -> u64 {
        self.provider_successes
            .read()
            .ok()
            .and_then(|s| s.get(provider).copied())
            .unwrap_or(0)
    }

    /// Get reliability percentage for a provider
    pub fn reliability(&self, provider: &str) -> f64 {
        let errors = self.error_count(provider);
        let successes = self.success_count(provider);
        let total = errors + successes;
        if total == 0 {
            100.0
        } else {
            (successes as f64 / total as f64) * 100.0
        }
    }

    /// Snapshot of every provider that has been attempted
    pub fn provider_stats(&self) -> HashMap<String, ProviderStats> {
        let attempts: Vec<(String, u64)> = match self.provider_attempts.read() {
            Ok(a) => a.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            Err(_) => return HashMap::new(),
        };

        attempts
            .into_iter()
            .map(|(provider, attempts)| {
                let errors = self
                    .provider_errors
                    .read()
                    .ok()
                    .and_then(|e| e.get(&provider).cloned())
                    .unwrap_or_default();
                let stats = ProviderStats {
                    attempts,
                    successes: self.success_count(&provider),
                    errors,
                    avg_response_time: self.avg_response_time(&provider),
                    reliability: self.reliability(&provider),
                };
                (provider, stats)
            })
            .collect()
    }

    /// Full snapshot for the stats endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_searches: self.total_searches(),
            synthetic_fallbacks: self.synthetic_fallbacks(),
            providers: self.provider_stats(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub attempts: u64,
    pub successes: u64,
    pub errors: HashMap<&'static str, u64>,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub synthetic_fallbacks: u64,
    pub providers: HashMap<String, ProviderStats>,
}
