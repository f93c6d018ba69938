//! Search execution across the provider fallback chain

use super::models::SearchConfig;
use super::synthetic::SyntheticGenerator;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::{Provider, ProviderError, ProviderRegistry};
use crate::results::{mark_duplicates, SearchResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a batch of results came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOrigin {
    /// The named provider answered first
    Provider(String),
    /// No provider yielded; results are synthetic
    Synthetic,
    /// No provider yielded and the fallback is disabled
    Empty,
}

/// Ordered, unanalyzed results plus how they were obtained
#[derive(Debug)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub origin: ResultOrigin,
    /// Providers that were tried and failed, in order
    pub failures: Vec<(String, ProviderError)>,
}

/// Search executor that walks the provider chain serially
pub struct Search {
    /// HTTP client for making requests
    client: HttpClient,
    /// Provider registry
    registry: Arc<ProviderRegistry>,
    /// Shared metrics
    metrics: Arc<Metrics>,
    /// Fallback generator, absent when disabled
    synthetic: Option<SyntheticGenerator>,
}

impl Search {
    /// Create a new search executor with the default synthetic fallback
    pub fn new(client: HttpClient, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            client,
            registry,
            metrics: Arc::new(Metrics::new()),
            synthetic: Some(SyntheticGenerator::default()),
        }
    }

    /// Share a metrics instance
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace or disable the synthetic fallback
    pub fn with_synthetic(mut self, synthetic: Option<SyntheticGenerator>) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Metrics recorded by this executor
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Execute a search.
    ///
    /// Only an invalid config is an error; provider failures fall through to
    /// the next provider and finally to the synthetic generator.
    pub async fn execute(&self, config: &SearchConfig) -> Result<SearchOutcome> {
        config.validate()?;
        self.metrics.inc_search();

        let providers = self.registry.available();
        info!(
            "Executing search '{}' with {} available providers",
            config.query,
            providers.len()
        );

        let mut failures = Vec::new();
        let mut found = None;

        for provider in providers {
            let name = provider.name().to_string();
            match self.search_provider(provider.as_ref(), config).await {
                Ok(results) if !results.is_empty() => {
                    found = Some((name, results));
                    break;
                }
                Ok(_) => {
                    debug!("Provider {} returned no results", name);
                }
                Err(e) => {
                    warn!("Provider {} failed, trying next: {}", name, e);
                    failures.push((name, e));
                }
            }
        }

        let (mut results, origin) = match found {
            Some((name, results)) => (results, ResultOrigin::Provider(name)),
            None => match &self.synthetic {
                Some(generator) => {
                    info!("No provider yielded results, using synthetic results");
                    self.metrics.inc_synthetic();
                    let results = generator.generate(config, &mut rand::thread_rng());
                    (results, ResultOrigin::Synthetic)
                }
                None => (Vec::new(), ResultOrigin::Empty),
            },
        };

        results.truncate(config.max_results);
        let duplicates = mark_duplicates(&mut results);
        if duplicates > 0 {
            debug!("Flagged {} duplicate results", duplicates);
        }

        Ok(SearchOutcome {
            results,
            origin,
            failures,
        })
    }

    /// Search a single provider
    async fn search_provider(
        &self,
        provider: &dyn Provider,
        config: &SearchConfig,
    ) -> std::result::Result<Vec<SearchResult>, ProviderError> {
        let name = provider.name();
        let timeout = self.client.timeout_for(provider.timeout());
        let start = Instant::now();
        self.metrics.record_attempt(name);

        debug!("Searching provider {} with timeout {:?}", name, timeout);

        let outcome = match provider.request(config) {
            Ok(request) => match self.client.execute_with_timeout(request, timeout).await {
                Ok(response) => provider.response(response, config),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let elapsed = start.elapsed();
        self.metrics
            .record_response_time(name, elapsed.as_millis() as u64);

        match &outcome {
            Ok(results) => {
                self.metrics.record_success(name);
                debug!(
                    "Provider {} returned {} results in {:?}",
                    name,
                    results.len(),
                    elapsed
                );
            }
            Err(e) => self.metrics.record_error(name, e.kind()),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::providers::{Bing, NewsApi};
    use crate::results::ContentType;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_config(name: &str, key: Option<&str>, endpoint: Option<String>) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            api_key: key.map(str::to_string),
            endpoint,
            ..Default::default()
        }
    }

    fn search_with(providers: Vec<Arc<dyn Provider>>) -> Search {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider);
        }
        Search::new(HttpClient::new().unwrap(), Arc::new(registry))
    }

    fn newsapi_body(count: usize) -> serde_json::Value {
        let articles: Vec<_> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Radiohead story {}", i),
                    "url": format!("https://pitchfork.com/news/{}", i),
                    "source": { "name": "Pitchfork" },
                    "publishedAt": "2024-05-02T09:00:00Z",
                    "description": "Something happened."
                })
            })
            .collect();
        serde_json::json!({ "status": "ok", "articles": articles })
    }

    #[tokio::test]
    async fn test_no_providers_uses_synthetic() {
        let search = search_with(vec![]);
        let config = SearchConfig::simple("Radiohead").with_max_results(5);

        let outcome = search.execute(&config).await.unwrap();

        assert_eq!(outcome.origin, ResultOrigin::Synthetic);
        assert_eq!(outcome.results.len(), 5);
        assert!(outcome
            .results
            .iter()
            .all(|r| r.analysis.is_none() && !r.is_analyzing));
        assert!(outcome
            .results
            .iter()
            .all(|r| ContentType::ALL.contains(&r.content_type)));
        assert_eq!(search.metrics().synthetic_fallbacks(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_providers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(newsapi_body(3)))
            .expect(0)
            .mount(&server)
            .await;

        let search = search_with(vec![Arc::new(NewsApi::new(&provider_config(
            "newsapi",
            Some("k"),
            Some(server.uri()),
        )))]);
        let config = SearchConfig::simple("Radiohead").with_dates(
            chrono::NaiveDate::from_ymd_opt(2024, 2, 1),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
        );

        assert!(matches!(
            search.execute(&config).await,
            Err(crate::error::Error::Validation(_))
        ));
        assert_eq!(search.metrics().total_searches(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_failing_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7.0/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(header("X-Api-Key", "news-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(newsapi_body(8)))
            .mount(&server)
            .await;

        let search = search_with(vec![
            Arc::new(Bing::new(&provider_config("bing", Some("k"), Some(server.uri())))),
            Arc::new(NewsApi::new(&provider_config(
                "newsapi",
                Some("news-key"),
                Some(format!("{}/v2/everything", server.uri())),
            ))),
        ]);
        let config = SearchConfig::simple("Radiohead").with_max_results(5);

        let outcome = search.execute(&config).await.unwrap();

        assert_eq!(outcome.origin, ResultOrigin::Provider("newsapi".into()));
        assert_eq!(outcome.results.len(), 5);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].1, ProviderError::Http { status: 500 });
        assert!(outcome.results.iter().all(|r| r.source == "Pitchfork"));
        assert_eq!(search.metrics().reliability("bing"), 0.0);
    }

    #[tokio::test]
    async fn test_empty_provider_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(newsapi_body(0)))
            .mount(&server)
            .await;

        let search = search_with(vec![Arc::new(NewsApi::google_news(&provider_config(
            "google news",
            Some("k"),
            Some(server.uri()),
        )))]);
        let outcome = search
            .execute(&SearchConfig::simple("Radiohead"))
            .await
            .unwrap();

        assert_eq!(outcome.origin, ResultOrigin::Synthetic);
        assert!(outcome.failures.is_empty());
        assert!(!outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_providers_are_skipped() {
        let search = search_with(vec![
            Arc::new(Bing::new(&provider_config("bing", None, None))),
            Arc::new(NewsApi::new(&provider_config("newsapi", Some(""), None))),
        ]);
        let config = SearchConfig::simple("Radiohead").with_max_results(3);

        let outcome = search.execute(&config).await.unwrap();
        assert_eq!(outcome.origin, ResultOrigin::Synthetic);
        assert_eq!(outcome.results.len(), 3);
        assert!(search.metrics().provider_stats().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(newsapi_body(3))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut config = provider_config("newsapi", Some("k"), Some(server.uri()));
        config.timeout = Some(0.05);
        let search = search_with(vec![Arc::new(NewsApi::new(&config))]);

        let outcome = search
            .execute(&SearchConfig::simple("Radiohead"))
            .await
            .unwrap();
        assert_eq!(outcome.origin, ResultOrigin::Synthetic);
        assert_eq!(outcome.failures[0].1.kind(), "transport");
    }

    #[tokio::test]
    async fn test_disabled_fallback_yields_empty() {
        let search = search_with(vec![]).with_synthetic(None);
        let outcome = search
            .execute(&SearchConfig::simple("Radiohead"))
            .await
            .unwrap();
        assert_eq!(outcome.origin, ResultOrigin::Empty);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_flagged() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "articles": [
                { "title": "A", "url": "https://nme.com/a", "source": { "name": "NME" } },
                { "title": "A again", "url": "https://www.nme.com/a/", "source": { "name": "NME" } }
            ]
        });
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let search = search_with(vec![Arc::new(NewsApi::google_news(&provider_config(
            "google news",
            Some("k"),
            Some(server.uri()),
        )))]);
        let outcome = search
            .execute(&SearchConfig::simple("Radiohead"))
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(!outcome.results[0].is_duplicate);
        assert!(outcome.results[1].is_duplicate);
    }
}
