//! NewsAPI.org providers
//!
//! Two flavours share the `/v2/everything` endpoint: the music-biased NewsAPI
//! provider and the general "Google News" provider.

use super::traits::*;
use crate::config::ProviderConfig;
use crate::results::{classify, SearchResult};
use crate::search::SearchConfig;
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";
/// NewsAPI rejects larger page sizes
const MAX_PAGE_SIZE: usize = 100;
const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(default)]
    title: String,
    url: String,
    source: Option<ArticleSource>,
    published_at: Option<String>,
    description: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// NewsAPI "everything" search
pub struct NewsApi {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<f64>,
    /// Appended to the user's query
    query_suffix: Option<&'static str>,
    /// Source ids used when the search names none
    default_sources: Option<&'static str>,
}

impl NewsApi {
    /// Music-biased NewsAPI search
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            query_suffix: Some("music"),
            default_sources: Some("pitchfork,rolling-stone,the-guardian,nme"),
            ..Self::base(config)
        }
    }

    /// Plain query against the same index, without source restrictions
    pub fn google_news(config: &ProviderConfig) -> Self {
        Self::base(config)
    }

    fn base(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: config.timeout,
            query_suffix: None,
            default_sources: None,
        }
    }

    fn snippet(article: &Article) -> String {
        match article.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => description.to_string(),
            None => article
                .content
                .as_deref()
                .map(|c| c.chars().take(SNIPPET_CHARS).collect())
                .unwrap_or_default(),
        }
    }
}

impl Provider for NewsApi {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn timeout(&self) -> Option<f64> {
        self.timeout
    }

    fn request(&self, config: &SearchConfig) -> Result<ProviderRequest, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            ProviderError::Configuration(format!("{} API key not configured", self.name))
        })?;

        let query = match self.query_suffix {
            Some(suffix) => format!("{} {}", config.query, suffix),
            None => config.query.clone(),
        };

        let mut request = ProviderRequest::get(&self.endpoint)
            .header("X-Api-Key", api_key)
            .param("q", query)
            .param("sortBy", "relevancy")
            .param("pageSize", config.max_results.min(MAX_PAGE_SIZE).to_string());

        if self.default_sources.is_some() {
            let sources = match config.sources.as_deref() {
                Some(sources) if !sources.is_empty() => sources.join(","),
                _ => self.default_sources.unwrap_or_default().to_string(),
            };
            request = request.param("sources", sources);
        }
        if let Some(from) = config.date_from {
            request = request.param("from", from.to_string());
        }
        if let Some(to) = config.date_to {
            request = request.param("to", to.to_string());
        }

        Ok(request)
    }

    fn response(
        &self,
        response: ProviderResponse,
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let response = response.error_for_status()?;
        let data: NewsApiResponse = response.json()?;

        Ok(data
            .articles
            .into_iter()
            .filter(|a| !a.url.is_empty())
            .take(config.max_results)
            .map(|article| {
                let snippet = Self::snippet(&article);
                let source = article
                    .source
                    .as_ref()
                    .and_then(|s| s.name.clone())
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| source_from_url(&article.url, None));
                let content_type =
                    classify(&article.title, article.description.as_deref().unwrap_or(""));
                SearchResult::new(article.url, article.title, source)
                    .with_snippet(snippet)
                    .with_publish_date(parse_publish_date(article.published_at.as_deref()))
                    .with_content_type(content_type)
            })
            .collect())
    }
}
