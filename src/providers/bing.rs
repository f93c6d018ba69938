//! Bing Web Search API (v7) provider

use super::traits::*;
use crate::config::ProviderConfig;
use crate::results::{classify, SearchResult};
use crate::search::SearchConfig;
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://api.bing.microsoft.com";
const SEARCH_PATH: &str = "/v7.0/search";
/// Appended to every query to bias results toward music press coverage
const QUERY_SUFFIX: &str = "music press review article";
/// Bing rejects larger `count` values
const MAX_COUNT: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingResponse {
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPage {
    name: String,
    url: String,
    #[serde(default)]
    snippet: String,
    date_published: Option<String>,
    #[serde(default)]
    display_url: String,
}

/// Bing web search provider
pub struct Bing {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<f64>,
}

impl Bing {
    pub fn new(config: &ProviderConfig) -> Self {
        let base = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        Self {
            name: config.name.clone(),
            endpoint: Self::search_endpoint(base),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: config.timeout,
        }
    }

    /// Make sure the endpoint points at the v7 search path
    fn search_endpoint(base: &str) -> String {
        if base.contains(SEARCH_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base.trim_end_matches('/'), SEARCH_PATH)
        }
    }
}

impl Provider for Bing {
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
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::Configuration("Bing API key not configured".into()))?;

        let mut request = ProviderRequest::get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .param("q", format!("{} {}", config.query, QUERY_SUFFIX))
            .param("count", config.max_results.min(MAX_COUNT).to_string())
            .param("responseFilter", "WebPages");

        // Bing only knows Day/Week/Month, so any explicit range maps to Month
        if config.date_from.is_some() || config.date_to.is_some() {
            request = request.param("freshness", "Month");
        }

        Ok(request)
    }

    fn response(
        &self,
        response: ProviderResponse,
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let response = response.error_for_status()?;
        let data: BingResponse = response.json()?;

        let pages = match data.web_pages {
            Some(pages) => pages.value,
            None => return Ok(Vec::new()),
        };

        Ok(pages
            .into_iter()
            .take(config.max_results)
            .map(|page| {
                let source = source_from_url(&page.url, Some(&page.display_url));
                let content_type = classify(&page.name, &page.snippet);
                SearchResult::new(page.url, page.name, source)
                    .with_snippet(page.snippet)
                    .with_publish_date(parse_publish_date(page.date_published.as_deref()))
                    .with_content_type(content_type)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ContentType;

    fn bing(api_key: Option<&str>) -> Bing {
        Bing::new(&ProviderConfig {
            name: "bing".to_string(),
            engine: "bing".to_string(),
            api_key: api_key.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let provider = bing(None);
        assert!(!provider.is_configured());
        let err = provider.request(&SearchConfig::simple("Radiohead")).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_bing_request() {
        let provider = bing(Some("key"));
        let mut config = SearchConfig::simple("Radiohead");
        config.max_results = 15;
        let request = provider.request(&config).unwrap();

        assert_eq!(request.url, "https://api.bing.microsoft.com/v7.0/search");
        assert_eq!(request.get_param("q"), Some("Radiohead music press review article"));
        assert_eq!(request.get_param("count"), Some("15"));
        assert_eq!(request.get_param("freshness"), None);
        assert_eq!(
            request.headers.get("Ocp-Apim-Subscription-Key").map(String::as_str),
            Some("key")
        );

        config.max_results = 200;
        let request = provider.request(&config).unwrap();
        assert_eq!(request.get_param("count"), Some("50"));

        config.date_from = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
        let request = provider.request(&config).unwrap();
        assert_eq!(request.get_param("freshness"), Some("Month"));
    }

    #[test]
    fn test_endpoint_normalization() {
        assert_eq!(
            Bing::search_endpoint("https://example.cognitive.azure.com/"),
            "https://example.cognitive.azure.com/v7.0/search"
        );
        assert_eq!(
            Bing::search_endpoint("https://x.test/v7.0/search"),
            "https://x.test/v7.0/search"
        );
    }

    #[test]
    fn test_bing_response() {
        let body = serde_json::json!({
            "webPages": {
                "value": [
                    {
                        "name": "Radiohead: OK Computer review",
                        "url": "https://www.rolling-stone.com/music/ok-computer",
                        "snippet": "A landmark record",
                        "datePublished": "2024-01-15T12:30:00.0000000Z",
                        "displayUrl": "rolling-stone.com/music"
                    },
                    {
                        "name": "Thom Yorke talks to us",
                        "url": "https://pitchfork.com/interviews/thom",
                        "snippet": "",
                        "displayUrl": "pitchfork.com/interviews"
                    },
                    {
                        "name": "Third",
                        "url": "https://nme.com/third",
                        "displayUrl": "nme.com"
                    }
                ]
            }
        });
        let provider = bing(Some("key"));
        let mut config = SearchConfig::simple("Radiohead");
        config.max_results = 2;

        let results = provider
            .response(ProviderResponse::new(200, body.to_string()), &config)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "Rolling Stone");
        assert_eq!(results[0].content_type, ContentType::Review);
        assert_eq!(results[1].source, "Pitchfork");
        assert_eq!(results[1].content_type, ContentType::Interview);
        assert_ne!(results[0].id, results[1].id);
        assert!(results.iter().all(|r| r.analysis.is_none() && !r.is_analyzing));
    }

    #[test]
    fn test_bing_response_without_pages() {
        let provider = bing(Some("key"));
        let results = provider
            .response(
                ProviderResponse::new(200, "{}"),
                &SearchConfig::simple("Radiohead"),
            )
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_bing_http_error() {
        let provider = bing(Some("key"));
        let err = provider
            .response(
                ProviderResponse::new(401, "{\"error\":\"denied\"}"),
                &SearchConfig::simple("Radiohead"),
            )
            .unwrap_err();
        assert_eq!(err, ProviderError::Http { status: 401 });
    }
}
