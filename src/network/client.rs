//! HTTP client for making requests to search providers

use crate::config::OutgoingSettings;
use crate::providers::{HttpMethod, ProviderError, ProviderRequest, ProviderResponse};
use anyhow::Result;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client wrapper with per-call timeouts
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    max_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;
        let max_timeout = Duration::from_secs_f64(settings.max_request_timeout.max(0.001));

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout.max(0.001))
                .min(max_timeout),
            max_timeout,
            user_agent: format!("press-review/{}", crate::VERSION),
        })
    }

    /// Effective timeout for a call, honoring an override capped by the maximum
    pub fn timeout_for(&self, override_secs: Option<f64>) -> Duration {
        override_secs
            .filter(|t| *t > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(self.default_timeout)
            .min(self.max_timeout)
    }

    /// Execute a provider request with the default timeout
    pub async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.execute_with_timeout(request, self.default_timeout).await
    }

    /// Execute a provider request with custom timeout.
    ///
    /// Network failures and timeouts both surface as `ProviderError::Transport`.
    pub async fn execute_with_timeout(
        &self,
        request: ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.json(&body);
        }

        let response = req_builder.send().await.map_err(transport_error)?;

        Self::parse_response(response).await
    }

    /// Parse response into ProviderResponse
    async fn parse_response(response: Response) -> Result<ProviderResponse, ProviderError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await.map_err(transport_error)?;

        Ok(ProviderResponse {
            status,
            headers,
            text,
            url,
        })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Transport(format!("request timed out: {}", e))
    } else {
        ProviderError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_timeout_capped() {
        let settings = OutgoingSettings {
            request_timeout: 5.0,
            max_request_timeout: 8.0,
            ..Default::default()
        };
        let client = HttpClient::with_settings(&settings).unwrap();
        assert_eq!(client.timeout_for(None), Duration::from_secs(5));
        assert_eq!(client.timeout_for(Some(2.0)), Duration::from_secs(2));
        assert_eq!(client.timeout_for(Some(60.0)), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_execute_sends_params_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "radiohead"))
            .and(header("X-Api-Key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = ProviderRequest::get(format!("{}/search", server.uri()))
            .param("q", "radiohead")
            .header("X-Api-Key", "k");
        let response = client.execute(request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .execute_with_timeout(
                ProviderRequest::get(server.uri()),
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
