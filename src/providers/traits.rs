//! Provider traits and types

use crate::results::SearchResult;
use crate::search::SearchConfig;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use url::Url;

/// Why a provider could not supply results.
///
/// None of these are fatal: the orchestrator logs them and moves on to the
/// next provider in the chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Credentials or endpoint missing
    #[error("provider not configured: {0}")]
    Configuration(String),
    /// Non-2xx response from the external API
    #[error("provider returned HTTP {status}")]
    Http { status: u16 },
    /// Network failure or timeout
    #[error("transport error: {0}")]
    Transport(String),
    /// Response body could not be decoded
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Short machine-readable kind, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Http { .. } => "http",
            Self::Transport(_) => "transport",
            Self::Parse(_) => "parse",
        }
    }
}

/// HTTP request to be made on behalf of a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters, in order
    pub params: Vec<(String, String)>,
    /// JSON body
    pub body: Option<serde_json::Value>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: Vec::new(),
            body: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add JSON body
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a query parameter
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP response from a provider request
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ProviderResponse {
    /// Build a response by hand (used by tests and fixtures)
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            text: text.into(),
            url: String::new(),
        }
    }

    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_str(&self.text).map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with `ProviderError::Http` unless 2xx
    pub fn error_for_status(self) -> Result<Self, ProviderError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProviderError::Http {
                status: self.status,
            })
        }
    }
}

/// A keyword-search API that can feed the orchestrator.
///
/// Building the request and parsing the response are kept apart from the
/// transport so both halves can be exercised without a network.
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Whether credentials are present; unconfigured providers are skipped
    fn is_configured(&self) -> bool;

    /// Per-call timeout override in seconds
    fn timeout(&self) -> Option<f64> {
        None
    }

    /// Build the HTTP request for a search
    fn request(&self, config: &SearchConfig) -> Result<ProviderRequest, ProviderError>;

    /// Parse the HTTP response into at most `config.max_results` results
    fn response(
        &self,
        response: ProviderResponse,
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>, ProviderError>;
}

/// Derive a publication name from a result URL.
///
/// `https://www.rolling-stone.com/x` becomes `Rolling Stone`. When the URL
/// does not parse, the first segment of the display URL is used, then
/// `Unknown`.
pub fn source_from_url(url: &str, display_url: Option<&str>) -> String {
    if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        let host = host.strip_prefix("www.").unwrap_or(&host);
        if let Some(label) = host.split('.').next().filter(|l| !l.is_empty()) {
            return label
                .split('-')
                .filter(|w| !w.is_empty())
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    display_url
        .and_then(|d| d.split('/').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown".to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalize a provider timestamp to UTC, defaulting to now.
///
/// Offset-less timestamps (Bing omits the zone) are read as UTC.
pub fn parse_publish_date(raw: Option<&str>) -> DateTime<Utc> {
    raw.map(str::trim)
        .and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .map(|d| d.and_utc())
                })
                .ok()
        })
        .unwrap_or_else(Utc::now)
}
