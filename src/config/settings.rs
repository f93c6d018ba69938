//! Settings structures for press-review configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    /// Search providers in priority order
    pub providers: Vec<ProviderConfig>,
    pub search: SearchSettings,
    pub analysis: AnalysisSettings,
    pub limits: LimitSettings,
    pub history: HistorySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            providers: default_providers(),
            search: SearchSettings::default(),
            analysis: AnalysisSettings::default(),
            limits: LimitSettings::default(),
            history: HistorySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup (PRESS_REVIEW_* plus provider keys)
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PRESS_REVIEW_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = lookup("PRESS_REVIEW_SECRET_KEY") {
            self.server.secret_key = val;
        }
        if let Some(val) = lookup("PRESS_REVIEW_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("PRESS_REVIEW_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = lookup("PRESS_REVIEW_APP_URL") {
            self.general.app_url = val;
        }

        for provider in &mut self.providers {
            let (key_var, endpoint_var) = match provider.engine.as_str() {
                "bing" => ("BING_API_KEY", Some("BING_ENDPOINT")),
                "newsapi" => ("NEWS_API_KEY", None),
                "google_news" => ("GOOGLE_NEWS_API_KEY", None),
                _ => continue,
            };
            if let Some(key) = lookup(key_var).filter(|k| !k.trim().is_empty()) {
                provider.api_key = Some(key);
            }
            if let Some(endpoint) = endpoint_var.and_then(|v| lookup(v)) {
                provider.endpoint = Some(endpoint);
            }
        }

        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.analysis.llm.api_key = Some(key);
        }
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by /health and printed on PDF exports
    pub instance_name: String,
    /// Public base URL, used to build share links
    pub app_url: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Press Review".to_string(),
            app_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Key used to verify session tokens
    pub secret_key: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "127.0.0.1".to_string(),
            secret_key: generate_secret_key(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Upper bound for any per-provider timeout
    pub max_request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            max_request_timeout: 30.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual search provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Adapter to use: bing, newsapi or google_news
    pub engine: String,
    /// Whether the provider is disabled
    pub disabled: bool,
    /// API credentials; a provider without them is skipped
    pub api_key: Option<String>,
    /// Endpoint override
    pub endpoint: Option<String>,
    /// Custom timeout for this provider in seconds
    pub timeout: Option<f64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            disabled: false,
            api_key: None,
            endpoint: None,
            timeout: None,
        }
    }
}

impl ProviderConfig {
    /// Whether credentials are present
    pub fn has_credentials(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Search orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Generate synthetic results when no provider yields any
    pub synthetic_fallback: bool,
    /// Lower bound of the synthetic batch size
    pub synthetic_min: usize,
    /// Upper bound of the synthetic batch size
    pub synthetic_max: usize,
    /// How far back synthetic publish dates may go
    pub backdate_days: i64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            synthetic_fallback: true,
            synthetic_min: 10,
            synthetic_max: 24,
            backdate_days: 60,
        }
    }
}

/// Which scorer backs enrichment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    Random,
    Llm,
}

/// Analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub scorer: ScorerKind,
    /// Simulated scoring latency in milliseconds (random scorer only)
    pub delay_ms: Option<(u64, u64)>,
    /// Analysis cache TTL in seconds
    pub cache_ttl: u64,
    /// Analysis cache capacity
    pub cache_capacity: u64,
    pub llm: LlmSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            scorer: ScorerKind::Random,
            delay_ms: None,
            cache_ttl: 3600,
            cache_capacity: 10_000,
            llm: LlmSettings::default(),
        }
    }
}

/// OpenAI-compatible chat completions backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
        }
    }
}

/// Default monthly quotas for new users
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub max_searches: u32,
    pub max_exports: u32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_searches: 50,
            max_exports: 20,
        }
    }
}

/// History settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Entries returned by a history listing
    pub display_limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { display_limit: 20 }
    }
}

/// Generate a random secret key
fn generate_secret_key() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}

/// Default provider chain, none of which has credentials until configured
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "bing".to_string(),
            engine: "bing".to_string(),
            ..Default::default()
        },
        ProviderConfig {
            name: "newsapi".to_string(),
            engine: "newsapi".to_string(),
            ..Default::default()
        },
        ProviderConfig {
            name: "google news".to_string(),
            engine: "google_news".to_string(),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert!(!settings.general.debug);
        assert_eq!(settings.providers.len(), 3);
        assert!(settings.providers.iter().all(|p| !p.has_credentials()));
        assert_eq!(settings.history.display_limit, 20);
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
server:
  port: 8080
providers:
  - name: news
    engine: newsapi
    api_key: abc
    timeout: 3.5
analysis:
  scorer: llm
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.bind_address, "127.0.0.1");
        assert_eq!(settings.providers.len(), 1);
        assert!(settings.get_provider("news").unwrap().has_credentials());
        assert_eq!(settings.analysis.scorer, ScorerKind::Llm);
    }

    #[test]
    fn test_env_merge() {
        let vars: HashMap<&str, &str> = [
            ("PRESS_REVIEW_PORT", "9999"),
            ("BING_API_KEY", "bing-key"),
            ("BING_ENDPOINT", "https://bing.test"),
            ("NEWS_API_KEY", "  "),
            ("OPENAI_API_KEY", "sk-test"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.merge_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(settings.server.port, 9999);
        let bing = settings.get_provider("bing").unwrap();
        assert_eq!(bing.api_key.as_deref(), Some("bing-key"));
        assert_eq!(bing.endpoint.as_deref(), Some("https://bing.test"));
        assert!(!settings.get_provider("newsapi").unwrap().has_credentials());
        assert_eq!(settings.analysis.llm.api_key.as_deref(), Some("sk-test"));
    }
}
