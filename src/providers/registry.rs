//! Provider registry holding the fallback chain

use super::traits::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of search providers, kept in priority order
pub struct ProviderRegistry {
    /// Providers in the order they are tried
    providers: Vec<Arc<dyn Provider>>,
    /// Index by name
    by_name: HashMap<String, usize>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a provider at the end of the chain.
    ///
    /// A provider registered under an existing name replaces it in place.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        match self.by_name.get(&name) {
            Some(&idx) => self.providers[idx] = provider,
            None => {
                self.by_name.insert(name, self.providers.len());
                self.providers.push(provider);
            }
        }
    }

    /// Providers holding credentials, in priority order
    pub fn available(&self) -> Vec<Arc<dyn Provider>> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .cloned()
            .collect()
    }

    /// Get all provider names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Get number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::providers::{Bing, NewsApi};

    fn provider_config(name: &str, key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name: name.to_string(),
            api_key: key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_registry_keeps_priority_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Bing::new(&provider_config("bing", None))));
        registry.register(Arc::new(NewsApi::new(&provider_config("newsapi", Some("k")))));
        registry.register(Arc::new(NewsApi::google_news(&provider_config("gnews", Some("k")))));

        assert_eq!(registry.names(), ["bing", "newsapi", "gnews"]);
        let available: Vec<String> = registry
            .available()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(available, ["newsapi", "gnews"]);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Bing::new(&provider_config("bing", None))));
        registry.register(Arc::new(Bing::new(&provider_config("bing", Some("k")))));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.available().len(), 1);
    }
}
