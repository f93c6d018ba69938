//! Provider loader for building the chain from configuration

use super::registry::ProviderRegistry;
use super::traits::Provider;
use super::{bing, newsapi};
use crate::config::{ProviderConfig, Settings};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing providers from configuration
pub struct ProviderLoader;

impl ProviderLoader {
    /// Load all enabled providers from settings, preserving their order
    pub fn load(settings: &Settings) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();

        for config in &settings.providers {
            if config.disabled {
                info!("Skipping disabled provider: {}", config.name);
                continue;
            }

            match Self::create_provider(config) {
                Ok(provider) => {
                    if provider.is_configured() {
                        info!("Loaded provider: {} ({})", config.name, config.engine);
                    } else {
                        info!(
                            "Loaded provider without credentials: {} ({}), it will be skipped",
                            config.name, config.engine
                        );
                    }
                    registry.register(provider);
                }
                Err(e) => {
                    warn!("Failed to load provider {}: {}", config.name, e);
                }
            }
        }

        Ok(registry)
    }

    /// Create a provider instance by adapter type
    fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
        let provider: Arc<dyn Provider> = match config.engine.as_str() {
            "bing" => Arc::new(bing::Bing::new(config)),
            "newsapi" => Arc::new(newsapi::NewsApi::new(config)),
            "google_news" => Arc::new(newsapi::NewsApi::google_news(config)),
            other => {
                return Err(anyhow::anyhow!("Unknown provider type: {}", other));
            }
        };
        Ok(provider)
    }
}
