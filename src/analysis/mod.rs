//! Result analysis
//!
//! A [`Scorer`] produces the analysis record for one result; the
//! [`Enricher`] runs a scorer over a whole batch, one item at a time.

mod enricher;
mod llm;
mod scorer;

pub use enricher::{CancelToken, Enricher, EnrichmentEvent, EnrichmentStream, EnrichmentSummary};
pub use llm::LlmScorer;
pub use scorer::{dedup_themes, summary_for, AnalysisError, RandomScorer, Scorer, THEMES};

use crate::cache::CachedScorer;
use crate::config::{AnalysisSettings, ScorerKind};
use crate::network::HttpClient;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the configured scorer, wrapped in the analysis cache
pub fn build_scorer(settings: &AnalysisSettings, client: HttpClient) -> Arc<dyn Scorer> {
    let cache_ttl = settings.cache_ttl;
    let cache_capacity = settings.cache_capacity;

    match settings.scorer {
        ScorerKind::Llm if settings.llm.api_key.is_some() => {
            info!("Using LLM scorer ({})", settings.llm.model);
            Arc::new(CachedScorer::new(
                LlmScorer::new(client, &settings.llm),
                cache_ttl,
                cache_capacity,
            ))
        }
        kind => {
            if kind == ScorerKind::Llm {
                warn!("LLM scorer selected without an API key, using random scorer");
            }
            info!("Using random scorer");
            Arc::new(CachedScorer::new(
                RandomScorer::new().with_delay(settings.delay_ms),
                cache_ttl,
                cache_capacity,
            ))
        }
    }
}
