//! Application state shared across handlers

use crate::analysis::{build_scorer, CancelToken, Enricher, EnrichmentEvent, Scorer};
use crate::auth::SessionSigner;
use crate::config::Settings;
use crate::history::{HistoryStore, MemoryHistoryStore};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::ProviderRegistry;
use crate::results::SearchResult;
use crate::search::{Search, SyntheticGenerator};
use crate::usage::{MemoryUsageStore, UsageStore};
use axum::extract::FromRef;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Provider registry
    pub registry: Arc<ProviderRegistry>,
    /// Search executor
    pub search: Arc<Search>,
    /// Background analysis
    pub enricher: Enricher,
    pub history: Arc<dyn HistoryStore>,
    pub usage: Arc<dyn UsageStore>,
    pub signer: Arc<SessionSigner>,
    pub metrics: Arc<Metrics>,
    batches: Arc<ActiveBatches>,
}

impl AppState {
    /// Create new application state with in-memory stores
    pub fn new(
        settings: Settings,
        registry: ProviderRegistry,
        client: HttpClient,
    ) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let registry = Arc::new(registry);
        let search = Search::new(client.clone(), registry.clone())
            .with_metrics(metrics.clone())
            .with_synthetic(SyntheticGenerator::from_settings(&settings.search));
        let scorer = build_scorer(&settings.analysis, client);

        Ok(Self {
            signer: Arc::new(SessionSigner::new(&settings.server.secret_key)),
            usage: Arc::new(MemoryUsageStore::new(settings.limits.clone())),
            history: Arc::new(MemoryHistoryStore::new()),
            enricher: Enricher::new(scorer),
            search: Arc::new(search),
            settings: Arc::new(settings),
            registry,
            metrics,
            batches: Arc::new(ActiveBatches::default()),
        })
    }

    /// Replace the analysis backend
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.enricher = Enricher::new(scorer);
        self
    }

    /// Replace the persistence collaborators
    pub fn with_stores(mut self, history: Arc<dyn HistoryStore>, usage: Arc<dyn UsageStore>) -> Self {
        self.history = history;
        self.usage = usage;
        self
    }

    /// Public link for a share token
    pub fn share_url(&self, token: &str) -> String {
        format!(
            "{}/shared/{}",
            self.settings.general.app_url.trim_end_matches('/'),
            token
        )
    }

    /// Whether a batch is still enriching the given search
    pub fn is_enriching(&self, user_id: &str, search_id: &str) -> bool {
        self.batches.is_active(user_id, search_id)
    }

    /// Enrich a stored search in the background, writing each item back.
    ///
    /// Any batch the user already has running is cancelled first.
    pub fn start_enrichment(&self, user_id: &str, search_id: &str, results: Vec<SearchResult>) {
        let token = CancelToken::new();
        if let Some(previous) = self.batches.replace(user_id, search_id, token.clone()) {
            debug!("Cancelling previous enrichment for user {}", user_id);
            previous.cancel();
        }

        let mut stream = self.enricher.spawn_with(results, token.clone());
        let history = self.history.clone();
        let batches = self.batches.clone();
        let user_id = user_id.to_string();
        let search_id = search_id.to_string();

        tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let (index, result) = match event {
                    EnrichmentEvent::Started { index, result }
                    | EnrichmentEvent::Analyzed { index, result, .. }
                    | EnrichmentEvent::Failed { index, result, .. } => (index, result),
                    EnrichmentEvent::Complete { total } => {
                        debug!("Enrichment of {} complete ({} items)", search_id, total);
                        continue;
                    }
                };
                if let Err(e) = history.update_result(&search_id, index, result).await {
                    // the entry was deleted under us
                    warn!("Stopping enrichment of {}: {}", search_id, e);
                    stream.cancel();
                    break;
                }
            }
            batches.finish(&user_id, &token);
        });
    }
}

impl FromRef<AppState> for Arc<SessionSigner> {
    fn from_ref(state: &AppState) -> Self {
        state.signer.clone()
    }
}

struct ActiveBatch {
    search_id: String,
    token: CancelToken,
}

/// At most one live enrichment batch per user
#[derive(Default)]
struct ActiveBatches {
    by_user: Mutex<HashMap<String, ActiveBatch>>,
}

impl ActiveBatches {
    /// Register a batch, returning the token of the one it displaces
    fn replace(&self, user_id: &str, search_id: &str, token: CancelToken) -> Option<CancelToken> {
        let mut map = self.by_user.lock().ok()?;
        map.insert(
            user_id.to_string(),
            ActiveBatch {
                search_id: search_id.to_string(),
                token,
            },
        )
        .map(|b| b.token)
    }

    /// Forget a finished batch unless a newer one took its place
    fn finish(&self, user_id: &str, token: &CancelToken) {
        if let Ok(mut map) = self.by_user.lock() {
            if map.get(user_id).is_some_and(|b| b.token.same(token)) {
                map.remove(user_id);
            }
        }
    }

    fn is_active(&self, user_id: &str, search_id: &str) -> bool {
        self.by_user
            .lock()
            .map(|map| {
                map.get(user_id)
                    .is_some_and(|b| b.search_id == search_id && !b.token.is_cancelled())
            })
            .unwrap_or(false)
    }
}
