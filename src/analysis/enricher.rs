//! Sequential background enrichment of a result batch

use super::scorer::Scorer;
use crate::results::SearchResult;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Shared flag checked between items
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Whether both handles share one flag
    pub fn same(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Progress notification for one batch.
///
/// `progress` counts successful analyses only, so it never decreases and
/// reaches 1.0 only when every item was analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EnrichmentEvent {
    /// Item is now being analyzed
    Started { index: usize, result: SearchResult },
    /// Item carries its analysis
    Analyzed {
        index: usize,
        result: SearchResult,
        progress: f64,
    },
    /// Item stays unanalyzed
    Failed {
        index: usize,
        result: SearchResult,
        error: String,
        progress: f64,
    },
    /// Every item was analyzed
    Complete { total: usize },
}

/// What happened to a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSummary {
    pub total: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl EnrichmentSummary {
    pub fn progress(&self) -> f64 {
        progress(self.analyzed, self.total)
    }

    pub fn is_complete(&self) -> bool {
        self.analyzed == self.total
    }
}

fn progress(analyzed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        analyzed as f64 / total as f64
    }
}

/// Attaches analyses to results one at a time, in input order
#[derive(Clone)]
pub struct Enricher {
    scorer: Arc<dyn Scorer>,
}

impl Enricher {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &Arc<dyn Scorer> {
        &self.scorer
    }

    /// Enrich `results` in place, reporting every state change to `on_event`
    pub async fn run<F>(
        &self,
        results: &mut [SearchResult],
        cancel: &CancelToken,
        mut on_event: F,
    ) -> EnrichmentSummary
    where
        F: FnMut(EnrichmentEvent),
    {
        let mut summary = EnrichmentSummary {
            total: results.len(),
            ..Default::default()
        };

        for index in 0..results.len() {
            if cancel.is_cancelled() {
                debug!("Enrichment cancelled at item {} of {}", index, summary.total);
                summary.cancelled = true;
                return summary;
            }

            results[index].is_analyzing = true;
            on_event(EnrichmentEvent::Started {
                index,
                result: results[index].clone(),
            });

            let outcome = self.scorer.score(&results[index]).await;
            let result = &mut results[index];
            result.is_analyzing = false;

            match outcome {
                Ok(analysis) => {
                    result.analysis = Some(analysis);
                    summary.analyzed += 1;
                    on_event(EnrichmentEvent::Analyzed {
                        index,
                        result: result.clone(),
                        progress: summary.progress(),
                    });
                }
                Err(e) => {
                    warn!("Analysis failed for result {}: {}", result.id, e);
                    summary.failed += 1;
                    on_event(EnrichmentEvent::Failed {
                        index,
                        result: result.clone(),
                        error: e.to_string(),
                        progress: summary.progress(),
                    });
                }
            }
        }

        if summary.is_complete() {
            on_event(EnrichmentEvent::Complete {
                total: summary.total,
            });
        }
        summary
    }

    /// Enrich on a background task, streaming events
    pub fn spawn(&self, results: Vec<SearchResult>) -> EnrichmentStream {
        self.spawn_with(results, CancelToken::new())
    }

    /// Like [`Enricher::spawn`], sharing an existing token
    pub fn spawn_with(&self, mut results: Vec<SearchResult>, cancel: CancelToken) -> EnrichmentStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let enricher = self.clone();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            enricher
                .run(&mut results, &token, |event| {
                    // receiver gone means nobody is listening any more
                    if tx.send(event).is_err() {
                        token.cancel();
                    }
                })
                .await
        });

        EnrichmentStream {
            rx,
            cancel,
            handle: Some(handle),
        }
    }
}

/// Finite stream of events for one spawned batch.
///
/// Dropping it cancels the batch at the next item boundary.
pub struct EnrichmentStream {
    rx: mpsc::UnboundedReceiver<EnrichmentEvent>,
    cancel: CancelToken,
    handle: Option<JoinHandle<EnrichmentSummary>>,
}

impl EnrichmentStream {
    /// Stop at the next item boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the task and return its summary, discarding unread events
    pub async fn summary(mut self) -> Option<EnrichmentSummary> {
        let handle = self.handle.take()?;
        handle.await.ok()
    }
}

impl Stream for EnrichmentStream {
    type Item = EnrichmentEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for EnrichmentStream {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}
