//! Scorer trait and the random scorer

use crate::results::{AnalysisResult, SearchResult, Sentiment};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Why a single result could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// Backend not configured or refused the work
    #[error("analysis backend unavailable: {0}")]
    Unavailable(String),
    #[error("analysis backend returned HTTP {status}")]
    Http { status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    /// Reply could not be turned into an analysis
    #[error("failed to parse analysis: {0}")]
    Parse(String),
}

/// Produces an analysis record for one result
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Scorer name
    fn name(&self) -> &str;

    /// Analyze a single result
    async fn score(&self, result: &SearchResult) -> Result<AnalysisResult, AnalysisError>;
}

/// Labels themes are drawn from
pub const THEMES: [&str; 12] = [
    "sonic evolution",
    "production quality",
    "lyrical depth",
    "genre-bending",
    "vocal performance",
    "instrumentation",
    "commercial appeal",
    "artistic growth",
    "cultural impact",
    "live performance",
    "collaboration",
    "innovation",
];

/// Canned summary for a sentiment
pub fn summary_for(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => {
            "Highly favorable coverage that stresses artistic merit and innovation. A strong recommendation from the publication."
        }
        Sentiment::Negative => {
            "Critical assessment that points to weak execution and an uncertain artistic direction."
        }
        Sentiment::Neutral => {
            "Balanced coverage weighing strengths against areas for improvement."
        }
        Sentiment::Mixed => {
            "Divided opinion, with praise for some aspects and criticism of others."
        }
    }
}

/// Drop repeated themes, keeping first occurrence order
pub fn dedup_themes<I, S>(themes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for theme in themes {
        let theme = theme.into();
        if !theme.trim().is_empty() && !out.contains(&theme) {
            out.push(theme);
        }
    }
    out
}

/// Scores results with uniformly random values.
///
/// Sentiment is uniform over the four values, relevance falls in 70..=99 and
/// authority in 60..=99. Two to four theme draws are made, then deduplicated.
pub struct RandomScorer {
    rng: Mutex<StdRng>,
    /// Simulated latency range in milliseconds
    delay_ms: Option<(u64, u64)>,
}

impl RandomScorer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            delay_ms: None,
        }
    }

    /// Deterministic scorer for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            delay_ms: None,
        }
    }

    /// Sleep for a random duration in `min..=max` ms before each score
    pub fn with_delay(mut self, delay_ms: Option<(u64, u64)>) -> Self {
        self.delay_ms = delay_ms.map(|(a, b)| (a.min(b), a.max(b)));
        self
    }

    fn draw(&self) -> Result<(AnalysisResult, Option<Duration>), AnalysisError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AnalysisError::Unavailable("random scorer poisoned".into()))?;

        let delay = self
            .delay_ms
            .map(|(min, max)| Duration::from_millis(rng.gen_range(min..=max)));
        let sentiment = *Sentiment::ALL
            .choose(&mut *rng)
            .unwrap_or(&Sentiment::Neutral);
        let draws = rng.gen_range(2..=4);
        let themes = dedup_themes(
            (0..draws).filter_map(|_| THEMES.choose(&mut *rng).copied()),
        );

        let analysis = AnalysisResult {
            sentiment,
            relevance_score: rng.gen_range(70..=99),
            authority: rng.gen_range(60..=99),
            themes,
            summary: summary_for(sentiment).to_string(),
        };
        Ok((analysis, delay))
    }
}

impl Default for RandomScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for RandomScorer {
    fn name(&self) -> &str {
        "random"
    }

    async fn score(&self, _result: &SearchResult) -> Result<AnalysisResult, AnalysisError> {
        let (analysis, delay) = self.draw()?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_random_scores_in_range() {
        let scorer = RandomScorer::seeded(42);
        let result = SearchResult::new("https://pitchfork.com/a", "A", "Pitchfork");

        for _ in 0..200 {
            let analysis = scorer.score(&result).await.unwrap();
            assert!((70..=99).contains(&analysis.relevance_score));
            assert!((60..=99).contains(&analysis.authority));
            assert!((1..=4).contains(&analysis.themes.len()));
            assert!(analysis.themes.iter().all(|t| THEMES.contains(&t.as_str())));
            assert_eq!(analysis.summary, summary_for(analysis.sentiment));
            let mut themes = analysis.themes.clone();
            themes.sort();
            themes.dedup();
            assert_eq!(themes.len(), analysis.themes.len());
        }
    }

    #[tokio::test]
    async fn test_seeded_is_deterministic() {
        let result = SearchResult::new("https://nme.com/a", "A", "NME");
        let a = RandomScorer::seeded(9).score(&result).await.unwrap();
        let b = RandomScorer::seeded(9).score(&result).await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedup_themes() {
        assert_eq!(
            dedup_themes(["innovation", "collaboration", "innovation", " "]),
            vec!["innovation".to_string(), "collaboration".to_string()]
        );
    }

    #[test]
    fn test_delay_range_ordered() {
        let scorer = RandomScorer::seeded(1).with_delay(Some((20, 5)));
        assert_eq!(scorer.delay_ms, Some((5, 20)));
    }
}
