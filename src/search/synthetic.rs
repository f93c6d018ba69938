//! Synthetic results used when no provider yields anything

use super::models::SearchConfig;
use crate::config::SearchSettings;
use crate::results::{ContentType, SearchResult};
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

/// Publications synthetic results are attributed to
pub const SOURCES: [&str; 8] = [
    "Pitchfork",
    "Rolling Stone",
    "NME",
    "The Guardian",
    "Stereogum",
    "Consequence",
    "Brooklyn Vegan",
    "DIY Magazine",
];

const SNIPPETS: [&str; 5] = [
    "A close listen to {q}'s latest work turns up a striking mix of influences. The production rewards attention to detail...",
    "{q} keeps pushing at the edges of their songwriting and stage craft. Critics are calling this the most mature record yet...",
    "What sets {q} apart is a stubborn commitment to sounding like nobody else. The new release shows both technique and feeling...",
    "Watching {q} grow as an artist has been remarkable. The new material breaks from the early records while keeping...",
    "With this release {q} cements a place among the most important voices in music today. The critical response has been...",
];

fn title_templates(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Review => &[
            "{q} Album Review: A Bold New Direction",
            "Review: {q} Returns With Ambitious New Work",
            "{q}'s Latest, Reviewed Track by Track",
            "{q} Live Review: A Night to Remember",
        ],
        ContentType::Interview => &[
            "{q} Talks to Us About the New Album",
            "In Conversation: {q}",
            "Interview: {q} on Craft and Inspiration",
            "{q} Talks to Us About the Road Ahead",
        ],
        ContentType::News => &[
            "{q} Announces New Album",
            "{q} Releases Surprise Single",
            "Breaking: {q} Signs Major Deal",
            "{q} Announces Headline Festival Slot",
        ],
        ContentType::Feature => &[
            "Feature: The Rise of {q}",
            "A Deep Dive Into {q}'s Back Catalogue",
            "Feature: {q} and the Future of Music",
            "The {q} Story, a Deep Dive",
        ],
        ContentType::Article => &[
            "{q}: The Artist Redefining Modern Music",
            "How {q} Changed the Game",
            "{q}'s Impact on Contemporary Sound",
            "Why {q} Matters Now More Than Ever",
        ],
    }
}

/// Generates plausible, clearly fake results keyed on the query
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    min: usize,
    max: usize,
    backdate_days: i64,
}

impl SyntheticGenerator {
    pub fn new(min: usize, max: usize, backdate_days: i64) -> Self {
        let min = min.max(1);
        Self {
            min,
            max: max.max(min),
            backdate_days: backdate_days.max(1),
        }
    }

    /// Build from settings; `None` when the fallback is disabled
    pub fn from_settings(settings: &SearchSettings) -> Option<Self> {
        settings.synthetic_fallback.then(|| {
            Self::new(
                settings.synthetic_min,
                settings.synthetic_max,
                settings.backdate_days,
            )
        })
    }

    /// Generate `min(max_results, uniform min..=max)` results
    pub fn generate<R: Rng + ?Sized>(&self, config: &SearchConfig, rng: &mut R) -> Vec<SearchResult> {
        let query = config.query.trim();
        let types = config.requested_content_types();
        let count = config.max_results.min(rng.gen_range(self.min..=self.max));
        let now = Utc::now();

        (0..count)
            .map(|i| {
                let content_type = *types.choose(rng).unwrap_or(&ContentType::Article);
                let title = fill(pick(title_templates(content_type), rng), query);
                let snippet = fill(pick(&SNIPPETS, rng), query);
                let source = pick(&SOURCES, rng);
                let days_ago = rng.gen_range(0..self.backdate_days);

                SearchResult::new(format!("https://example.com/article-{}", i), title, source)
                    .with_snippet(snippet)
                    .with_publish_date(now - Duration::days(days_ago))
                    .with_content_type(content_type)
            })
            .collect()
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        let settings = SearchSettings::default();
        Self::new(
            settings.synthetic_min,
            settings.synthetic_max,
            settings.backdate_days,
        )
    }
}

fn pick<'a, R: Rng + ?Sized>(options: &[&'a str], rng: &mut R) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

fn fill(template: &str, query: &str) -> String {
    template.replace("{q}", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{classify, Filter};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_count_bounded_by_max_results() {
        let generator = SyntheticGenerator::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let config = SearchConfig::simple("Radiohead").with_max_results(5);
            assert_eq!(generator.generate(&config, &mut rng).len(), 5);
        }
        for _ in 0..50 {
            let config = SearchConfig::simple("Radiohead").with_max_results(200);
            let n = generator.generate(&config, &mut rng).len();
            assert!((10..=24).contains(&n));
        }
    }

    #[test]
    fn test_results_shape() {
        let generator = SyntheticGenerator::default();
        let mut rng = StdRng::seed_from_u64(1);
        let config = SearchConfig::simple("Radiohead").with_max_results(24);
        let results = generator.generate(&config, &mut rng);
        let now = Utc::now();

        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.url, format!("https://example.com/article-{}", i));
            assert!(result.title.contains("Radiohead"));
            assert!(result.snippet.contains("Radiohead"));
            assert!(SOURCES.contains(&result.source.as_str()));
            assert!(result.publish_date <= now);
            assert!(result.publish_date > now - Duration::days(61));
            assert!(result.analysis.is_none() && !result.is_analyzing);
        }
    }

    #[test]
    fn test_content_types_follow_request() {
        let generator = SyntheticGenerator::default();
        let mut rng = StdRng::seed_from_u64(3);
        let config = SearchConfig::simple("Björk")
            .with_max_results(50)
            .with_content_types(vec![Filter::Only(ContentType::Interview)]);
        let results = generator.generate(&config, &mut rng);
        assert!(results
            .iter()
            .all(|r| r.content_type == ContentType::Interview));
    }

    fn classified_as_intended(content_type: ContentType, query: &str) -> bool {
        title_templates(content_type)
            .iter()
            .all(|t| classify(&fill(t, query), "") == content_type)
    }

    #[test]
    fn test_templates_match_classifier() {
        for ct in ContentType::ALL {
            assert!(classified_as_intended(ct, "Radiohead"), "{}", ct);
        }
    }

    #[test]
    fn test_disabled_fallback() {
        let settings = SearchSettings {
            synthetic_fallback: false,
            ..Default::default()
        };
        assert!(SyntheticGenerator::from_settings(&settings).is_none());
    }
}
