//! Keyword-based content-type classification

use super::types::ContentType;

const INTERVIEW_MARKERS: &[&str] = &["interview", "talks to", "in conversation"];
const NEWS_MARKERS: &[&str] = &["announces", "releases", "breaking"];
const FEATURE_MARKERS: &[&str] = &["feature", "deep dive"];

/// Classify an article from its title and snippet.
///
/// Rules are case-insensitive and evaluated in priority order, first match
/// wins. Only the review rule looks at the snippet.
pub fn classify(title: &str, snippet: &str) -> ContentType {
    let title = title.to_lowercase();
    let snippet = snippet.to_lowercase();

    if title.contains("review") || snippet.contains("review") {
        ContentType::Review
    } else if contains_any(&title, INTERVIEW_MARKERS) {
        ContentType::Interview
    } else if contains_any(&title, NEWS_MARKERS) {
        ContentType::News
    } else if contains_any(&title, FEATURE_MARKERS) {
        ContentType::Feature
    } else {
        ContentType::Article
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
