//! De-duplication pass over a result batch

use super::types::SearchResult;
use std::collections::HashSet;

/// Flag every result whose normalized URL repeats an earlier one.
///
/// Nothing is removed or reordered. Returns the number of results flagged.
pub fn mark_duplicates(results: &mut [SearchResult]) -> usize {
    let mut seen = HashSet::new();
    let mut flagged = 0;

    for result in results.iter_mut() {
        if seen.insert(normalize_url(&result.url)) {
            result.is_duplicate = false;
        } else {
            result.is_duplicate = true;
            flagged += 1;
        }
    }

    flagged
}

/// Normalize a URL for duplicate detection
pub fn normalize_url(url: &str) -> String {
    url.trim()
        .trim_end_matches('/')
        .replace("https://", "")
        .replace("http://", "")
        .replace("www.", "")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_flagged_after_first() {
        let mut results = vec![
            SearchResult::new("https://www.pitchfork.com/a/", "First", "Pitchfork"),
            SearchResult::new("https://nme.com/b", "Other", "NME"),
            SearchResult::new("http://pitchfork.com/a", "Again", "Pitchfork"),
        ];

        assert_eq!(mark_duplicates(&mut results), 1);
        assert!(!results[0].is_duplicate);
        assert!(!results[1].is_duplicate);
        assert!(results[2].is_duplicate);
        assert_eq!(results[2].title, "Again");
    }

    #[test]
    fn test_distinct_urls_untouched() {
        let mut results = vec![
            SearchResult::new("https://example.com/article-0", "A", "X"),
            SearchResult::new("https://example.com/article-1", "B", "Y"),
        ];
        assert_eq!(mark_duplicates(&mut results), 0);
    }
}
