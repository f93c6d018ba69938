//! Display/export filters over a result set

use super::types::{ContentType, Filter, SearchResult, Sentiment};
use std::collections::HashSet;

/// Keep results matching both filters, preserving order.
///
/// A result without analysis never matches a concrete sentiment.
pub fn filter_results<'a>(
    results: &'a [SearchResult],
    sentiment: Filter<Sentiment>,
    content_type: Filter<ContentType>,
) -> Vec<&'a SearchResult> {
    results
        .iter()
        .filter(|r| {
            sentiment.matches_opt(r.analysis.as_ref().map(|a| &a.sentiment))
                && content_type.matches(&r.content_type)
        })
        .collect()
}

/// Keep only the results whose id is selected, preserving order
pub fn select_by_ids<'a, I, S>(results: &'a [SearchResult], ids: I) -> Vec<&'a SearchResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ids: HashSet<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();
    results.iter().filter(|r| ids.contains(&r.id)).collect()
}
