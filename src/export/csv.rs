//! CSV rendering, one row per result

use crate::results::SearchResult;

const HEADERS: [&str; 10] = [
    "Title",
    "Source",
    "Publish Date",
    "Content Type",
    "Sentiment",
    "Relevance Score",
    "Authority",
    "Themes",
    "URL",
    "Snippet",
];

const MISSING: &str = "N/A";

pub(super) fn render(results: &[SearchResult]) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADERS.iter().map(|h| h.to_string()));

    for result in results {
        let analysis = result.analysis.as_ref();
        let or_missing = |v: Option<String>| v.unwrap_or_else(|| MISSING.to_string());

        push_row(
            &mut out,
            [
                result.title.clone(),
                result.source.clone(),
                result.publish_date.format("%Y-%m-%d").to_string(),
                result.content_type.to_string(),
                or_missing(analysis.map(|a| a.sentiment.to_string())),
                or_missing(analysis.map(|a| a.relevance_score.to_string())),
                or_missing(analysis.map(|a| a.authority.to_string())),
                or_missing(
                    analysis
                        .filter(|a| !a.themes.is_empty())
                        .map(|a| a.themes.join(", ")),
                ),
                result.url.clone(),
                result.snippet.clone(),
            ],
        );
    }

    out
}

fn push_row<I: IntoIterator<Item = String>>(out: &mut String, fields: I) {
    let row: Vec<String> = fields.into_iter().map(|f| escape(&f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Quote a field when it holds a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
