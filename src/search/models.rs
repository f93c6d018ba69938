//! Search configuration and validation

use crate::error::{Error, Result};
use crate::results::{ContentType, Filter};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Longest accepted query, in characters
pub const MAX_QUERY_CHARS: usize = 500;
/// Upper bound for `max_results`
pub const MAX_RESULTS: usize = 200;

/// Input to a search. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Artist or topic to search for
    pub query: String,
    /// Earliest publication date
    #[serde(
        default,
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_from: Option<NaiveDate>,
    /// Latest publication date
    #[serde(
        default,
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_to: Option<NaiveDate>,
    /// Provider-specific source ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    /// Requested content types; `all` means any
    pub content_types: Vec<Filter<ContentType>>,
    /// Upper bound on the number of results
    pub max_results: usize,
}

impl SearchConfig {
    /// Create a config for any content type with a default of 20 results
    pub fn simple(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            date_from: None,
            date_to: None,
            sources: None,
            content_types: vec![Filter::All],
            max_results: 20,
        }
    }

    /// Set the result bound
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the date range
    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Set the requested content types
    pub fn with_content_types(mut self, types: Vec<Filter<ContentType>>) -> Self {
        self.content_types = types;
        self
    }

    /// Check every field constraint; runs before any provider call
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::validation("Query is required"));
        }
        if self.query.chars().count() > MAX_QUERY_CHARS {
            return Err(Error::validation(format!(
                "Query must be at most {} characters",
                MAX_QUERY_CHARS
            )));
        }
        if self.content_types.is_empty() {
            return Err(Error::validation(
                "At least one content type must be selected",
            ));
        }
        if self.max_results < 1 {
            return Err(Error::validation("Maximum results must be at least 1"));
        }
        if self.max_results > MAX_RESULTS {
            return Err(Error::validation(format!(
                "Maximum results cannot exceed {}",
                MAX_RESULTS
            )));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(Error::validation(
                    "Start date must be before or equal to end date",
                ));
            }
        }
        Ok(())
    }

    /// Concrete content types covered by the request
    pub fn requested_content_types(&self) -> Vec<ContentType> {
        if self.content_types.iter().any(|t| t.is_all()) {
            return ContentType::ALL.to_vec();
        }
        let mut types = Vec::new();
        for t in &self.content_types {
            if let Filter::Only(ct) = t {
                if !types.contains(ct) {
                    types.push(*ct);
                }
            }
        }
        if types.is_empty() {
            ContentType::ALL.to_vec()
        } else {
            types
        }
    }
}

/// Accept `YYYY-MM-DD`, a full RFC 3339 timestamp, an empty string or null
fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|d| d.date_naive()))
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_simple_config_is_valid() {
        assert_ok!(SearchConfig::simple("Radiohead").validate());
    }

    #[test]
    fn test_reversed_dates_rejected() {
        let config = SearchConfig::simple("Radiohead").with_dates(date(2024, 2, 1), date(2024, 1, 1));
        let err = assert_err!(config.validate());
        assert!(matches!(err, Error::Validation(_)));

        let same_day = SearchConfig::simple("Radiohead").with_dates(date(2024, 1, 1), date(2024, 1, 1));
        assert_ok!(same_day.validate());
    }

    #[test]
    fn test_field_bounds() {
        assert_err!(SearchConfig::simple("   ").validate());
        assert_err!(SearchConfig::simple("x".repeat(501)).validate());
        assert_ok!(SearchConfig::simple("é".repeat(500)).validate());
        assert_err!(SearchConfig::simple("x").with_max_results(0).validate());
        assert_err!(SearchConfig::simple("x").with_max_results(201).validate());
        assert_ok!(SearchConfig::simple("x").with_max_results(200).validate());
        assert_err!(SearchConfig::simple("x").with_content_types(vec![]).validate());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let config: SearchConfig = serde_json::from_value(serde_json::json!({
            "query": "Radiohead",
            "dateFrom": "2024-01-01",
            "dateTo": "2024-03-01T00:00:00.000Z",
            "contentTypes": ["review", "all"],
            "maxResults": 5
        }))
        .unwrap();

        assert_eq!(config.date_from, date(2024, 1, 1));
        assert_eq!(config.date_to, date(2024, 3, 1));
        assert_eq!(
            config.content_types,
            vec![Filter::Only(ContentType::Review), Filter::All]
        );
        assert_eq!(config.max_results, 5);
    }

    #[test]
    fn test_empty_date_is_absent() {
        let config: SearchConfig = serde_json::from_value(serde_json::json!({
            "query": "Radiohead",
            "dateFrom": "",
            "contentTypes": ["news"],
            "maxResults": 5
        }))
        .unwrap();
        assert_eq!(config.date_from, None);
        assert_eq!(config.date_to, None);
    }

    #[test]
    fn test_bad_date_fails_to_parse() {
        let parsed = serde_json::from_value::<SearchConfig>(serde_json::json!({
            "query": "Radiohead",
            "dateFrom": "last tuesday",
            "contentTypes": ["news"],
            "maxResults": 5
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_requested_content_types() {
        let any = SearchConfig::simple("x");
        assert_eq!(any.requested_content_types().len(), 5);

        let some = SearchConfig::simple("x").with_content_types(vec![
            Filter::Only(ContentType::Review),
            Filter::Only(ContentType::News),
            Filter::Only(ContentType::Review),
        ]);
        assert_eq!(
            some.requested_content_types(),
            vec![ContentType::Review, ContentType::News]
        );
    }
}
