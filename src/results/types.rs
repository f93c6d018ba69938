//! Result type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single discovered article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Unique within a search batch
    pub id: String,
    /// The title of the article
    pub title: String,
    /// The URL of the article
    pub url: String,
    /// Publication name
    pub source: String,
    /// Publication timestamp
    pub publish_date: DateTime<Utc>,
    /// Short excerpt
    pub snippet: String,
    /// Editorial category
    pub content_type: ContentType,
    /// Analysis record, attached once enrichment succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    /// True only while enrichment is in flight for this item
    #[serde(default)]
    pub is_analyzing: bool,
    /// Set by the de-duplication pass
    #[serde(default)]
    pub is_duplicate: bool,
}

impl SearchResult {
    /// Create a new unanalyzed result with a fresh id
    pub fn new(url: impl Into<String>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: format!("result-{}", uuid::Uuid::new_v4()),
            title: title.into(),
            url: url.into(),
            source: source.into(),
            publish_date: Utc::now(),
            snippet: String::new(),
            content_type: ContentType::Article,
            analysis: None,
            is_analyzing: false,
            is_duplicate: false,
        }
    }

    /// Add a snippet
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Set the publication date
    pub fn with_publish_date(mut self, date: DateTime<Utc>) -> Self {
        self.publish_date = date;
        self
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Whether enrichment has attached an analysis
    pub fn is_analyzed(&self) -> bool {
        self.analysis.is_some()
    }
}

/// Analysis attached to a result by a scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    /// 0..=100
    pub relevance_score: u8,
    /// 0..=100
    pub authority: u8,
    pub themes: Vec<String>,
    pub summary: String,
}

/// Overall tone of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Neutral,
        Sentiment::Negative,
        Sentiment::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!("unknown sentiment: {}", other)),
        }
    }
}

/// Coarse editorial category of a stored result
///
/// Never `all`; the "any type" sentinel only exists as [`Filter::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Review,
    Interview,
    News,
    Feature,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Article,
        ContentType::Review,
        ContentType::Interview,
        ContentType::News,
        ContentType::Feature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Review => "review",
            Self::Interview => "interview",
            Self::News => "news",
            Self::Feature => "feature",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "review" => Ok(Self::Review),
            "interview" => Ok(Self::Interview),
            "news" => Ok(Self::News),
            "feature" => Ok(Self::Feature),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// A filter value: either the `all` sentinel or one concrete value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Filter<T> {
    /// Whether a concrete value passes this filter
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }

    /// Whether an optional value passes; `None` only passes `All`
    pub fn matches_opt(&self, value: Option<&T>) -> bool {
        match (self, value) {
            (Self::All, _) => true,
            (Self::Only(expected), Some(v)) => expected == v,
            (Self::Only(_), None) => false,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<T: FromStr<Err = String>> FromStr for Filter<T> {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(v) => v.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Filter<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: FromStr<Err = String>> Deserialize<'de> for Filter<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
