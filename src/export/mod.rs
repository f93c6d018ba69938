//! Export of result sets as JSON, CSV or PDF

mod csv;
mod pdf;

use crate::error::{Error, Result};
use crate::results::SearchResult;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

const FILE_STEM: &str = "press-review-export";

/// Output format; `excel` is accepted as an alias of `csv`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    #[serde(alias = "excel")]
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" | "excel" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            other => Err(Error::validation(format!("Unknown export format: {}", other))),
        }
    }
}

/// Export knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Keep analysis fields; when false every result is exported unanalyzed
    pub include_analysis: bool,
    /// Title printed on the PDF cover
    pub title: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_analysis: true,
            title: "Press Review - Search Results".to_string(),
        }
    }
}

/// Rendered export, ready to be sent as a download
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

/// Render `results` in the requested format
pub fn export(
    results: &[SearchResult],
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportArtifact> {
    let results: Cow<'_, [SearchResult]> = if options.include_analysis {
        Cow::Borrowed(results)
    } else {
        Cow::Owned(
            results
                .iter()
                .cloned()
                .map(|mut r| {
                    r.analysis = None;
                    r
                })
                .collect(),
        )
    };

    let bytes = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(results.as_ref())
            .map_err(|e| Error::Internal(e.into()))?,
        ExportFormat::Csv => csv::render(&results).into_bytes(),
        ExportFormat::Pdf => pdf::render(&results, &options.title)?,
    };

    Ok(ExportArtifact {
        bytes,
        content_type: format.content_type(),
        file_name: format!("{}.{}", FILE_STEM, format.extension()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{AnalysisResult, Sentiment};

    pub(super) fn sample() -> Vec<SearchResult> {
        let mut analyzed = SearchResult::new("https://pitchfork.com/a", "Kid A, revisited", "Pitchfork")
            .with_snippet("He said \"wow\"");
        analyzed.analysis = Some(AnalysisResult {
            sentiment: Sentiment::Positive,
            relevance_score: 91,
            authority: 88,
            themes: vec!["innovation".into(), "sonic evolution".into()],
            summary: "Glowing.".into(),
        });
        let plain = SearchResult::new("https://nme.com/b", "Tour dates", "NME");
        vec![analyzed, plain]
    }

    #[test]
    fn test_format_names() {
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("xml".parse::<ExportFormat>().is_err());
        let f: ExportFormat = serde_json::from_str("\"excel\"").unwrap();
        assert_eq!(f, ExportFormat::Csv);
    }

    #[test]
    fn test_json_export() {
        let artifact = export(&sample(), ExportFormat::Json, &ExportOptions::default()).unwrap();
        assert_eq!(artifact.file_name, "press-review-export.json");
        assert_eq!(artifact.content_type, "application/json");
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("\n  {"));
        let parsed: Vec<SearchResult> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].title, "Kid A, revisited");
        assert!(parsed[0].analysis.is_some());
        assert!(parsed[1].analysis.is_none());
    }

    #[test]
    fn test_without_analysis() {
        let options = ExportOptions {
            include_analysis: false,
            ..Default::default()
        };
        let artifact = export(&sample(), ExportFormat::Json, &options).unwrap();
        let parsed: Vec<SearchResult> = serde_json::from_slice(&artifact.bytes).unwrap();
        assert!(parsed.iter().all(|r| r.analysis.is_none()));

        let csv = export(&sample(), ExportFormat::Csv, &options).unwrap();
        let text = String::from_utf8(csv.bytes).unwrap();
        assert!(!text.contains("Positive") && !text.contains("positive"));
    }
}
