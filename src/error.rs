//! Request-level error taxonomy
//!
//! Provider failures never reach this type: the orchestrator absorbs them.
//! What remains is fatal to the current request.

use crate::analysis::AnalysisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed search configuration or request body
    #[error("{0}")]
    Validation(String),

    #[error("{kind} limit reached")]
    QuotaExceeded { kind: QuotaKind, limit: u32 },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Which monthly quota was exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaKind {
    Search,
    Export,
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search => write!(f, "Search"),
            Self::Export => write!(f, "Export"),
        }
    }
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::QuotaExceeded {
            kind: QuotaKind::Search,
            limit: 50,
        };
        assert_eq!(err.to_string(), "Search limit reached");
        assert_eq!(Error::NotFound("Search".into()).to_string(), "Search not found");
    }
}
