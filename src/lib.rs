//! press-review: music-press search, analysis and sharing
//!
//! Searches a chain of news/web providers for coverage of an artist, falls
//! back to synthetic results when none answers, scores each article in the
//! background and keeps per-user history with quotas, share links and exports.

pub mod analysis;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;
pub mod usage;
pub mod web;

pub use config::Settings;
pub use error::{Error, Result};
pub use providers::Provider;
pub use results::SearchResult;
pub use search::{Search, SearchConfig};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
