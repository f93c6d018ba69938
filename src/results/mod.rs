//! Result model shared by providers, the orchestrator and the enricher
//!
//! Also holds the pure passes applied to a result list: content-type
//! classification, filtering and de-duplication.

mod classify;
mod dedup;
mod filter;
mod types;

pub use classify::classify;
pub use dedup::{mark_duplicates, normalize_url};
pub use filter::{filter_results, select_by_ids};
pub use types::*;
