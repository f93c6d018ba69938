//! Search orchestration module
//!
//! Validates the search config, walks the provider fallback chain and, when
//! nothing yields, synthesizes a plausible batch.

mod executor;
mod models;
mod synthetic;

pub use executor::{ResultOrigin, Search, SearchOutcome};
pub use models::*;
pub use synthetic::SyntheticGenerator;
