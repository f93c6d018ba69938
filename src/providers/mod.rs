//! Search provider module
//!
//! Defines the Provider trait and the adapters for the external keyword-search
//! APIs that make up the fallback chain.

mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod bing;
pub mod newsapi;

pub use bing::Bing;
pub use loader::ProviderLoader;
pub use newsapi::NewsApi;
pub use registry::ProviderRegistry;
pub use traits::*;
