//! HTTP networking module
//!
//! Provides the outbound HTTP client shared by providers and remote scorers.

mod client;

pub use client::HttpClient;
