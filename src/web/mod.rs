//! Web server module
//!
//! JSON API over search, analysis, history, sharing and export.

mod error;
mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
