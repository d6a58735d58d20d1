//! Lootforge Engine library.
//!
//! Best-effort structured generation of game items and roll tables on top of
//! a text backend that may return malformed or inconsistent output.
//!
//! ## Structure
//!
//! - `use_cases/generation/` - Item and roll-table pipelines and their stages
//! - `repositories/` - Backend client wrapping the text and image ports
//! - `infrastructure/` - Port traits, HTTP adapters, file stores, config
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

/// Shared test doubles.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
