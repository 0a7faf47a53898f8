//! Questline Engine library.
//!
//! Server-authoritative turn resolution for a narrated RPG. The narrator
//! writes prose; this crate decides what actually happens.
//!
//! ## Structure
//!
//! - `repositories/` - Aggregate persistence and the narrator wrapper
//! - `use_cases/` - User story orchestration
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

/// Test fixtures shared by unit and end-to-end tests.
#[cfg(test)]
pub mod test_fixtures;

/// End-to-end scenarios over the in-memory store.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
