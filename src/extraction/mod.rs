//! Field extraction module.
//!
//! Prioritized, case-insensitive lookup over headers and JSON objects.

pub mod alias;

pub use alias::*;
