//! Testing utilities
//!
//! Fixture builders and a table-driven cell indexer so clustering can be
//! tested without depending on H3 cell boundaries.

pub mod fixtures;

pub use fixtures::*;
