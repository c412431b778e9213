//! Test helpers shared across the workspace.
//!
//! Provides environment-variable guards, a `figment::Jail` wrapper, and a
//! builder for temporary configuration trees.

pub mod env;
pub mod figment;
pub mod fixtures;

pub use fixtures::ConfigTree;
