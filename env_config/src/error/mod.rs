//! Error types produced while resolving configuration.

mod constructors;
mod types;

pub use types::EnvConfigError;

#[cfg(test)]
mod tests;
