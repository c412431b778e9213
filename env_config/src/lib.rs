//! Layered, environment-aware key/value configuration.
//!
//! `env_config` resolves one flat configuration view from several sources:
//! runtime overrides, system properties, process environment variables,
//! secret stores, profile overlays and per-environment `.properties`
//! directories. Environments inherit from a base `default` environment and
//! every key can be read as `property.one` or `PROPERTY_ONE`.
//!
//! An environment variable that merely repeats a value already present in
//! the environment files is dropped before merging, so that a catch-all
//! variable does not outrank a more specific environment file.
//!
//! ```rust,no_run
//! use env_config::EnvConfig;
//!
//! # fn main() -> env_config::EnvConfigResult<()> {
//! let config = EnvConfig::builder()
//!     .system_property("env.config.environment", "test,staging")
//!     .build()?;
//! assert_eq!(config.environment(), "staging");
//! let url: String = config.require("service.url")?;
//! println!("{url}");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

mod chain;
mod engine;
mod error;
pub mod key;
mod layer;
mod merge;
pub mod secret;
mod settings;
pub mod source;
mod state;
mod suppress;

pub use chain::{DEFAULT_ENVIRONMENT, EnvironmentChain};
pub use engine::{DEFAULT_LIST_DELIMITER, EnvConfig, EnvConfigBuilder};
pub use error::EnvConfigError;
pub use layer::{Layer, LayerKind};
pub use merge::{LayerStack, MergedConfiguration, Provenance, merge_layers};
pub use settings::{
    ControlKey, ControlLookup, DEFAULT_CONFIG_PATH, DEFAULT_VAULT_MAX_RETRIES, KeepassSettings,
    Settings, SystemProperties, VaultSettings, parse_flag,
};
pub use state::{ProcessState, global};
pub use suppress::OverrideSuppressor;

/// Result alias used by every fallible operation of the crate.
///
/// The error is shared so that a failed lazy resolution can be reported to
/// every waiting caller.
pub type EnvConfigResult<T> = Result<T, Arc<EnvConfigError>>;
