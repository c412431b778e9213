//! Primary error enum for configuration resolution.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or reading configuration.
///
/// Every variant is fatal for the resolution attempt that produced it. Absent
/// consumer keys are not errors: [`crate::EnvConfig::get`] returns `None` and
/// only [`crate::EnvConfig::require`] turns absence into
/// [`EnvConfigError::MissingRequiredVariable`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnvConfigError {
    /// A required key was not supplied by any source.
    #[error("Missing required {kind} '{key}'")]
    MissingRequiredVariable {
        /// Which family of key was missing (`variable` for engine-control
        /// keys, `key` for consumer lookups).
        kind: &'static str,
        /// Key that could not be resolved.
        key: String,
    },

    /// An environment or profile directory is missing or holds no files.
    #[error("{message}")]
    InvalidConfigLocation {
        /// Directory that failed validation.
        path: Utf8PathBuf,
        /// Human-readable description of the failure.
        message: String,
    },

    /// The `default` environment entry is absent from an enabled secret source.
    #[error("Could not find the {source_name} secret: {secret}")]
    SecretNotFound {
        /// Name of the secret source that was consulted.
        source_name: &'static str,
        /// Secret path or group that was requested.
        secret: String,
    },

    /// A secret store or remote service could not be reached or read.
    #[error("{message}")]
    UpstreamSourceFailure {
        /// Name of the failing source.
        source_name: &'static str,
        /// Human-readable description of the failure.
        message: String,
        /// Underlying transport, crypto or decoding error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A properties file could not be read or parsed.
    #[error("Configuration file error in '{path}': {source}")]
    File {
        /// File that triggered the failure.
        path: Utf8PathBuf,
        /// Underlying error reported by the reader.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A value could not be converted to the requested type.
    #[error("Invalid value '{value}' for '{key}': expected {expected}")]
    InvalidValue {
        /// Key whose value failed to parse.
        key: String,
        /// Raw value that was rejected.
        value: String,
        /// Description of the expected type.
        expected: String,
    },
}
