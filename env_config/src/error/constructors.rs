//! Constructors for `EnvConfigError` variants.

use std::error::Error;
use std::sync::Arc;

use camino::Utf8Path;

use super::EnvConfigError;

impl EnvConfigError {
    /// Build a [`Self::MissingRequiredVariable`] for an engine-control key.
    ///
    /// # Examples
    ///
    /// ```
    /// use env_config::EnvConfigError;
    /// let err = EnvConfigError::missing_variable("env.config.vault.token");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Missing required variable 'env.config.vault.token'"
    /// );
    /// ```
    #[must_use]
    pub fn missing_variable(key: impl Into<String>) -> Self {
        Self::MissingRequiredVariable {
            kind: "variable",
            key: key.into(),
        }
    }

    /// Build a [`Self::MissingRequiredVariable`] for a consumer lookup.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingRequiredVariable {
            kind: "key",
            key: key.into(),
        }
    }

    /// Report a directory that does not exist or is not a directory.
    #[must_use]
    pub fn missing_directory(path: &Utf8Path) -> Self {
        Self::InvalidConfigLocation {
            path: path.to_path_buf(),
            message: format!("'{path}' does not exist or not a valid config directory!"),
        }
    }

    /// Report a directory that contains no `.properties` files.
    #[must_use]
    pub fn empty_directory(path: &Utf8Path) -> Self {
        Self::InvalidConfigLocation {
            path: path.to_path_buf(),
            message: format!("No property files found under '{path}'"),
        }
    }

    /// Report an absent `default` entry in an enabled secret source.
    ///
    /// # Examples
    ///
    /// ```
    /// use env_config::EnvConfigError;
    /// let err = EnvConfigError::secret_not_found("vault", "path/to/project/default");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Could not find the vault secret: path/to/project/default"
    /// );
    /// ```
    #[must_use]
    pub fn secret_not_found(source_name: &'static str, secret: impl Into<String>) -> Self {
        Self::SecretNotFound {
            source_name,
            secret: secret.into(),
        }
    }

    /// Report an upstream failure without an underlying error value.
    #[must_use]
    pub fn upstream(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::UpstreamSourceFailure {
            source_name,
            message: message.into(),
            source: None,
        }
    }

    /// Report an upstream failure caused by `err`.
    #[must_use]
    pub fn upstream_with(
        source_name: &'static str,
        message: impl Into<String>,
        err: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::UpstreamSourceFailure {
            source_name,
            message: message.into(),
            source: Some(err.into()),
        }
    }

    /// Wrap a read or parse failure for `path`.
    #[must_use]
    pub fn file(path: &Utf8Path, err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source: err.into(),
        }
    }

    /// Report a value that failed typed conversion.
    #[must_use]
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Wrap the error in an [`Arc`] for use with [`crate::EnvConfigResult`].
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
