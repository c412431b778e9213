//! Secret stores contributing `SecretStore` layers.
//!
//! A [`SecretSource`] answers, per environment, either with a flat map or
//! with [`SecretLookup::NotFound`]. "Not found" is tolerated for every
//! environment except the base one, whose absence fails the resolution.
//! Two stores ship with the crate: the encrypted [`local`] database and the
//! HTTP [`vault`] service.

pub mod local;
pub mod vault;

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::chain::{DEFAULT_ENVIRONMENT, EnvironmentChain};
use crate::layer::{Layer, LayerKind};
use crate::{EnvConfigError, EnvConfigResult};

pub use local::{LocalSecretStore, SecretDatabase, SecretEntry, SecretGroup};
pub use vault::{RetryPolicy, VaultClient, VaultSecretSource};

/// Outcome of reading one environment from a secret source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecretLookup {
    /// The entry exists; it may still be empty.
    Found(BTreeMap<String, String>),
    /// The entry does not exist.
    NotFound,
}

/// A store that yields secrets per environment.
pub trait SecretSource: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors, such as `vault`.
    fn name(&self) -> &'static str;

    /// Human-readable location of the entry for `environment`.
    fn locate(&self, environment: &str) -> String;

    /// Read the entry for `environment`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::UpstreamSourceFailure`] when the store
    /// cannot be reached or decoded.
    fn load(&self, environment: &str) -> EnvConfigResult<SecretLookup>;
}

/// Read `source` for every environment of `chain`, most specific first.
///
/// # Errors
///
/// Propagates failures from [`SecretSource::load`] and returns
/// [`EnvConfigError::SecretNotFound`] when the base environment entry is
/// missing.
pub fn secret_layers(
    source: &dyn SecretSource,
    chain: &EnvironmentChain,
) -> EnvConfigResult<Vec<Layer>> {
    let mut layers = Vec::with_capacity(chain.len());
    for environment in chain.iter() {
        let location = source.locate(environment);
        match source.load(environment)? {
            SecretLookup::Found(entries) => {
                debug!(source = source.name(), secret = %location, "Loading config from secret");
                let mut layer = Layer::for_environment(LayerKind::SecretStore, environment)
                    .with_origin(location);
                layer.extend(entries.iter().map(|(k, v)| (k.trim(), v.as_str())));
                layers.push(layer);
            }
            SecretLookup::NotFound if environment == DEFAULT_ENVIRONMENT => {
                return Err(EnvConfigError::secret_not_found(source.name(), location).shared());
            }
            SecretLookup::NotFound => {
                debug!(source = source.name(), secret = %location, "secret not found; skipping");
            }
        }
    }
    Ok(layers)
}
