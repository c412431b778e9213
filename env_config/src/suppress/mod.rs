//! Suppression of environment variables that merely restate file values.
//!
//! Environment variables are often exported globally with a "sensible
//! default" value. Such a variable must not shadow an environment file that
//! intentionally sets something more specific, yet a variable carrying a
//! distinctive value must still win. The suppressor removes the former from
//! the environment-variable layer before the merge; the process environment
//! itself is never touched.
//!
//! The comparison only ever consults the current environment and the base
//! environment. Intermediate environments of a longer chain are skipped, and
//! once the chain holds three or more environments a variable equal to the
//! base value is suppressed even when the current environment defines the key
//! differently.

use std::collections::BTreeSet;

use tracing::debug;

use crate::chain::EnvironmentChain;
use crate::key::to_property_key;
use crate::layer::Layer;

const ENVIRONMENTS_WITH_PARENT: usize = 2;

/// Decides which environment-variable values may override file layers.
#[derive(Debug)]
pub struct OverrideSuppressor<'a> {
    current: &'a Layer,
    default: &'a Layer,
    default_only: bool,
    chain_len: usize,
}

impl<'a> OverrideSuppressor<'a> {
    /// Compare against the file layers of the current and base environments
    /// of `chain`. For a chain holding only the base environment both layers
    /// are the same.
    #[must_use]
    pub fn new(chain: &EnvironmentChain, current: &'a Layer, default: &'a Layer) -> Self {
        Self {
            current,
            default,
            default_only: chain.is_default_only(),
            chain_len: chain.len(),
        }
    }

    /// Whether a variable holding `value` for `key` should be discarded.
    #[must_use]
    pub fn should_suppress(&self, key: &str, value: &str) -> bool {
        if self.current.get(key) == Some(value) {
            return true;
        }
        if self.default_only || self.default.get(key) != Some(value) {
            return false;
        }
        !self.current.contains_key(key) || self.chain_len > ENVIRONMENTS_WITH_PARENT
    }

    /// Remove every suppressed key, under both spellings, from `variables`
    /// and return the property form of each removed key.
    pub fn apply(&self, variables: &mut Layer) -> Vec<String> {
        let keys: BTreeSet<String> = variables
            .iter()
            .map(|(key, _)| to_property_key(key))
            .collect();
        let mut suppressed = Vec::new();
        for key in keys {
            let Some(value) = variables.get(&key) else {
                continue;
            };
            if self.should_suppress(&key, value) {
                debug!(key = %key, "suppressing environment variable matching file value");
                variables.remove(&key);
                suppressed.push(key);
            }
        }
        suppressed
    }
}
