//! The resolved configuration and its accessors.

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;

use crate::chain::EnvironmentChain;
use crate::layer::{Layer, LayerKind};
use crate::merge::{MergedConfiguration, Provenance};
use crate::settings::parse_flag;
use crate::{EnvConfigError, EnvConfigResult};

mod builder;

pub use builder::EnvConfigBuilder;

/// Delimiter used by [`EnvConfig::get_list_default`].
pub const DEFAULT_LIST_DELIMITER: &str = ",";

/// One resolved configuration.
///
/// The merged base is immutable once built. Runtime overrides applied with
/// [`EnvConfig::set`], [`EnvConfig::add`] and [`EnvConfig::clear`] live in a
/// separate top layer that outranks every other source.
///
/// Every string accessor trims surrounding whitespace from the value.
#[derive(Debug)]
pub struct EnvConfig {
    chain: EnvironmentChain,
    base: MergedConfiguration,
    overrides: RwLock<Layer>,
    suppressed: Vec<String>,
}

impl EnvConfig {
    pub(crate) const fn from_parts(
        chain: EnvironmentChain,
        base: MergedConfiguration,
        suppressed: Vec<String>,
    ) -> Self {
        Self {
            chain,
            base,
            overrides: RwLock::new(Layer::new(LayerKind::RuntimeOverride)),
            suppressed,
        }
    }

    /// Start configuring a resolution pass.
    #[must_use]
    pub const fn builder() -> EnvConfigBuilder {
        EnvConfigBuilder::new()
    }

    /// Resolve from the real process environment and working directory.
    ///
    /// # Errors
    ///
    /// Propagates any fatal source error; see [`EnvConfigBuilder::build`].
    pub fn from_process() -> EnvConfigResult<Self> {
        EnvConfigBuilder::new().build()
    }

    /// Trimmed value for `key` under either spelling.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # fn run() -> env_config::EnvConfigResult<()> {
    /// let config = env_config::EnvConfig::from_process()?;
    /// assert_eq!(config.get("property.one"), config.get("PROPERTY_ONE"));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overrides.read().get(key) {
            return Some(value.trim().to_owned());
        }
        self.base.get(key).map(|value| value.trim().to_owned())
    }

    /// Value for `key`, or `default` when nothing defines it.
    #[must_use]
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    /// Value for `key`, failing when nothing defines it.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::MissingRequiredVariable`] when `key` is
    /// absent from every layer.
    pub fn require(&self, key: &str) -> EnvConfigResult<String> {
        self.get(key).ok_or_else(|| EnvConfigError::missing_key(key).shared())
    }

    /// Parse the value for `key` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::InvalidValue`] when the value is present but
    /// does not parse.
    pub fn get_typed<T: FromStr>(&self, key: &str) -> EnvConfigResult<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.parse::<T>().map(Some).map_err(|_| {
            EnvConfigError::invalid_value(key, raw.as_str(), type_name::<T>()).shared()
        })
    }

    /// Parse the value for `key` as `T`, or return `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::InvalidValue`] when the value is present but
    /// does not parse.
    pub fn get_typed_or<T: FromStr>(&self, key: &str, default: T) -> EnvConfigResult<T> {
        Ok(self.get_typed(key)?.unwrap_or(default))
    }

    /// `true` only when the value for `key` is `true` ignoring case.
    ///
    /// Absent and unparsable values are `false`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| parse_flag(&value))
    }

    /// Split the value for `key` on `delimiter`.
    ///
    /// Items are trimmed and trailing empty items dropped. An absent key or
    /// empty value yields an empty list.
    #[must_use]
    pub fn get_list(&self, key: &str, delimiter: &str) -> Vec<String> {
        let Some(value) = self.get(key) else {
            return Vec::new();
        };
        let mut items: Vec<String> = value
            .split(delimiter)
            .map(|item| item.trim().to_owned())
            .collect();
        while items.last().is_some_and(String::is_empty) {
            items.pop();
        }
        items
    }

    /// [`EnvConfig::get_list`] with [`DEFAULT_LIST_DELIMITER`].
    #[must_use]
    pub fn get_list_default(&self, key: &str) -> Vec<String> {
        self.get_list(key, DEFAULT_LIST_DELIMITER)
    }

    /// Override `key` for the rest of this instance's life.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let mut overrides = self.overrides.write();
        overrides.remove(key);
        overrides.insert(key, value);
    }

    /// Same as [`EnvConfig::set`]; an existing override is replaced.
    pub fn add(&self, key: &str, value: impl Into<String>) {
        self.set(key, value);
    }

    /// Drop the runtime override for `key`.
    ///
    /// The key may still resolve from a lower layer afterwards.
    pub fn clear(&self, key: &str) {
        self.overrides.write().remove(key);
    }

    /// The most specific environment of the chain.
    #[must_use]
    pub fn environment(&self) -> &str {
        self.chain.current()
    }

    /// The full environment chain, most specific first.
    #[must_use]
    pub const fn environments(&self) -> &EnvironmentChain {
        &self.chain
    }

    /// Which layer supplied the value for `key`.
    #[must_use]
    pub fn provenance(&self, key: &str) -> Option<Provenance> {
        if self.overrides.read().contains_key(key) {
            return Some(Provenance::new(LayerKind::RuntimeOverride, None));
        }
        self.base.provenance(key).cloned()
    }

    /// Sorted snapshot of every resolvable spelling, overrides included.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<String, String> {
        let overrides = self.overrides.read();
        self.base
            .iter()
            .filter(|(key, _)| !overrides.contains_key(key))
            .chain(overrides.iter())
            .map(|(key, value)| (key.to_owned(), value.trim().to_owned()))
            .collect()
    }

    /// Property keys whose environment variables were discarded during
    /// resolution because they repeated a file value.
    #[must_use]
    pub fn suppressed(&self) -> &[String] {
        &self.suppressed
    }
}

impl fmt::Display for EnvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.as_map() {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
