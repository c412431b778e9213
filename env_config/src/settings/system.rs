//! Host-supplied system properties.

use std::collections::BTreeMap;

use crate::layer::{Layer, LayerKind};

/// Explicit property map supplied by the host application.
///
/// System properties outrank environment variables both for control keys and
/// for consumer lookups. Keys are stored as given; the layer built from them
/// carries both spellings.
///
/// # Examples
///
/// ```
/// use env_config::SystemProperties;
///
/// let props: SystemProperties = [("env.config.environment", "test")].into_iter().collect();
/// assert_eq!(props.get("env.config.environment"), Some("test"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemProperties {
    entries: BTreeMap<String, String>,
}

impl SystemProperties {
    /// Create an empty property map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Value stored under exactly `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether no properties were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build the system-property layer.
    #[must_use]
    pub fn to_layer(&self) -> Layer {
        Layer::from_entries(LayerKind::SystemProperty, self.iter())
    }
}

impl<K, V> FromIterator<(K, V)> for SystemProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        props.extend(iter);
        props
    }
}

impl<K, V> Extend<(K, V)> for SystemProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
