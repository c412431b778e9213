//! Layer metadata and flat key/value storage.
//!
//! A [`Layer`] is one source's contribution to the merged configuration: a
//! flat map tagged with the [`LayerKind`] that produced it and, for file and
//! secret layers, the environment it belongs to. Every insertion stores the
//! key under both canonical spellings (see [`crate::key`]) and nothing else,
//! so consumers and the override suppressor see one identity whichever form
//! they use.

use std::collections::BTreeMap;
use std::fmt;

use crate::key::{spellings, to_property_key};

/// Provenance of a layer, ordered from highest to lowest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum LayerKind {
    /// Values written at runtime through `set`/`add`.
    RuntimeOverride,
    /// Values supplied as system properties by the host.
    SystemProperty,
    /// Values read from the process environment.
    EnvironmentVariable,
    /// Values read from a secret store.
    SecretStore,
    /// Values read from a profile directory.
    ProfileFile,
    /// Values read from an environment directory.
    EnvironmentFile,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RuntimeOverride => "runtime override",
            Self::SystemProperty => "system property",
            Self::EnvironmentVariable => "environment variable",
            Self::SecretStore => "secret store",
            Self::ProfileFile => "profile file",
            Self::EnvironmentFile => "environment file",
        };
        f.write_str(label)
    }
}

/// Flat, ordered key/value map tagged with its provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    kind: LayerKind,
    environment: Option<String>,
    origin: Option<String>,
    entries: BTreeMap<String, String>,
}

impl Layer {
    /// Construct an empty layer of `kind` that is not tied to an environment.
    #[must_use]
    pub const fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            environment: None,
            origin: None,
            entries: BTreeMap::new(),
        }
    }

    /// Construct an empty layer of `kind` belonging to `environment`.
    #[must_use]
    pub fn for_environment(kind: LayerKind, environment: impl Into<String>) -> Self {
        Self {
            environment: Some(environment.into()),
            ..Self::new(kind)
        }
    }

    /// Construct a layer of `kind` from `entries`, materialising both
    /// spellings of every key. Later duplicates overwrite earlier ones.
    #[must_use]
    pub fn from_entries<I, K, V>(kind: LayerKind, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut layer = Self::new(kind);
        layer.extend(entries);
        layer
    }

    /// Attach a human-readable origin such as a directory or secret path.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Returns the provenance of the layer.
    #[must_use]
    pub const fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Returns the environment this layer belongs to, if any.
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    /// Returns the origin recorded with [`Layer::with_origin`].
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Insert `value` under both canonical spellings of `key`, replacing any
    /// previous value. The spelling as written is not kept.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let [property, env] = spellings(key);
        self.entries.insert(env, value.clone());
        self.entries.insert(property, value);
    }

    /// Insert `value` unless the key is already present under any spelling.
    ///
    /// Returns `true` when the value was inserted.
    pub fn insert_if_absent(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.contains_key(key) {
            return false;
        }
        self.insert(key, value);
        true
    }

    /// Remove `key` under both spellings, returning the value it held.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let [property, env] = spellings(key);
        let removed = self.entries.remove(&property);
        self.entries.remove(&env).or(removed)
    }

    /// Look up `key` through its property spelling.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&to_property_key(key)).map(String::as_str)
    }

    /// Whether `key` is present under any spelling.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of stored spellings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the layer holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over every stored spelling and its value in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> Extend<(K, V)> for Layer
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.as_ref(), value);
        }
    }
}
