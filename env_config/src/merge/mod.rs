//! Precedence fold over an ordered list of layers.
//!
//! Layers are pushed highest precedence first and folded so the first layer
//! to define a key wins. Spellings are taken as the layers materialised them;
//! nothing is derived here.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::key::to_property_key;
use crate::layer::{Layer, LayerKind};

/// Source that supplied a resolved value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provenance {
    kind: LayerKind,
    environment: Option<String>,
}

impl Provenance {
    /// Construct a provenance record.
    #[must_use]
    pub const fn new(kind: LayerKind, environment: Option<String>) -> Self {
        Self { kind, environment }
    }

    /// Kind of the winning layer.
    #[must_use]
    pub const fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Environment of the winning layer, for file and secret layers.
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Resolved {
    value: String,
    provenance: Provenance,
}

/// Ordered collection of layers awaiting a merge.
///
/// # Examples
///
/// ```
/// use env_config::{Layer, LayerKind, LayerStack};
///
/// let mut stack = LayerStack::new();
/// stack.push(Layer::from_entries(LayerKind::EnvironmentVariable, [("PORT", "8080")]));
/// stack.push(Layer::from_entries(LayerKind::EnvironmentFile, [("port", "80")]));
/// let merged = stack.merge();
/// assert_eq!(merged.get("port"), Some("8080"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Create an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer with lower precedence than every layer pushed so far.
    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Append several layers in order.
    pub fn push_all(&mut self, layers: impl IntoIterator<Item = Layer>) {
        self.layers.extend(layers);
    }

    /// Borrow the layers, highest precedence first.
    #[must_use]
    pub const fn layers(&self) -> &[Layer] {
        self.layers.as_slice()
    }

    /// Number of layers in the stack.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack holds no layers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Fold the stack into a [`MergedConfiguration`].
    #[must_use]
    pub fn merge(&self) -> MergedConfiguration {
        merge_layers(&self.layers)
    }
}

/// Fold `layers` in order; earlier layers are never overwritten by later ones.
#[must_use]
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> MergedConfiguration {
    let mut entries = BTreeMap::new();
    for layer in layers {
        let provenance = Provenance::new(layer.kind(), layer.environment().map(str::to_owned));
        for (key, value) in layer.iter() {
            if let Entry::Vacant(slot) = entries.entry(key.to_owned()) {
                slot.insert(Resolved {
                    value: value.to_owned(),
                    provenance: provenance.clone(),
                });
            }
        }
    }
    MergedConfiguration { entries }
}

/// Flat result of a merge, remembering which layer won each key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedConfiguration {
    entries: BTreeMap<String, Resolved>,
}

impl MergedConfiguration {
    /// Resolved value for `key` under any spelling.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(|resolved| resolved.value.as_str())
    }

    /// Provenance of the value resolved for `key`.
    #[must_use]
    pub fn provenance(&self, key: &str) -> Option<&Provenance> {
        self.lookup(key).map(|resolved| &resolved.provenance)
    }

    /// Whether `key` resolves under any spelling.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Number of resolved spellings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over resolved spellings and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(key, resolved)| (key.as_str(), resolved.value.as_str()))
    }

    fn lookup(&self, key: &str) -> Option<&Resolved> {
        self.entries.get(&to_property_key(key))
    }
}
