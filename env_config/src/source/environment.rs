//! Process environment snapshot.

use std::collections::BTreeMap;

use figment::providers::Env;
use tracing::debug;

use crate::layer::{Layer, LayerKind};

/// Capture the process environment with the variable names left untouched.
#[must_use]
pub fn process_environment() -> BTreeMap<String, String> {
    let vars: BTreeMap<String, String> = Env::raw()
        .lowercase(false)
        .iter()
        .map(|(key, value)| (key.as_str().to_owned(), value))
        .collect();
    debug!(count = vars.len(), "captured process environment");
    vars
}

/// Build the environment-variable layer from a captured environment.
///
/// Each variable is stored under both canonical spellings only.
#[must_use]
pub fn environment_layer(vars: &BTreeMap<String, String>) -> Layer {
    Layer::from_entries(
        LayerKind::EnvironmentVariable,
        vars.iter().map(|(key, value)| (key.as_str(), value.as_str())),
    )
}
