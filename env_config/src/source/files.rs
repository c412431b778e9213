//! Directory reader for environment and profile layers.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use tracing::debug;

use super::properties::parse_properties;
use crate::layer::{Layer, LayerKind};
use crate::{EnvConfigError, EnvConfigResult};

const PROPERTIES_EXTENSION: &str = ".properties";

/// How a missing directory is treated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Presence {
    /// A missing directory fails the resolution.
    Required,
    /// A missing directory yields an empty layer.
    Optional,
}

/// Read the environment directory `dir` into an `EnvironmentFile` layer.
///
/// # Errors
///
/// Returns [`EnvConfigError::InvalidConfigLocation`] when `dir` is missing,
/// is not a directory, or holds no `.properties` files, and
/// [`EnvConfigError::File`] when a file cannot be read or parsed.
pub fn read_environment_dir(dir: &Utf8Path, environment: &str) -> EnvConfigResult<Layer> {
    read_properties_dir(
        dir,
        Layer::for_environment(LayerKind::EnvironmentFile, environment),
        Presence::Required,
    )
}

/// Read the profile directory `dir` into a `ProfileFile` layer.
///
/// A missing directory yields an empty layer.
///
/// # Errors
///
/// Returns [`EnvConfigError::InvalidConfigLocation`] when `dir` exists but is
/// not a directory or holds no `.properties` files, and
/// [`EnvConfigError::File`] when a file cannot be read or parsed.
pub fn read_profile_dir(dir: &Utf8Path, environment: &str) -> EnvConfigResult<Layer> {
    read_properties_dir(
        dir,
        Layer::for_environment(LayerKind::ProfileFile, environment),
        Presence::Optional,
    )
}

/// Fill `layer` from the `.properties` files directly under `dir`.
///
/// Files are visited in name order and the first file to define a key wins,
/// as does the first occurrence of a key within one file.
///
/// # Errors
///
/// See [`read_environment_dir`].
pub fn read_properties_dir(
    dir: &Utf8Path,
    layer: Layer,
    presence: Presence,
) -> EnvConfigResult<Layer> {
    if presence == Presence::Optional && !dir.exists() {
        debug!(path = %dir, "skipping missing optional directory");
        return Ok(layer);
    }
    if !dir.is_dir() {
        return Err(EnvConfigError::missing_directory(dir).shared());
    }
    let handle = Dir::open_ambient_dir(dir, ambient_authority())
        .map_err(|err| EnvConfigError::file(dir, err).shared())?;
    let files = list_properties(&handle, dir)?;
    if files.is_empty() {
        debug!(path = %dir, "No property files found");
        return Err(EnvConfigError::empty_directory(dir).shared());
    }
    let mut filled = layer.with_origin(dir.as_str());
    for name in files {
        let path = dir.join(&name);
        debug!(path = %path, "Getting config from file");
        let contents = handle
            .read_to_string(&name)
            .map_err(|err| EnvConfigError::file(&path, err).shared())?;
        let entries =
            parse_properties(&contents).map_err(|err| EnvConfigError::file(&path, err).shared())?;
        for (key, value) in entries {
            filled.insert_if_absent(&key, value);
        }
    }
    Ok(filled)
}

fn list_properties(handle: &Dir, dir: &Utf8Path) -> EnvConfigResult<Vec<String>> {
    let mut names = Vec::new();
    let entries = handle
        .entries()
        .map_err(|err| EnvConfigError::file(dir, err).shared())?;
    for entry in entries {
        let name = entry
            .and_then(|e| e.file_name())
            .map_err(|err| EnvConfigError::file(dir, err).shared())?;
        if name.ends_with(PROPERTIES_EXTENSION) && handle.is_file(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
