//! Temporary configuration trees.
//!
//! ```
//! use env_config_test_helpers::ConfigTree;
//!
//! let tree = ConfigTree::new()?;
//! tree.environment("default", "default.properties", &[("property.one", "default")])?;
//! tree.profile("test", "prof1", "prof1.properties", &[("property.two", "prof1")])?;
//! assert!(tree.config_path().join("default/default.properties").is_file());
//! # Ok::<_, std::io::Error>(())
//! ```

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Name of the configuration directory inside the tree.
pub const CONFIG_DIR: &str = "config";

/// Temporary directory laid out like an application root.
///
/// The directory is removed when the tree is dropped.
#[derive(Debug)]
pub struct ConfigTree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl ConfigTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary directory cannot be created or its
    /// path is not UTF-8.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| io::Error::other(format!("non UTF-8 path: {}", path.display())))?;
        Ok(Self { _dir: dir, root })
    }

    /// Root of the tree, standing in for the working directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The `config` directory under the root.
    #[must_use]
    pub fn config_path(&self) -> Utf8PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// Write `file` into the directory of `environment`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be written.
    pub fn environment(
        &self,
        environment: &str,
        file: &str,
        entries: &[(&str, &str)],
    ) -> io::Result<Utf8PathBuf> {
        self.write_properties(&format!("{CONFIG_DIR}/{environment}/{file}"), entries)
    }

    /// Write `file` into the `profile` directory of `environment`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be written.
    pub fn profile(
        &self,
        environment: &str,
        profile: &str,
        file: &str,
        entries: &[(&str, &str)],
    ) -> io::Result<Utf8PathBuf> {
        self.write_properties(&format!("{CONFIG_DIR}/{environment}/{profile}/{file}"), entries)
    }

    /// Write `entries` as `key=value` lines to `relative`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be written.
    pub fn write_properties(
        &self,
        relative: &str,
        entries: &[(&str, &str)],
    ) -> io::Result<Utf8PathBuf> {
        let contents: String = entries
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();
        self.write(relative, &contents)
    }

    /// Write raw `contents` to `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or file cannot be written.
    pub fn write(&self, relative: &str, contents: &str) -> io::Result<Utf8PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Create the directory `relative` without any files.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn mkdir(&self, relative: &str) -> io::Result<Utf8PathBuf> {
        let path = self.root.join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }
}
