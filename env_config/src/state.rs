//! Resolve-once state shared across a process.
//!
//! Hosts usually own a [`ProcessState`] and hand out the resolved
//! [`EnvConfig`] from it. [`global`] offers the same thing as a process-wide
//! static that reads the real environment.

use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::EnvConfigResult;
use crate::engine::EnvConfig;

type Loader = Box<dyn Fn() -> EnvConfigResult<EnvConfig> + Send + Sync>;

/// Lazily resolved configuration with an explicit reset.
///
/// Concurrent first calls to [`ProcessState::get`] run the loader exactly
/// once and every caller receives the same instance. A failed resolution is
/// not cached; the next call tries again.
///
/// # Examples
///
/// ```
/// use env_config::{EnvConfig, ProcessState};
///
/// let state = ProcessState::new(|| {
///     EnvConfig::builder()
///         .environment_variables([("ENV_CONFIG_PATH", "/nonexistent")])
///         .build()
/// });
/// assert!(state.get().is_err());
/// assert!(!state.is_resolved());
/// ```
pub struct ProcessState {
    loader: Loader,
    instance: RwLock<Option<Arc<EnvConfig>>>,
}

impl ProcessState {
    /// Wrap `loader`; nothing is resolved until the first [`ProcessState::get`].
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> EnvConfigResult<EnvConfig> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            instance: RwLock::new(None),
        }
    }

    /// The resolved configuration, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error. Nothing is cached in that case.
    pub fn get(&self) -> EnvConfigResult<Arc<EnvConfig>> {
        if let Some(config) = self.cached() {
            return Ok(config);
        }
        let mut slot = self.instance.write();
        if let Some(config) = slot.as_ref() {
            return Ok(Arc::clone(config));
        }
        let config = Arc::new((self.loader)()?);
        *slot = Some(Arc::clone(&config));
        drop(slot);
        debug!(environment = config.environment(), "configuration resolved");
        Ok(config)
    }

    /// Discard the resolved configuration, including runtime overrides.
    ///
    /// Callers still holding an earlier instance keep it.
    pub fn reset(&self) {
        if self.instance.write().take().is_some() {
            debug!("configuration reset");
        }
    }

    /// Whether a configuration is currently cached.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.instance.read().is_some()
    }

    fn cached(&self) -> Option<Arc<EnvConfig>> {
        self.instance.read().clone()
    }
}

impl fmt::Debug for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessState")
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

/// Process-wide state resolving from the real environment and working
/// directory.
///
/// Prefer an owned [`ProcessState`] where the host can pass one around.
#[must_use]
pub fn global() -> &'static ProcessState {
    static GLOBAL: LazyLock<ProcessState> =
        LazyLock::new(|| ProcessState::new(EnvConfig::from_process));
    &GLOBAL
}
