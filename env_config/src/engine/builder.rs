//! Builder and resolution pipeline for [`EnvConfig`].

use std::collections::BTreeMap;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::EnvConfig;
use crate::layer::Layer;
use crate::merge::LayerStack;
use crate::secret::vault::{DEFAULT_RETRY_INTERVAL, vault_sources};
use crate::secret::{LocalSecretStore, SecretSource, secret_layers};
use crate::settings::{ControlLookup, Settings, SystemProperties};
use crate::source::{
    environment_layer, process_environment, read_environment_dir, read_profile_dir,
};
use crate::suppress::OverrideSuppressor;
use crate::{EnvConfigError, EnvConfigResult};

/// Builder for [`EnvConfig`].
///
/// Everything the resolver reads from the host can be injected here; values
/// left unset fall back to the real process (environment variables and the
/// working directory).
///
/// # Examples
///
/// ```rust,no_run
/// use env_config::EnvConfig;
///
/// # fn run() -> env_config::EnvConfigResult<()> {
/// let config = EnvConfig::builder()
///     .system_property("env.config.environment", "test")
///     .build()?;
/// println!("resolved for {}", config.environment());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EnvConfigBuilder {
    system: SystemProperties,
    environment: Option<BTreeMap<String, String>>,
    working_dir: Option<Utf8PathBuf>,
    secret_sources: Vec<Box<dyn SecretSource>>,
    vault_retry_interval: Duration,
}

impl Default for EnvConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvConfigBuilder {
    /// Create a builder reading everything from the process.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            system: SystemProperties::new(),
            environment: None,
            working_dir: None,
            secret_sources: Vec::new(),
            vault_retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Add one system property.
    #[must_use]
    pub fn system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system.insert(key, value);
        self
    }

    /// Add several system properties.
    #[must_use]
    pub fn system_properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.system.extend(properties);
        self
    }

    /// Use `vars` instead of the process environment.
    #[must_use]
    pub fn environment_variables<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Resolve relative paths against `dir` instead of the working directory.
    #[must_use]
    pub fn working_directory(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Append a secret source consulted after the built-in stores.
    #[must_use]
    pub fn secret_source(mut self, source: impl SecretSource + 'static) -> Self {
        self.secret_sources.push(Box::new(source));
        self
    }

    /// Pause unit between secret service token validation attempts.
    #[must_use]
    pub fn vault_retry_interval(mut self, interval: Duration) -> Self {
        self.vault_retry_interval = interval;
        self
    }

    /// Run one resolution pass.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised by a required source; nothing is
    /// partially resolved.
    pub fn build(self) -> EnvConfigResult<EnvConfig> {
        let environment = self.environment.unwrap_or_else(process_environment);
        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => current_dir()?,
        };
        let lookup = ControlLookup::new(&self.system, &environment);
        let settings = Settings::from_lookup(&lookup, &working_dir)?;
        let chain = settings.environments().clone();
        debug!(environments = %chain, "resolving configuration");
        if !settings.config_path().is_dir() {
            return Err(EnvConfigError::missing_directory(settings.config_path()).shared());
        }

        let file_layers = chain
            .iter()
            .map(|env| read_environment_dir(&settings.environment_dir(env), env))
            .collect::<EnvConfigResult<Vec<_>>>()?;

        let mut variables = environment_layer(&environment);
        let suppressed = match (file_layers.first(), file_layers.last()) {
            (Some(current), Some(default)) => {
                OverrideSuppressor::new(&chain, current, default).apply(&mut variables)
            }
            _ => Vec::new(),
        };

        let sources = secret_sources(&settings, self.vault_retry_interval, self.secret_sources)?;
        let mut secrets = Vec::new();
        for source in &sources {
            secrets.extend(secret_layers(source.as_ref(), &chain)?);
        }

        let profile_layers = profile_layers(&settings)?;

        let mut stack = LayerStack::new();
        debug!("Loading config from system properties");
        stack.push(self.system.to_layer());
        debug!("Loading config from process environment");
        stack.push(variables);
        stack.push_all(secrets);
        stack.push_all(profile_layers);
        debug!(environments = %chain, "Loading config from environment directories");
        stack.push_all(file_layers);

        Ok(EnvConfig::from_parts(chain, stack.merge(), suppressed))
    }
}

/// Built-in stores first (remote service, then local database), then `extra`.
fn secret_sources(
    settings: &Settings,
    retry_interval: Duration,
    extra: Vec<Box<dyn SecretSource>>,
) -> EnvConfigResult<Vec<Box<dyn SecretSource>>> {
    let mut sources: Vec<Box<dyn SecretSource>> = Vec::new();
    if let Some(vault) = settings.vault() {
        for source in vault_sources(vault, retry_interval)? {
            sources.push(Box::new(source));
        }
    }
    if let Some(keepass) = settings.keepass() {
        sources.push(Box::new(LocalSecretStore::open(settings.config_path(), keepass)?));
    }
    sources.extend(extra);
    Ok(sources)
}

fn profile_layers(settings: &Settings) -> EnvConfigResult<Vec<Layer>> {
    let Some(profile) = settings.profile() else {
        return Ok(Vec::new());
    };
    if settings.profiles_path_explicit() && !settings.profiles_path().is_dir() {
        return Err(EnvConfigError::missing_directory(settings.profiles_path()).shared());
    }
    debug!(
        profile,
        environments = %settings.environments(),
        "Loading config from profile"
    );
    settings
        .environments()
        .iter()
        .map(|env| read_profile_dir(&settings.profile_dir(env, profile), env))
        .collect()
}

fn current_dir() -> EnvConfigResult<Utf8PathBuf> {
    let dir = std::env::current_dir()
        .map_err(|err| EnvConfigError::file(Utf8Path::new("."), err).shared())?;
    Utf8PathBuf::try_from(dir)
        .map_err(|err| EnvConfigError::file(Utf8Path::new("."), err).shared())
}
