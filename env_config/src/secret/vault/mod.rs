//! Remote secret service speaking the Vault KV version 2 HTTP API.
//!
//! The client validates its token once (with linear backoff) and then reads
//! `<secret path>/<environment>` for each environment. A secret path's first
//! segment names the KV mount, so `path/to/project/default` is fetched from
//! `/v1/path/data/to/project/default`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error};

use super::{SecretLookup, SecretSource};
use crate::settings::{ControlKey, VaultSettings};
use crate::{EnvConfigError, EnvConfigResult};

const SOURCE_NAME: &str = "vault";
const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";
const LOOKUP_SELF: &str = "v1/auth/token/lookup-self";

/// Default pause unit between token validation attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Bounded linear backoff: attempt `n` (zero based) waits `n * interval`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` attempts.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause after the failed attempt `attempt`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.interval.saturating_mul(attempt)
    }
}

/// Blocking HTTP client for the secret service.
pub struct VaultClient {
    http: Client,
    address: String,
    namespace: String,
    token: SecretString,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Build a client for `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::UpstreamSourceFailure`] when the HTTP client
    /// cannot be constructed.
    pub fn new(settings: &VaultSettings) -> EnvConfigResult<Self> {
        let http = Client::builder().build().map_err(|err| {
            EnvConfigError::upstream_with(SOURCE_NAME, "Could not connect to vault", err).shared()
        })?;
        Ok(Self {
            http,
            address: settings.address.trim_end_matches('/').to_owned(),
            namespace: settings.namespace.clone(),
            token: settings.token.clone(),
        })
    }

    /// Check the token against `lookup-self`, retrying per `policy`.
    ///
    /// A policy allowing zero attempts skips validation.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::UpstreamSourceFailure`] once every attempt
    /// has failed.
    pub fn validate_token(&self, policy: &RetryPolicy) -> EnvConfigResult<()> {
        let max = policy.max_attempts();
        for attempt in 0..max {
            let failure = match self.get(LOOKUP_SELF) {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => format!("token lookup returned {}", response.status()),
                Err(err) => err.to_string(),
            };
            if attempt + 1 == max {
                let message = format!(
                    "Reached {} limit ({max}) attempting to validate token",
                    ControlKey::VaultValidateTokenMaxRetries.env_var()
                );
                error!(%failure, "{message}");
                return Err(EnvConfigError::upstream_with(SOURCE_NAME, message, failure).shared());
            }
            let delay = policy.delay(attempt);
            error!(
                %failure,
                retry_in = ?delay,
                "An exception occurred validating the vault token, will retry"
            );
            thread::sleep(delay);
        }
        Ok(())
    }

    /// Read `secret`, returning `None` when the service does not answer 200.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::UpstreamSourceFailure`] when the request
    /// fails or the body is not a KV version 2 payload.
    pub fn read(&self, secret: &str) -> EnvConfigResult<Option<BTreeMap<String, String>>> {
        let response = self.get(&data_path(secret)).map_err(|err| {
            EnvConfigError::upstream_with(SOURCE_NAME, "Could not read data from vault.", err)
                .shared()
        })?;
        if response.status() != StatusCode::OK {
            debug!(secret, status = %response.status(), "vault secret unavailable");
            return Ok(None);
        }
        let body: Value = response.json().map_err(|err| {
            EnvConfigError::upstream_with(SOURCE_NAME, "Could not read data from vault.", err)
                .shared()
        })?;
        let Some(data) = body.pointer("/data/data").and_then(Value::as_object) else {
            return Err(EnvConfigError::upstream(
                SOURCE_NAME,
                format!("Vault secret {secret} has no data"),
            )
            .shared());
        };
        Ok(Some(
            data.iter()
                .map(|(key, value)| (key.clone(), render(value)))
                .collect(),
        ))
    }

    fn get(&self, path: &str) -> reqwest::Result<Response> {
        self.http
            .get(format!("{}/{path}", self.address))
            .header(TOKEN_HEADER, self.token.expose_secret())
            .header(NAMESPACE_HEADER, &self.namespace)
            .send()
    }
}

/// [`SecretSource`] reading one secret path per environment.
#[derive(Debug, Clone)]
pub struct VaultSecretSource {
    client: Arc<VaultClient>,
    path: String,
}

impl VaultSecretSource {
    /// Read `<path>/<environment>` through `client`.
    #[must_use]
    pub fn new(client: Arc<VaultClient>, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

impl SecretSource for VaultSecretSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn locate(&self, environment: &str) -> String {
        format!("{}/{environment}", self.path.trim_end_matches('/'))
    }

    fn load(&self, environment: &str) -> EnvConfigResult<SecretLookup> {
        let secret = self.locate(environment);
        Ok(self
            .client
            .read(&secret)?
            .map_or(SecretLookup::NotFound, SecretLookup::Found))
    }
}

/// Build the sources for `settings`: the primary path, then the optional
/// default path. The token is validated before anything is read.
///
/// # Errors
///
/// Propagates client construction and token validation failures.
pub fn vault_sources(
    settings: &VaultSettings,
    retry_interval: Duration,
) -> EnvConfigResult<Vec<VaultSecretSource>> {
    debug!(
        address = %settings.address,
        namespace = %settings.namespace,
        "Loading config from vault"
    );
    let client = Arc::new(VaultClient::new(settings)?);
    client.validate_token(&RetryPolicy::new(settings.max_retries, retry_interval))?;
    let mut sources = vec![VaultSecretSource::new(
        Arc::clone(&client),
        settings.secret_path.clone(),
    )];
    if let Some(path) = &settings.default_secret_path {
        sources.push(VaultSecretSource::new(client, path.clone()));
    }
    Ok(sources)
}

fn data_path(secret: &str) -> String {
    let trimmed = secret.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((mount, rest)) => format!("v1/{mount}/data/{rest}"),
        None => format!("v1/{trimmed}/data"),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
