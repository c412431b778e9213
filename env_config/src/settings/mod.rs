//! Engine-control keys and the typed settings derived from them.
//!
//! Control keys steer the resolver itself: where environment directories
//! live, which environments and profile to load, and how to reach the secret
//! stores. Each key is read from the injected system properties first, then
//! from the process environment under its `SCREAMING_SNAKE` spelling, and
//! finally falls back to a default.

mod system;

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use secrecy::SecretString;

use crate::chain::{DEFAULT_ENVIRONMENT, EnvironmentChain};
use crate::key::to_env_key;
use crate::{EnvConfigError, EnvConfigResult};

pub use system::SystemProperties;

/// Default base directory for environment directories.
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Default number of token validation attempts against the secret service.
pub const DEFAULT_VAULT_MAX_RETRIES: u32 = 5;

const DATABASE_EXTENSION: &str = ".secrets";

/// KeePass extension accepted in configured names; the container format differs.
const KEEPASS_EXTENSION: &str = ".kdbx";

/// Keys that control the resolver.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ControlKey {
    /// Base directory holding one sub-directory per environment.
    ConfigPath,
    /// Comma-delimited environment list.
    Environment,
    /// Profile overlay name.
    Profile,
    /// Base directory for profile overlays.
    ProfilesPath,
    /// Enables the local secret database.
    KeepassEnabled,
    /// Local secret database name.
    KeepassFilename,
    /// Master key for the local secret database.
    KeepassMasterKey,
    /// Enables the remote secret service.
    VaultEnabled,
    /// Remote secret service address.
    VaultAddress,
    /// Remote secret service namespace.
    VaultNamespace,
    /// Secondary secret path consulted after the primary one.
    VaultDefaultSecretPath,
    /// Primary secret path.
    VaultSecretPath,
    /// Token for the remote secret service.
    VaultToken,
    /// Maximum token validation attempts.
    VaultValidateTokenMaxRetries,
}

impl ControlKey {
    /// Every control key.
    pub const ALL: [Self; 14] = [
        Self::ConfigPath,
        Self::Environment,
        Self::Profile,
        Self::ProfilesPath,
        Self::KeepassEnabled,
        Self::KeepassFilename,
        Self::KeepassMasterKey,
        Self::VaultEnabled,
        Self::VaultAddress,
        Self::VaultNamespace,
        Self::VaultDefaultSecretPath,
        Self::VaultSecretPath,
        Self::VaultToken,
        Self::VaultValidateTokenMaxRetries,
    ];

    /// Dotted property name of the key.
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::ConfigPath => "env.config.path",
            Self::Environment => "env.config.environment",
            Self::Profile => "env.config.profile",
            Self::ProfilesPath => "env.config.profiles.path",
            Self::KeepassEnabled => "env.config.keepass.enabled",
            Self::KeepassFilename => "env.config.keepass.filename",
            Self::KeepassMasterKey => "env.config.keepass.masterkey",
            Self::VaultEnabled => "env.config.vault.enabled",
            Self::VaultAddress => "env.config.vault.address",
            Self::VaultNamespace => "env.config.vault.namespace",
            Self::VaultDefaultSecretPath => "env.config.vault.default.secret.path",
            Self::VaultSecretPath => "env.config.vault.secret.path",
            Self::VaultToken => "env.config.vault.token",
            Self::VaultValidateTokenMaxRetries => "env.config.vault.validate.token.max.retries",
        }
    }

    /// Environment-variable name of the key.
    #[must_use]
    pub fn env_var(self) -> String {
        to_env_key(self.property())
    }
}

/// Reads control keys from system properties, then environment variables.
#[derive(Clone, Copy, Debug)]
pub struct ControlLookup<'a> {
    system: &'a SystemProperties,
    environment: &'a BTreeMap<String, String>,
}

impl<'a> ControlLookup<'a> {
    /// Look keys up in `system` before `environment`.
    #[must_use]
    pub const fn new(
        system: &'a SystemProperties,
        environment: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            system,
            environment,
        }
    }

    /// Raw value of `key`, if supplied anywhere.
    #[must_use]
    pub fn get(&self, key: ControlKey) -> Option<&'a str> {
        self.system
            .get(key.property())
            .or_else(|| self.environment.get(&key.env_var()).map(String::as_str))
    }

    /// Value of `key` or `default`.
    #[must_use]
    pub fn get_or(&self, key: ControlKey, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Value of `key`, failing with `MissingRequiredVariable` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::MissingRequiredVariable`] naming the property
    /// spelling of `key`.
    pub fn require(&self, key: ControlKey) -> EnvConfigResult<&'a str> {
        self.get(key)
            .ok_or_else(|| EnvConfigError::missing_variable(key.property()).shared())
    }

    /// Lenient boolean: `true` in any case is true, anything else is false.
    #[must_use]
    pub fn flag(&self, key: ControlKey) -> bool {
        self.get(key).is_some_and(parse_flag)
    }
}

/// Parse a boolean the lenient way: only `true`, ignoring case, is true.
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

/// Settings for the local encrypted secret database.
#[derive(Debug)]
pub struct KeepassSettings {
    group: String,
    master_key: SecretString,
}

impl KeepassSettings {
    /// Build settings from a database name and master key.
    ///
    /// A trailing `.secrets` or `.kdbx` extension and any leading directories
    /// are removed from `filename`; the remainder names both the file and its
    /// top group. The file itself is always `<group>.secrets`.
    #[must_use]
    pub fn new(filename: &str, master_key: SecretString) -> Self {
        let name = Utf8Path::new(filename).file_name().unwrap_or(filename);
        let group = name
            .strip_suffix(DATABASE_EXTENSION)
            .or_else(|| name.strip_suffix(KEEPASS_EXTENSION))
            .unwrap_or(name);
        Self {
            group: group.to_owned(),
            master_key,
        }
    }

    /// Group name, which is also the database file stem.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// File name of the database.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{DATABASE_EXTENSION}", self.group)
    }

    /// Master key protecting the database.
    #[must_use]
    pub const fn master_key(&self) -> &SecretString {
        &self.master_key
    }
}

/// Settings for the remote secret service.
#[derive(Debug)]
pub struct VaultSettings {
    /// Base address, for example `https://vault.example.com`.
    pub address: String,
    /// Namespace sent with every request.
    pub namespace: String,
    /// Access token.
    pub token: SecretString,
    /// Primary secret path, without the environment segment.
    pub secret_path: String,
    /// Optional secondary secret path with lower precedence.
    pub default_secret_path: Option<String>,
    /// Maximum token validation attempts.
    pub max_retries: u32,
}

/// Typed view of every control key.
#[derive(Debug)]
pub struct Settings {
    config_path: Utf8PathBuf,
    profiles_path: Utf8PathBuf,
    profiles_path_explicit: bool,
    environments: EnvironmentChain,
    profile: Option<String>,
    keepass: Option<KeepassSettings>,
    vault: Option<VaultSettings>,
}

impl Settings {
    /// Read settings through `lookup`, resolving relative paths against
    /// `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::MissingRequiredVariable`] when an enabled
    /// secret store lacks a required key and [`EnvConfigError::InvalidValue`]
    /// when the retry limit is not an unsigned integer.
    pub fn from_lookup(
        lookup: &ControlLookup<'_>,
        working_dir: &Utf8Path,
    ) -> EnvConfigResult<Self> {
        let config_path =
            working_dir.join(lookup.get_or(ControlKey::ConfigPath, DEFAULT_CONFIG_PATH));
        let profiles_path = lookup
            .get(ControlKey::ProfilesPath)
            .map(|path| working_dir.join(path));
        let environments =
            EnvironmentChain::parse(lookup.get_or(ControlKey::Environment, DEFAULT_ENVIRONMENT));
        let profile = lookup
            .get(ControlKey::Profile)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let keepass = if lookup.flag(ControlKey::KeepassEnabled) {
            Some(Self::read_keepass(lookup, working_dir)?)
        } else {
            None
        };
        let vault = if lookup.flag(ControlKey::VaultEnabled) {
            Some(Self::read_vault(lookup)?)
        } else {
            None
        };
        Ok(Self {
            profiles_path_explicit: profiles_path.is_some(),
            profiles_path: profiles_path.unwrap_or_else(|| config_path.clone()),
            config_path,
            environments,
            profile,
            keepass,
            vault,
        })
    }

    fn read_keepass(
        lookup: &ControlLookup<'_>,
        working_dir: &Utf8Path,
    ) -> EnvConfigResult<KeepassSettings> {
        let master_key = lookup.require(ControlKey::KeepassMasterKey)?;
        let filename = lookup
            .get(ControlKey::KeepassFilename)
            .or_else(|| working_dir.file_name())
            .ok_or_else(|| {
                EnvConfigError::missing_variable(ControlKey::KeepassFilename.property()).shared()
            })?;
        Ok(KeepassSettings::new(
            filename,
            SecretString::from(master_key.to_owned()),
        ))
    }

    fn read_vault(lookup: &ControlLookup<'_>) -> EnvConfigResult<VaultSettings> {
        let max_retries = match lookup.get(ControlKey::VaultValidateTokenMaxRetries) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                EnvConfigError::invalid_value(
                    ControlKey::VaultValidateTokenMaxRetries.property(),
                    raw,
                    "an unsigned integer",
                )
                .shared()
            })?,
            None => DEFAULT_VAULT_MAX_RETRIES,
        };
        Ok(VaultSettings {
            address: lookup.require(ControlKey::VaultAddress)?.to_owned(),
            namespace: lookup.require(ControlKey::VaultNamespace)?.to_owned(),
            token: SecretString::from(lookup.require(ControlKey::VaultToken)?.to_owned()),
            secret_path: lookup.require(ControlKey::VaultSecretPath)?.to_owned(),
            default_secret_path: lookup
                .get(ControlKey::VaultDefaultSecretPath)
                .map(str::to_owned),
            max_retries,
        })
    }

    /// Base directory holding the environment directories.
    #[must_use]
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    /// Directory of `environment`.
    #[must_use]
    pub fn environment_dir(&self, environment: &str) -> Utf8PathBuf {
        self.config_path.join(environment)
    }

    /// Base directory for profile overlays.
    #[must_use]
    pub fn profiles_path(&self) -> &Utf8Path {
        &self.profiles_path
    }

    /// Whether the profiles directory was configured explicitly.
    #[must_use]
    pub const fn profiles_path_explicit(&self) -> bool {
        self.profiles_path_explicit
    }

    /// Directory of `profile` within `environment`.
    #[must_use]
    pub fn profile_dir(&self, environment: &str, profile: &str) -> Utf8PathBuf {
        self.profiles_path.join(environment).join(profile)
    }

    /// Environment chain, most specific first.
    #[must_use]
    pub const fn environments(&self) -> &EnvironmentChain {
        &self.environments
    }

    /// Selected profile, if any.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Local secret database settings when enabled.
    #[must_use]
    pub const fn keepass(&self) -> Option<&KeepassSettings> {
        self.keepass.as_ref()
    }

    /// Remote secret service settings when enabled.
    #[must_use]
    pub const fn vault(&self) -> Option<&VaultSettings> {
        self.vault.as_ref()
    }
}
