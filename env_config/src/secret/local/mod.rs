//! Encrypted local secret database.
//!
//! The database is a JSON container holding an Argon2id salt, an AES-256-GCM
//! nonce and the sealed payload, all hex encoded. The payload is a tree of
//! groups: the first top-level group belongs to the project and holds one
//! sub-group per environment whose entries become key/value pairs.
//!
//! The group model follows KeePass, but the file is not a KDBX database and
//! KeePass clients cannot read or write it. Provision it with
//! [`SecretDatabase::seal`].

use std::collections::BTreeMap;
use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SecretLookup, SecretSource};
use crate::settings::KeepassSettings;
use crate::{EnvConfigError, EnvConfigResult};

const SOURCE_NAME: &str = "keepass";
const KEY_LEN: usize = 32;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// A named group of entries and sub-groups.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretGroup {
    /// Group name; surrounding whitespace is ignored when matching.
    pub name: String,
    /// Nested groups.
    #[serde(default)]
    pub groups: Vec<SecretGroup>,
    /// Entries stored directly in this group.
    #[serde(default)]
    pub entries: Vec<SecretEntry>,
}

impl SecretGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a nested group.
    #[must_use]
    pub fn with_group(mut self, group: Self) -> Self {
        self.groups.push(group);
        self
    }

    /// Append an entry.
    #[must_use]
    pub fn with_entry(mut self, title: impl Into<String>, password: impl Into<String>) -> Self {
        self.entries.push(SecretEntry {
            title: title.into(),
            password: password.into(),
        });
        self
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.groups.iter().find(|group| group.name.trim() == name)
    }
}

/// A single secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    /// Entry title, used as the configuration key.
    pub title: String,
    /// Secret value.
    pub password: String,
}

#[derive(Serialize, Deserialize)]
struct SealedContainer {
    salt: String,
    nonce: String,
    ciphertext: String,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    groups: Vec<SecretGroup>,
}

/// Decrypted contents of a secret database.
///
/// # Examples
///
/// ```
/// use env_config::secret::{SecretDatabase, SecretGroup};
/// use env_config::secret::SecretLookup;
/// use secrecy::SecretString;
///
/// let dir = tempfile::tempdir()?;
/// let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("app.secrets"))
///     .map_err(|_| std::io::Error::other("non UTF-8 temp dir"))?;
/// let key = SecretString::from(String::from("master"));
/// let defaults = SecretGroup::new("default").with_entry("db.password", "s3cret");
/// SecretDatabase::new(vec![SecretGroup::new("app").with_group(defaults)]).seal(&path, &key)?;
///
/// let db = SecretDatabase::open(&path, &key)?;
/// let SecretLookup::Found(entries) = db.environment("default")? else {
///     panic!("default group present");
/// };
/// assert_eq!(entries.get("db.password").map(String::as_str), Some("s3cret"));
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretDatabase {
    groups: Vec<SecretGroup>,
}

impl SecretDatabase {
    /// Wrap top-level groups; the first one is the project group.
    #[must_use]
    pub const fn new(groups: Vec<SecretGroup>) -> Self {
        Self { groups }
    }

    /// Decrypt the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::UpstreamSourceFailure`] when the file is
    /// missing, malformed, or does not decrypt with `master_key`.
    pub fn open(path: &Utf8Path, master_key: &SecretString) -> EnvConfigResult<Self> {
        let (dir, name) = open_parent(path)?;
        if !dir.is_file(&name) {
            return Err(
                EnvConfigError::upstream(SOURCE_NAME, format!("Database {name} does not exist!"))
                    .shared(),
            );
        }
        let raw = dir
            .read_to_string(&name)
            .map_err(|err| opening_failed(err.to_string()))?;
        let container: SealedContainer =
            serde_json::from_str(&raw).map_err(|err| opening_failed(err.to_string()))?;
        let salt = hex::decode(&container.salt).map_err(|err| opening_failed(err.to_string()))?;
        let nonce_bytes: [u8; NONCE_LEN] = hex::decode(&container.nonce)
            .map_err(|err| opening_failed(err.to_string()))?
            .try_into()
            .map_err(|_| opening_failed("invalid nonce size"))?;
        let ciphertext =
            hex::decode(&container.ciphertext).map_err(|err| opening_failed(err.to_string()))?;
        let key = derive_key(master_key, &salt)?;
        let plaintext = Aes256Gcm::new(&key.into())
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|_| opening_failed("wrong master key or corrupt database"))?;
        let payload: Payload =
            serde_json::from_slice(&plaintext).map_err(|err| opening_failed(err.to_string()))?;
        Ok(Self::new(payload.groups))
    }

    /// Encrypt the database with `master_key` and write it to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::UpstreamSourceFailure`] when encryption
    /// fails and [`EnvConfigError::File`] when the file cannot be written.
    pub fn seal(&self, path: &Utf8Path, master_key: &SecretString) -> EnvConfigResult<()> {
        let mut salt = [0_u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0_u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let key = derive_key(master_key, &salt)?;
        let payload = Payload {
            groups: self.groups.clone(),
        };
        let plaintext = serde_json::to_vec(&payload).map_err(sealing_failed)?;
        let ciphertext = Aes256Gcm::new(&key.into())
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|_| {
                EnvConfigError::upstream(SOURCE_NAME, "Error sealing database!").shared()
            })?;
        let container = SealedContainer {
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        };
        let body = serde_json::to_string_pretty(&container).map_err(sealing_failed)?;
        let (dir, name) = open_parent(path)?;
        dir.write(&name, body)
            .map_err(|err| EnvConfigError::file(path, err).shared())
    }

    /// The project group: the first top-level group.
    #[must_use]
    pub fn project_group(&self) -> Option<&SecretGroup> {
        self.groups.first()
    }

    /// Entries of the `environment` sub-group of the project group.
    ///
    /// Titles are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`EnvConfigError::UpstreamSourceFailure`] when the database
    /// has no project group.
    pub fn environment(&self, environment: &str) -> EnvConfigResult<SecretLookup> {
        let project = self.project_group().ok_or_else(|| {
            EnvConfigError::upstream(SOURCE_NAME, "Group Root not found in the database!").shared()
        })?;
        Ok(project
            .child(environment)
            .map_or(SecretLookup::NotFound, |group| {
                SecretLookup::Found(
                    group
                        .entries
                        .iter()
                        .map(|entry| (entry.title.trim().to_owned(), entry.password.clone()))
                        .collect::<BTreeMap<_, _>>(),
                )
            }))
    }
}

/// [`SecretSource`] backed by a [`SecretDatabase`] file.
#[derive(Debug)]
pub struct LocalSecretStore {
    database: SecretDatabase,
    group: String,
}

impl LocalSecretStore {
    /// Open `<group>.secrets` inside `config_dir`.
    ///
    /// # Errors
    ///
    /// See [`SecretDatabase::open`].
    pub fn open(config_dir: &Utf8Path, settings: &KeepassSettings) -> EnvConfigResult<Self> {
        let path = config_dir.join(settings.file_name());
        debug!(path = %path, "Loading config from keepass");
        let database = SecretDatabase::open(&path, settings.master_key())?;
        let group = database
            .project_group()
            .map_or_else(|| settings.group().to_owned(), |g| g.name.trim().to_owned());
        Ok(Self { database, group })
    }

    /// Wrap an already decrypted database.
    #[must_use]
    pub fn from_database(database: SecretDatabase) -> Self {
        let group = database
            .project_group()
            .map(|g| g.name.trim().to_owned())
            .unwrap_or_default();
        Self { database, group }
    }
}

impl SecretSource for LocalSecretStore {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn locate(&self, environment: &str) -> String {
        format!("{}/{environment}", self.group)
    }

    fn load(&self, environment: &str) -> EnvConfigResult<SecretLookup> {
        self.database.environment(environment)
    }
}

fn derive_key(master_key: &SecretString, salt: &[u8]) -> EnvConfigResult<[u8; KEY_LEN]> {
    let mut key = [0_u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(master_key.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|err| opening_failed(err.to_string()))?;
    Ok(key)
}

fn open_parent(path: &Utf8Path) -> EnvConfigResult<(Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| opening_failed(format!("'{path}' does not name a file")))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    if !parent.is_dir() {
        return Err(
            EnvConfigError::upstream(SOURCE_NAME, format!("Database {name} does not exist!"))
                .shared(),
        );
    }
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| EnvConfigError::file(parent, err).shared())?;
    Ok((dir, name.to_owned()))
}

fn sealing_failed(err: serde_json::Error) -> Arc<EnvConfigError> {
    EnvConfigError::upstream_with(SOURCE_NAME, "Error sealing database!", err).shared()
}

fn opening_failed(detail: impl Into<String>) -> Arc<EnvConfigError> {
    EnvConfigError::upstream(
        SOURCE_NAME,
        format!("Error opening database! {}", detail.into()),
    )
    .shared()
}
