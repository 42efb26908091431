//! Persistent API key storage.
//!
//! The key is stored under the fixed name `apiKey`, either in
//! `~/.config/note-converter/credentials.json` (owner-only permissions on
//! unix) or in the system keychain.

use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiKey;
use crate::paths::default_config_dir;

/// Environment variable consulted when no `--api-key` flag is given.
pub const API_KEY_ENV: &str = "NOTE_CONVERTER_API_KEY";

/// File name of the file-backed store.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Name the key is stored under, in the file and in the keychain.
pub const KEY_ENTRY_NAME: &str = "apiKey";

const KEYRING_SERVICE: &str = "note-converter";

/// Errors for API key storage operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The credentials file is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The system keychain could not be used.
    #[error("unable to access system keychain; use key_storage = \"file\" instead")]
    KeychainUnavailable,
}

/// Backend selection for [`open_key_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStorage {
    /// JSON file in the config directory.
    #[default]
    File,
    /// System keychain.
    Keychain,
}

/// Persists the API key between runs.
pub trait KeyStore: Send + Sync {
    /// Returns the stored key, or `None` when nothing (or a blank value) is stored.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError`] when the backend cannot be read.
    fn load(&self) -> Result<Option<ApiKey>, KeyStoreError>;

    /// Stores `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError`] when the backend cannot be written.
    fn save(&self, key: &ApiKey) -> Result<(), KeyStoreError>;

    /// Removes the stored key. Returns `true` when a key was removed.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError`] when the backend cannot be modified.
    fn clear(&self) -> Result<bool, KeyStoreError>;
}

/// Opens the store selected by `storage` at its default location.
///
/// # Errors
///
/// Returns [`KeyStoreError::ConfigDirUnavailable`] for the file backend when
/// no config directory can be determined.
pub fn open_key_store(storage: KeyStorage) -> Result<Box<dyn KeyStore>, KeyStoreError> {
    match storage {
        KeyStorage::File => Ok(Box::new(FileKeyStore::default_location()?)),
        KeyStorage::Keychain => Ok(Box::new(KeychainKeyStore::new())),
    }
}

/// Picks the key for a run: the explicit flag, then the environment value,
/// then the stored key. Blank values are skipped.
///
/// # Errors
///
/// Returns [`KeyStoreError`] only when the store has to be consulted and fails.
pub fn resolve_api_key(
    flag: Option<&str>,
    env_value: Option<&str>,
    store: &dyn KeyStore,
) -> Result<Option<ApiKey>, KeyStoreError> {
    if let Some(key) = flag.and_then(|value| ApiKey::new(value).ok()) {
        debug!("using API key from command line");
        return Ok(Some(key));
    }
    if let Some(key) = env_value.and_then(|value| ApiKey::new(value).ok()) {
        debug!(env = API_KEY_ENV, "using API key from environment");
        return Ok(Some(key));
    }
    let stored = store.load()?;
    if stored.is_some() {
        debug!("using stored API key");
    }
    Ok(stored)
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredKey {
    #[serde(rename = "apiKey", default)]
    api_key: String,
}

/// File-backed key store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Store backed by an explicit file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/credentials.json`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::ConfigDirUnavailable`] if no usable config dir is found.
    pub fn default_location() -> Result<Self, KeyStoreError> {
        let dir = default_config_dir().ok_or(KeyStoreError::ConfigDirUnavailable)?;
        Ok(Self::new(dir.join(CREDENTIALS_FILE_NAME)))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileKeyStore {
    fn load(&self) -> Result<Option<ApiKey>, KeyStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let stored: StoredKey = serde_json::from_slice(&bytes)?;
        Ok(ApiKey::new(stored.api_key).ok())
    }

    fn save(&self, key: &ApiKey) -> Result<(), KeyStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredKey {
            api_key: key.expose().to_string(),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;
        set_owner_only_permissions(&self.path)?;
        debug!(path = %self.path.display(), "API key saved");
        Ok(())
    }

    fn clear(&self) -> Result<bool, KeyStoreError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), KeyStoreError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), KeyStoreError> {
    Ok(())
}

/// Keychain-backed key store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeychainKeyStore {
    service: String,
    user: String,
}

impl Default for KeychainKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeychainKeyStore {
    /// Store using service `note-converter`, entry `apiKey`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            user: KEY_ENTRY_NAME.to_string(),
        }
    }

    // Some keychain backends panic instead of returning an error when no
    // session is available.
    fn entry(&self) -> Result<keyring::Entry, KeyStoreError> {
        catch_unwind(|| keyring::Entry::new(&self.service, &self.user))
            .map_err(|_| KeyStoreError::KeychainUnavailable)?
            .map_err(|_| KeyStoreError::KeychainUnavailable)
    }
}

impl KeyStore for KeychainKeyStore {
    fn load(&self) -> Result<Option<ApiKey>, KeyStoreError> {
        let entry = self.entry()?;
        match catch_unwind(AssertUnwindSafe(|| entry.get_password())) {
            Ok(Ok(secret)) => Ok(ApiKey::new(secret).ok()),
            Ok(Err(keyring::Error::NoEntry)) => Ok(None),
            _ => Err(KeyStoreError::KeychainUnavailable),
        }
    }

    fn save(&self, key: &ApiKey) -> Result<(), KeyStoreError> {
        let entry = self.entry()?;
        catch_unwind(AssertUnwindSafe(|| entry.set_password(key.expose())))
            .map_err(|_| KeyStoreError::KeychainUnavailable)?
            .map_err(|_| KeyStoreError::KeychainUnavailable)
    }

    fn clear(&self) -> Result<bool, KeyStoreError> {
        let entry = self.entry()?;
        match catch_unwind(AssertUnwindSafe(|| entry.delete_credential())) {
            Ok(Ok(())) => Ok(true),
            Ok(Err(keyring::Error::NoEntry)) => Ok(false),
            _ => Err(KeyStoreError::KeychainUnavailable),
        }
    }
}
