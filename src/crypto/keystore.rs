//! Device key store for at-rest encryption.
//!
//! Vault items and the index are encrypted under a random 256-bit key
//! that is generated once per device and kept by a [`KeyBackend`]
//! (a key file, the OS keyring, or memory).  Callers never see the key:
//! they ask the [`DeviceKeyStore`] to encrypt or decrypt under a named
//! alias and the store performs the operation internally.
//!
//! Key creation is create-if-absent.  The store serializes get-or-create
//! behind a mutex, and the file backend uses `create_new` so a second
//! process racing on the same directory adopts the first key instead of
//! writing its own.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::RngCore;
use zeroize::Zeroize;

use super::encryption::{self, KEY_LEN};
use crate::errors::{PinVaultError, Result};

/// A device key.  Zeroed on drop and never exposed outside the crate.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct DeviceKey {
    bytes: [u8; KEY_LEN],
}

impl DeviceKey {
    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub(crate) fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            PinVaultError::KeyStoreError(format!(
                "stored key must be exactly {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Persistent storage for device keys.
pub trait KeyBackend: Send + Sync {
    /// Load the key stored under `alias`, if any.
    fn load(&self, alias: &str) -> Result<Option<DeviceKey>>;

    /// Store `key` under `alias` unless a key already exists.
    ///
    /// Returns the key that ended up stored, which is the existing one if
    /// another writer got there first.
    fn create(&self, alias: &str, key: DeviceKey) -> Result<DeviceKey>;
}

/// Encrypt/decrypt under named device keys, creating them on first use.
pub struct DeviceKeyStore {
    backend: Box<dyn KeyBackend>,
    keys: Mutex<HashMap<String, DeviceKey>>,
}

impl DeviceKeyStore {
    pub fn new(backend: Box<dyn KeyBackend>) -> Self {
        Self {
            backend,
            keys: Mutex::new(HashMap::new()),
        }
    }

    /// A store whose keys live only in this process.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKeyBackend::default()))
    }

    /// Encrypt `plaintext` under the key named `alias`.
    pub fn encrypt(&self, alias: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.with_key(alias, |key| encryption::encrypt(key.as_bytes(), plaintext))
    }

    /// Decrypt `ciphertext_with_iv` under the key named `alias`.
    pub fn decrypt(&self, alias: &str, ciphertext_with_iv: &[u8]) -> Result<Vec<u8>> {
        self.with_key(alias, |key| {
            encryption::decrypt(key.as_bytes(), ciphertext_with_iv)
        })
    }

    fn with_key<R>(&self, alias: &str, op: impl FnOnce(&DeviceKey) -> Result<R>) -> Result<R> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| PinVaultError::KeyStoreError("key store lock poisoned".into()))?;

        if !keys.contains_key(alias) {
            let key = match self.backend.load(alias)? {
                Some(key) => key,
                None => {
                    tracing::info!(alias, "creating device key");
                    self.backend.create(alias, DeviceKey::generate())?
                }
            };
            keys.insert(alias.to_string(), key);
        }

        let key = keys
            .get(alias)
            .ok_or_else(|| PinVaultError::KeyStoreError(format!("key '{alias}' unavailable")))?;
        op(key)
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Keeps each key in `<dir>/<alias>.key` with owner-only permissions.
pub struct FileKeyBackend {
    dir: PathBuf,
}

impl FileKeyBackend {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn key_path(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{alias}.key"))
    }
}

impl KeyBackend for FileKeyBackend {
    fn load(&self, alias: &str) -> Result<Option<DeviceKey>> {
        let path = self.key_path(alias);
        let mut data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PinVaultError::KeyStoreError(format!(
                    "failed to read key file {}: {e}",
                    path.display()
                )))
            }
        };
        let key = DeviceKey::from_slice(&data);
        data.zeroize();
        key.map(Some)
    }

    fn create(&self, alias: &str, key: DeviceKey) -> Result<DeviceKey> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            PinVaultError::KeyStoreError(format!("cannot create key directory: {e}"))
        })?;

        let path = self.key_path(alias);
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);

        // On Unix, restrict permissions to owner-only read/write.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = match options.open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return self.load(alias)?.ok_or_else(|| {
                    PinVaultError::KeyStoreError(format!("key file {} vanished", path.display()))
                });
            }
            Err(e) => {
                return Err(PinVaultError::KeyStoreError(format!(
                    "failed to create key file: {e}"
                )))
            }
        };

        file.write_all(key.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| PinVaultError::KeyStoreError(format!("failed to write key file: {e}")))?;

        Ok(key)
    }
}

// ---------------------------------------------------------------------------
// Memory backend
// ---------------------------------------------------------------------------

/// Keeps keys in process memory.  Used by tests and embedders that manage
/// key persistence themselves.
#[derive(Default)]
pub struct MemoryKeyBackend {
    keys: Mutex<HashMap<String, DeviceKey>>,
}

impl KeyBackend for MemoryKeyBackend {
    fn load(&self, alias: &str) -> Result<Option<DeviceKey>> {
        let keys = self
            .keys
            .lock()
            .map_err(|_| PinVaultError::KeyStoreError("memory backend lock poisoned".into()))?;
        Ok(keys.get(alias).cloned())
    }

    fn create(&self, alias: &str, key: DeviceKey) -> Result<DeviceKey> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| PinVaultError::KeyStoreError("memory backend lock poisoned".into()))?;
        Ok(keys.entry(alias.to_string()).or_insert(key).clone())
    }
}
