use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{self, Argon2Params};
use crate::crypto::{CipherService, DeviceKeyStore, FileKeyBackend, KeyBackend};
use crate::errors::{PinVaultError, Result};
use crate::vault::file::KEY_DIR;
use crate::vault::VaultStore;

/// Where the device key lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreKind {
    /// `<vault_dir>/keys/<alias>.key`, owner-only permissions.
    File,
    /// The OS keyring (needs the `keyring-store` feature).
    Keyring,
}

/// Project-level configuration, loaded from `.pinvault.toml`.
///
/// Every field has a sensible default so PinVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the working directory) holding the vault.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Device key storage backend.
    #[serde(default = "default_key_store")]
    pub key_store: KeyStoreKind,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Backup passwords tried before an import gives up.
    #[serde(default = "default_max_password_attempts")]
    pub max_password_attempts: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".pinvault".to_string()
}

fn default_key_store() -> KeyStoreKind {
    KeyStoreKind::File
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_max_password_attempts() -> u32 {
    3
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            key_store: default_key_store(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            max_password_attempts: default_max_password_attempts(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".pinvault.toml";

    /// Load settings from `<project_dir>/.pinvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or holds unusable values,
    /// an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PinVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;
        settings.validate()?;

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_password_attempts == 0 {
            return Err(PinVaultError::ConfigError(
                "max_password_attempts must be at least 1".into(),
            ));
        }
        kdf::validate_params(&self.argon2_params())
    }

    /// Full path of the vault directory.
    ///
    /// Example: `project_dir/.pinvault`
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Build the configured device key backend for the vault at `vault_dir`.
    pub fn key_backend(&self, vault_dir: &Path) -> Result<Box<dyn KeyBackend>> {
        match self.key_store {
            KeyStoreKind::File => Ok(Box::new(FileKeyBackend::new(&vault_dir.join(KEY_DIR)))),
            #[cfg(feature = "keyring-store")]
            KeyStoreKind::Keyring => Ok(Box::new(crate::keyring::KeyringKeyBackend)),
            #[cfg(not(feature = "keyring-store"))]
            KeyStoreKind::Keyring => Err(PinVaultError::ConfigError(
                "key_store = \"keyring\" requires building with --features keyring-store".into(),
            )),
        }
    }

    /// Open the vault at `vault_dir` with the configured key store and
    /// Argon2 parameters.
    pub fn open_store(&self, vault_dir: &Path) -> Result<VaultStore> {
        let keystore = DeviceKeyStore::new(self.key_backend(vault_dir)?);
        let cipher = CipherService::new(Arc::new(keystore), self.argon2_params());
        VaultStore::open(vault_dir, cipher)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
