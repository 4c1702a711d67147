//! Password hardening for backup files using Argon2id.
//!
//! A backup file is the only thing protecting the vault once it leaves
//! the device, so the password is stretched with a memory-hard KDF.
//! Parameters are configurable via `Argon2Params` (loaded from
//! `.pinvault.toml` or sensible defaults).

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::{Zeroize, Zeroizing};

use super::encryption::KEY_LEN;
use crate::errors::{PinVaultError, Result};

/// Minimum salt length accepted by Argon2.
const MIN_SALT_LEN: usize = 8;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Configurable Argon2id parameters.
///
/// These map 1:1 to the fields in `Settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// A 32-byte key derived from a backup password.
///
/// Lives only for the duration of one export or import and is zeroed
/// on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct BackupKey {
    bytes: [u8; KEY_LEN],
}

impl BackupKey {
    /// Access the raw key bytes (e.g. to pass to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Derive a backup key from a password and salt with the default parameters.
pub fn derive_backup_key(password: &[u8], salt: &[u8]) -> Result<BackupKey> {
    derive_backup_key_with_params(password, salt, &Argon2Params::default())
}

/// Derive a backup key with explicit Argon2id parameters.
///
/// The same password + salt + params always produce the same key.
/// Enforces minimum parameters to prevent dangerously weak settings.
pub fn derive_backup_key_with_params(
    password: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<BackupKey> {
    validate_params(argon2_params)?;
    if salt.len() < MIN_SALT_LEN {
        return Err(PinVaultError::KeyDerivationFailed(format!(
            "salt must be at least {MIN_SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| PinVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password, salt, &mut key[..])
        .map_err(|e| PinVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(BackupKey { bytes: *key })
}

/// Reject parameter sets that would make the backup trivially brute-forceable.
pub fn validate_params(argon2_params: &Argon2Params) -> Result<()> {
    if argon2_params.memory_kib < MIN_MEMORY_KIB {
        return Err(PinVaultError::KeyDerivationFailed(format!(
            "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
            argon2_params.memory_kib
        )));
    }
    if argon2_params.iterations < 1 {
        return Err(PinVaultError::KeyDerivationFailed(
            "Argon2 iterations must be at least 1".into(),
        ));
    }
    if argon2_params.parallelism < 1 {
        return Err(PinVaultError::KeyDerivationFailed(
            "Argon2 parallelism must be at least 1".into(),
        ));
    }
    Ok(())
}
