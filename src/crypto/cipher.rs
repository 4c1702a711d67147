//! Cipher service: the two encryption contexts PinVault uses.
//!
//! - **At rest**: vault items and the index, encrypted under the device
//!   key held by the [`DeviceKeyStore`].
//! - **Password**: backup files, encrypted under a key derived from the
//!   backup password with Argon2id.
//!
//! Both produce `[16-byte IV][AES-256-CBC/PKCS7 ciphertext]`.  In the
//! password context the IV also serves as the Argon2 salt, so every
//! backup gets its own key without changing the file layout.

use std::sync::Arc;

use super::encryption::{self, IV_LEN};
use super::kdf::{self, Argon2Params};
use super::keystore::DeviceKeyStore;
use crate::errors::Result;

/// Alias of the device key that protects the vault.
pub const DEVICE_KEY_ALIAS: &str = "pinvault-device";

/// Which key a payload is encrypted under.
#[derive(Clone, Copy)]
pub enum CipherContext<'a> {
    /// The device key.
    AtRest,
    /// A key derived from this backup password.
    Password(&'a str),
}

/// Encrypts and decrypts payloads in either context.
#[derive(Clone)]
pub struct CipherService {
    keystore: Arc<DeviceKeyStore>,
    argon2: Argon2Params,
}

impl CipherService {
    pub fn new(keystore: Arc<DeviceKeyStore>, argon2: Argon2Params) -> Self {
        Self { keystore, argon2 }
    }

    /// Argon2 parameters used for the password context.
    pub fn argon2_params(&self) -> &Argon2Params {
        &self.argon2
    }

    /// Encrypt `plaintext`, returning `IV || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8], context: CipherContext<'_>) -> Result<Vec<u8>> {
        match context {
            CipherContext::AtRest => self.keystore.encrypt(DEVICE_KEY_ALIAS, plaintext),
            CipherContext::Password(password) => {
                let iv = encryption::generate_iv();
                let key = kdf::derive_backup_key_with_params(password.as_bytes(), &iv, &self.argon2)?;
                encryption::encrypt_with_iv(key.as_bytes(), &iv, plaintext)
            }
        }
    }

    /// Decrypt `IV || ciphertext`.
    ///
    /// Fails with `DecryptionFailed` when the key is wrong or the data is
    /// corrupt.  A wrong key can still (rarely) produce valid padding, so
    /// callers that need certainty must check their own integrity marker.
    pub fn decrypt(&self, ciphertext_with_iv: &[u8], context: CipherContext<'_>) -> Result<Vec<u8>> {
        match context {
            CipherContext::AtRest => self.keystore.decrypt(DEVICE_KEY_ALIAS, ciphertext_with_iv),
            CipherContext::Password(password) => {
                let (iv, _) = encryption::split_iv(ciphertext_with_iv)?;
                let salt: [u8; IV_LEN] = *iv;
                let key = kdf::derive_backup_key_with_params(password.as_bytes(), &salt, &self.argon2)?;
                encryption::decrypt(key.as_bytes(), ciphertext_with_iv)
            }
        }
    }
}
