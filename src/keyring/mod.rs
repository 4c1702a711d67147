//! OS keyring backend for device keys.
//!
//! Stores the device key in the operating system's secure credential
//! store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! The key is stored base64-encoded since keyring entries are strings.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use crate::crypto::keystore::{DeviceKey, KeyBackend};
use crate::errors::{PinVaultError, Result};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "pinvault";

/// Build a keyring entry key from a key alias.
fn entry_key(alias: &str) -> String {
    format!("device-key:{alias}")
}

fn entry(alias: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, &entry_key(alias))
        .map_err(|e| PinVaultError::KeyStoreError(format!("failed to create keyring entry: {e}")))
}

/// Device keys kept in the OS keyring.
#[derive(Default)]
pub struct KeyringKeyBackend;

impl KeyBackend for KeyringKeyBackend {
    fn load(&self, alias: &str) -> Result<Option<DeviceKey>> {
        match entry(alias)?.get_password() {
            Ok(mut encoded) => {
                let decoded = BASE64.decode(&encoded);
                encoded.zeroize();
                let mut bytes = decoded.map_err(|e| {
                    PinVaultError::KeyStoreError(format!("keyring entry is not valid base64: {e}"))
                })?;
                let key = DeviceKey::from_slice(&bytes);
                bytes.zeroize();
                key.map(Some)
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(PinVaultError::KeyStoreError(format!(
                "failed to read from keyring: {e}"
            ))),
        }
    }

    fn create(&self, alias: &str, key: DeviceKey) -> Result<DeviceKey> {
        // The keyring has no create-if-absent primitive; re-check so an
        // entry written by another process is adopted rather than replaced.
        if let Some(existing) = self.load(alias)? {
            return Ok(existing);
        }

        let mut encoded = BASE64.encode(key.as_bytes());
        let stored = entry(alias)?.set_password(&encoded);
        encoded.zeroize();
        stored.map_err(|e| {
            PinVaultError::KeyStoreError(format!("failed to store key in keyring: {e}"))
        })?;

        Ok(key)
    }
}
