//! Cryptographic primitives for PinVault.
//!
//! This module provides:
//! - AES-256-CBC encryption and decryption (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - XXH3-128 identity hashing for vault file names (`identity`)
//! - The device key store (`keystore`)
//! - The cipher service combining both contexts (`cipher`)

pub mod cipher;
pub mod encryption;
pub mod identity;
pub mod kdf;
pub mod keystore;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{CipherService, CipherContext, identity_hash, ...};
pub use cipher::{CipherContext, CipherService, DEVICE_KEY_ALIAS};
pub use encryption::{decrypt, encrypt};
pub use identity::identity_hash;
pub use kdf::{derive_backup_key, derive_backup_key_with_params, Argon2Params};
pub use keystore::{DeviceKeyStore, FileKeyBackend, KeyBackend, MemoryKeyBackend};
