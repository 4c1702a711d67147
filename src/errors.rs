use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in PinVault.
#[derive(Debug, Error)]
pub enum PinVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Key store error: {0}")]
    KeyStoreError(String),

    // --- Codec errors ---
    #[error("{structure} version {version} is not supported by this release")]
    UnsupportedVersion { structure: &'static str, version: u8 },

    #[error("Malformed data: {0}")]
    Decode(String),

    // --- Vault errors ---
    #[error("A PIN named '{0}' already exists")]
    NameCollision(String),

    #[error("PIN '{0}' not found")]
    ItemNotFound(String),

    #[error("Invalid PIN name: {0}")]
    InvalidName(String),

    #[error("PIN table is not completely filled")]
    IncompletePinTable,

    #[error("Invalid PIN table: {0}")]
    InvalidPinTable(String),

    // --- Backup errors ---
    #[error("Unknown backup file format: {0} (expected .pin or .pinc)")]
    UnknownFileFormat(PathBuf),

    #[error("Invalid backup password: {0}")]
    InvalidPassword(String),

    #[error("Cannot back up {0} PINs; a full backup holds at most 255")]
    TooManyItems(usize),

    #[error("The vault is empty, nothing to back up")]
    VaultEmpty,

    #[error("Invalid backup destination: {0}")]
    InvalidDestination(PathBuf),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for PinVault results.
pub type Result<T> = std::result::Result<T, PinVaultError>;
