//! Export and restore of password-protected backup files.
//!
//! Export: load items from the vault, build the backup structure, append
//! the integrity marker, encrypt in the password context and write the
//! destination in one atomic step.
//!
//! Restore: detect the container from the file suffix, decrypt, check the
//! integrity marker, decode, then merge into the vault without ever
//! overwriting an existing item.  A wrong password and a corrupted file
//! look the same here; both ask the caller for the password again.

use std::fmt;
use std::fs;
use std::path::Path;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::format::{
    BackupKind, BackupStructure, MultiBackupPinTable, MultiBackupStructure,
    SingleBackupStructure, INTEGRITY_MARKER, MAX_BACKUP_ITEMS,
};
use crate::crypto::CipherContext;
use crate::errors::{PinVaultError, Result};
use crate::vault::file::{item_file_name, write_atomic};
use crate::vault::VaultStore;

/// Minimum backup password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 10;

/// Maximum backup password length, in characters.
pub const MAX_PASSWORD_LEN: usize = 100;

/// Wrong-password attempts allowed by default before a restore gives up.
pub const DEFAULT_MAX_PASSWORD_ATTEMPTS: u32 = 3;

/// Supplies backup passwords during a restore.
pub trait PasswordPrompt {
    /// Ask for the backup password.  `retry_with_error` is `true` when
    /// the previous password did not open the file.
    fn backup_password(&mut self, retry_with_error: bool) -> Result<Zeroizing<String>>;
}

/// Receives coarse progress (0, 25, 50, 75, 100) during export and restore.
pub trait ProgressObserver {
    fn progress(&self, percent: u8, message: &str);
}

/// Observer that ignores every notification.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn progress(&self, _percent: u8, _message: &str) {}
}

/// Outcome of a completed restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub kind: BackupKind,
    /// Items written to the vault.
    pub imported: usize,
    /// Items contained in the backup.
    pub total: usize,
}

impl ImportSummary {
    /// Items skipped because the vault already had them.
    pub fn skipped(&self) -> usize {
        self.total - self.imported
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} imported", self.imported, self.total)
    }
}

/// Result of one restore attempt with a given password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreAttempt {
    Restored(ImportSummary),
    /// The password did not open the file (or the file is corrupt).
    /// Nothing was changed.
    WrongPassword,
}

/// Check a backup password's length.
pub fn validate_backup_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(PinVaultError::InvalidPassword(format!(
            "must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Backup export and restore for one vault.
pub struct BackupProtocol<'a> {
    store: &'a VaultStore,
    max_password_attempts: u32,
}

impl<'a> BackupProtocol<'a> {
    pub fn new(store: &'a VaultStore) -> Self {
        Self {
            store,
            max_password_attempts: DEFAULT_MAX_PASSWORD_ATTEMPTS,
        }
    }

    /// Number of passwords `import_backup` asks for before giving up.
    pub fn with_max_password_attempts(mut self, attempts: u32) -> Self {
        self.max_password_attempts = attempts.max(1);
        self
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Write the item `name` to `destination` (a `.pin` file).
    pub fn export_single(
        &self,
        name: &str,
        password: &str,
        destination: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        validate_backup_password(password)?;
        check_destination(destination, BackupKind::Single)?;

        progress.progress(0, "Loading PIN");
        let pin_table = self.store.load_item(name)?;
        let structure = BackupStructure::Single(SingleBackupStructure {
            pin_table,
            name: name.to_string(),
        });

        progress.progress(25, "Building backup");
        self.seal_and_write(&structure, password, destination, progress)?;
        tracing::info!("exported single PIN backup");
        Ok(())
    }

    /// Write every item and the index to `destination` (a `.pinc` file).
    /// Returns the number of items exported.
    pub fn export_all(
        &self,
        password: &str,
        destination: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<usize> {
        validate_backup_password(password)?;
        check_destination(destination, BackupKind::Multi)?;

        progress.progress(0, "Loading PINs");
        let file_names = self.store.item_file_names()?;
        if file_names.is_empty() {
            return Err(PinVaultError::VaultEmpty);
        }
        if file_names.len() > MAX_BACKUP_ITEMS {
            return Err(PinVaultError::TooManyItems(file_names.len()));
        }

        let names = self.store.list_items()?;
        let mut pins = Vec::with_capacity(file_names.len());
        for file_name in file_names {
            let pin_table = self.store.read_item_file(&file_name)?;
            pins.push(MultiBackupPinTable {
                pin_table,
                file_name,
            });
        }
        let count = pins.len();

        progress.progress(25, "Building backup");
        let structure = BackupStructure::Multi(MultiBackupStructure { pins, names });
        self.seal_and_write(&structure, password, destination, progress)?;
        tracing::info!(count, "exported full backup");
        Ok(count)
    }

    /// Encode + marker, encrypt, write.  Reports 50, 75 and 100.
    fn seal_and_write(
        &self,
        structure: &BackupStructure,
        password: &str,
        destination: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        let mut plaintext = Zeroizing::new(structure.to_bytes()?);
        plaintext.extend_from_slice(INTEGRITY_MARKER);

        progress.progress(50, "Encrypting");
        let encrypted = self
            .store
            .cipher()
            .encrypt(&plaintext, CipherContext::Password(password))?;

        progress.progress(75, "Writing file");
        write_atomic(destination, &encrypted)?;

        progress.progress(100, "Backup complete");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Restore
    // ------------------------------------------------------------------

    /// Restore `source`, asking `prompt` for the password until one opens
    /// the file or the attempts run out (`DecryptionFailed`).
    ///
    /// An unknown suffix fails before the prompt is consulted.  An
    /// unsupported format version is returned as an error straight away.
    pub fn import_backup(
        &self,
        source: &Path,
        prompt: &mut dyn PasswordPrompt,
        progress: &dyn ProgressObserver,
    ) -> Result<ImportSummary> {
        let kind = BackupKind::from_path(source)?;
        let data = fs::read(source)?;

        let mut retry_with_error = false;
        for attempt in 1..=self.max_password_attempts {
            let password = prompt.backup_password(retry_with_error)?;
            match self.restore(kind, &data, &password, progress) {
                Ok(RestoreAttempt::Restored(summary)) => return Ok(summary),
                Ok(RestoreAttempt::WrongPassword) | Err(PinVaultError::InvalidPassword(_)) => {
                    tracing::warn!(attempt, "backup password rejected");
                    retry_with_error = true;
                }
                Err(e) => return Err(e),
            }
        }
        Err(PinVaultError::DecryptionFailed)
    }

    /// Try a single password against `source`.
    pub fn try_import(
        &self,
        source: &Path,
        password: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<RestoreAttempt> {
        let kind = BackupKind::from_path(source)?;
        let data = fs::read(source)?;
        self.restore(kind, &data, password, progress)
    }

    fn restore(
        &self,
        kind: BackupKind,
        data: &[u8],
        password: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<RestoreAttempt> {
        validate_backup_password(password)?;

        progress.progress(0, "Decrypting");
        let plaintext = match self
            .store
            .cipher()
            .decrypt(data, CipherContext::Password(password))
        {
            Ok(plaintext) => Zeroizing::new(plaintext),
            Err(PinVaultError::DecryptionFailed) => return Ok(RestoreAttempt::WrongPassword),
            Err(e) => return Err(e),
        };

        progress.progress(25, "Checking integrity");
        let Some(body) = strip_integrity_marker(&plaintext) else {
            return Ok(RestoreAttempt::WrongPassword);
        };

        progress.progress(50, "Reading backup");
        let structure = BackupStructure::decode(kind, body)?;

        progress.progress(75, "Importing");
        let summary = match structure {
            BackupStructure::Single(single) => self.merge_single(single)?,
            BackupStructure::Multi(multi) => self.merge_multi(multi)?,
        };

        progress.progress(100, "Import complete");
        tracing::info!(
            imported = summary.imported,
            total = summary.total,
            "restored backup"
        );
        Ok(RestoreAttempt::Restored(summary))
    }

    fn merge_single(&self, single: SingleBackupStructure) -> Result<ImportSummary> {
        VaultStore::validate_name(&single.name)?;

        let file_name = item_file_name(&single.name);
        let imported = self.store.write_item_file(&file_name, &single.pin_table)?;
        if !imported {
            tracing::warn!(item = &file_name[..9], "item already exists, not imported");
        }
        self.store.append_names([single.name.as_str()])?;
        Ok(ImportSummary {
            kind: BackupKind::Single,
            imported: usize::from(imported),
            total: 1,
        })
    }

    /// Write every new item, then index the names whose items are now in
    /// the vault.  A failed write removes the files this call created and
    /// leaves the index untouched.
    fn merge_multi(&self, multi: MultiBackupStructure) -> Result<ImportSummary> {
        for name in &multi.names {
            VaultStore::validate_name(name)?;
        }

        let mut written = Vec::new();
        for pin in &multi.pins {
            match self.store.write_item_file(&pin.file_name, &pin.pin_table) {
                Ok(true) => written.push(pin.file_name.as_str()),
                Ok(false) => {
                    tracing::warn!(item = &pin.file_name[..9], "item already exists, not imported");
                }
                Err(e) => {
                    self.discard(&written);
                    return Err(e);
                }
            }
        }

        let present = multi
            .names
            .iter()
            .filter(|name| self.store.contains_item(name))
            .map(String::as_str);
        if let Err(e) = self.store.append_names(present) {
            self.discard(&written);
            return Err(e);
        }

        Ok(ImportSummary {
            kind: BackupKind::Multi,
            imported: written.len(),
            total: multi.pins.len(),
        })
    }

    /// Best-effort removal of item files written by an import that failed.
    fn discard(&self, file_names: &[&str]) {
        for file_name in file_names {
            if let Err(e) = self.store.remove_item_file(file_name) {
                tracing::warn!(item = &file_name[..9], error = %e, "could not remove partial import");
            }
        }
    }
}

/// The destination suffix must match the container being written.
fn check_destination(destination: &Path, expected: BackupKind) -> Result<()> {
    match BackupKind::from_path(destination) {
        Ok(kind) if kind == expected => Ok(()),
        _ => Err(PinVaultError::InvalidDestination(destination.to_path_buf())),
    }
}

/// Split off the trailing integrity marker, comparing in constant time.
fn strip_integrity_marker(plaintext: &[u8]) -> Option<&[u8]> {
    let split = plaintext.len().checked_sub(INTEGRITY_MARKER.len())?;
    let (body, marker) = plaintext.split_at(split);
    if bool::from(marker.ct_eq(INTEGRITY_MARKER)) {
        Some(body)
    } else {
        None
    }
}
