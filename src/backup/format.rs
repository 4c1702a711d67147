//! Backup container structures and file naming.
//!
//! Binary layouts (all version 0):
//!
//! ```text
//! SingleBackupStructure:  [ver][PinTable: 99 bytes][name: trailing UTF-8]
//! MultiBackupPinTable:    [ver][PinTable: 99 bytes][file name: trailing UTF-8]
//! MultiBackupStructure:   [ver][pin count: u8]
//!                         ([len: u16 BE][MultiBackupPinTable])*
//!                         [names: VaultIndex, trailing]
//! ```
//!
//! A backup file is the password-context encryption of the structure
//! bytes followed by [`INTEGRITY_MARKER`].

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::codec::{self, ByteReader, Serializable};
use crate::errors::{PinVaultError, Result};
use crate::vault::file::is_item_file_name;
use crate::vault::{PinTable, VaultIndex, PIN_TABLE_SIZE};

/// Appended to every backup plaintext before encryption.
pub const INTEGRITY_MARKER: &[u8] = b"INTGRTY";

/// Suffix of a single-item backup file.
pub const SINGLE_EXTENSION: &str = "pin";

/// Suffix of a full-vault backup file.
pub const MULTI_EXTENSION: &str = "pinc";

/// Largest number of items a full backup can hold (single-byte count).
pub const MAX_BACKUP_ITEMS: usize = u8::MAX as usize;

/// Which container a backup file holds, derived from its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Single,
    Multi,
}

impl BackupKind {
    /// Detect the kind from the file suffix (`.pin` / `.pinc`).
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(SINGLE_EXTENSION) => Ok(Self::Single),
            Some(MULTI_EXTENSION) => Ok(Self::Multi),
            _ => Err(PinVaultError::UnknownFileFormat(path.to_path_buf())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Single => SINGLE_EXTENSION,
            Self::Multi => MULTI_EXTENSION,
        }
    }
}

// ---------------------------------------------------------------------------
// Single-item backup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleBackupStructure {
    pub pin_table: PinTable,
    pub name: String,
}

impl Serializable for SingleBackupStructure {
    const NAME: &'static str = "SingleBackupStructure";
    const VERSION: u8 = 0;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![Self::VERSION];
        buf.extend_from_slice(&self.pin_table.to_bytes()?);
        buf.extend_from_slice(self.name.as_bytes());
        tracing::debug!(size = buf.len(), "encoded SingleBackupStructure");
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        codec::read_version::<Self>(&mut reader)?;
        let pin_table = PinTable::decode(reader.read_exact(PIN_TABLE_SIZE)?)?;
        let name = reader.read_remaining_str()?;
        Ok(Self { pin_table, name })
    }
}

// ---------------------------------------------------------------------------
// Full-vault backup
// ---------------------------------------------------------------------------

/// One item of a full backup: its table and vault file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiBackupPinTable {
    pub pin_table: PinTable,
    pub file_name: String,
}

impl Serializable for MultiBackupPinTable {
    const NAME: &'static str = "MultiBackupPinTable";
    const VERSION: u8 = 0;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![Self::VERSION];
        buf.extend_from_slice(&self.pin_table.to_bytes()?);
        buf.extend_from_slice(self.file_name.as_bytes());
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        codec::read_version::<Self>(&mut reader)?;
        let pin_table = PinTable::decode(reader.read_exact(PIN_TABLE_SIZE)?)?;
        let file_name = reader.read_remaining_str()?;
        if !is_item_file_name(&file_name) {
            return Err(PinVaultError::Decode(format!(
                "backup entry has an invalid file name '{file_name}'"
            )));
        }
        Ok(Self {
            pin_table,
            file_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiBackupStructure {
    pub pins: Vec<MultiBackupPinTable>,
    pub names: BTreeSet<String>,
}

impl Serializable for MultiBackupStructure {
    const NAME: &'static str = "MultiBackupStructure";
    const VERSION: u8 = 0;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let count =
            u8::try_from(self.pins.len()).map_err(|_| PinVaultError::TooManyItems(self.pins.len()))?;

        let mut buf = vec![Self::VERSION, count];
        for pin in &self.pins {
            codec::write_length_prefixed(&mut buf, &pin.to_bytes()?)?;
        }
        buf.extend_from_slice(&VaultIndex::new(self.names.clone()).to_bytes()?);
        tracing::debug!(pins = count, size = buf.len(), "encoded MultiBackupStructure");
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        codec::read_version::<Self>(&mut reader)?;

        let count = reader.read_u8()?;
        let mut pins = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            pins.push(MultiBackupPinTable::decode(reader.read_length_prefixed()?)?);
        }

        let names = VaultIndex::decode(reader.read_remaining())?.into_names();
        Ok(Self { pins, names })
    }
}

/// A decoded backup of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStructure {
    Single(SingleBackupStructure),
    Multi(MultiBackupStructure),
}

impl BackupStructure {
    pub fn kind(&self) -> BackupKind {
        match self {
            Self::Single(_) => BackupKind::Single,
            Self::Multi(_) => BackupKind::Multi,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Single(single) => single.to_bytes(),
            Self::Multi(multi) => multi.to_bytes(),
        }
    }

    /// Decode `bytes` as the structure `kind` selects.
    ///
    /// An unsupported version, here or in any nested structure, becomes an
    /// `UnsupportedVersion` error naming the structure that carried it.
    pub fn decode(kind: BackupKind, bytes: &[u8]) -> Result<Self> {
        match kind {
            BackupKind::Single => SingleBackupStructure::decode(bytes).map(Self::Single),
            BackupKind::Multi => MultiBackupStructure::decode(bytes).map(Self::Multi),
        }
    }
}

// ---------------------------------------------------------------------------
// Suggested file names
// ---------------------------------------------------------------------------

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// `PIN-<hash8>-<yyyyMMdd-HHmmss>.pin`
pub fn single_backup_file_name(item_hash: &str, at: DateTime<Local>) -> String {
    let short = item_hash.get(..8).unwrap_or(item_hash);
    format!(
        "PIN-{short}-{}.{SINGLE_EXTENSION}",
        at.format(TIMESTAMP_FORMAT)
    )
}

/// `PINs[<count>]-<yyyyMMdd-HHmmss>.pinc`
pub fn multi_backup_file_name(count: usize, at: DateTime<Local>) -> String {
    format!("PINs[{count}]-{}.{MULTI_EXTENSION}", at.format(TIMESTAMP_FORMAT))
}
