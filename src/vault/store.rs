//! High-level vault operations used by the CLI and the backup protocol.
//!
//! `VaultStore` wraps the on-disk layout, the codec and the at-rest
//! cipher so callers work with display names and `PinTable`s only.
//! An item is never overwritten: saving under a name whose file already
//! exists reports a collision and leaves the existing item alone.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::file::{self, is_item_file_name, item_file_name, INDEX_FILE, ITEM_DIR};
use super::index;
use super::pin_table::PinTable;
use crate::codec::Serializable;
use crate::crypto::{CipherContext, CipherService};
use crate::errors::{PinVaultError, Result};

/// Longest display name accepted.
pub const MAX_NAME_LEN: usize = 30;

/// Result of `VaultStore::save_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    NameCollision,
}

/// Result of `VaultStore::delete_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// The main vault handle.  Open one with `VaultStore::open`, then use its
/// methods to manage items.
pub struct VaultStore {
    /// Root of the vault directory.
    dir: PathBuf,

    /// Cipher used for items and the index (at-rest context) and handed to
    /// the backup protocol (password context).
    cipher: CipherService,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open the vault rooted at `dir`, creating its directories if needed.
    pub fn open(dir: &Path, cipher: CipherService) -> Result<Self> {
        fs::create_dir_all(dir.join(ITEM_DIR))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            cipher,
        })
    }

    // ------------------------------------------------------------------
    // Item operations
    // ------------------------------------------------------------------

    /// Encrypt and store a filled table under `name`.
    ///
    /// The item file is written first; the name is only added to the
    /// index once the item exists.
    pub fn save_item(&self, name: &str, table: &PinTable) -> Result<SaveOutcome> {
        Self::validate_name(name)?;
        if !table.is_filled() {
            return Err(PinVaultError::IncompletePinTable);
        }

        if !self.write_item_file(&item_file_name(name), table)? {
            return Ok(SaveOutcome::NameCollision);
        }
        index::append_strings(&self.cipher, &self.index_path(), [name])?;
        tracing::info!("saved new PIN");
        Ok(SaveOutcome::Created)
    }

    /// Remove the item named `name` and its index entry.
    ///
    /// The index must decrypt before anything is removed, so a damaged
    /// index never costs an item file.
    pub fn delete_item(&self, name: &str) -> Result<DeleteOutcome> {
        index::load_index(&self.cipher, &self.index_path())?;

        let path = self.item_path(&item_file_name(name));
        let had_file = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        let had_entry = index::remove_string(&self.cipher, &self.index_path(), name)?;

        if had_file || had_entry {
            tracing::info!(had_file, had_entry, "deleted PIN");
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    /// Display names of every stored item.
    pub fn list_items(&self) -> Result<BTreeSet<String>> {
        Ok(index::load_index(&self.cipher, &self.index_path())?.into_names())
    }

    /// Decrypt the item named `name`.
    pub fn load_item(&self, name: &str) -> Result<PinTable> {
        let file_name = item_file_name(name);
        if !self.item_path(&file_name).exists() {
            return Err(PinVaultError::ItemNotFound(name.to_string()));
        }
        self.read_item_file(&file_name)
    }

    /// Returns `true` if an item file exists for `name`.
    ///
    /// File-system check only; nothing is decrypted.
    pub fn contains_item(&self, name: &str) -> bool {
        self.item_path(&item_file_name(name)).exists()
    }

    // ------------------------------------------------------------------
    // Raw item files (used by the backup protocol)
    // ------------------------------------------------------------------

    /// Sorted names of all well-formed item files.
    pub fn item_file_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.dir.join(ITEM_DIR))? {
            let entry = entry?;
            if let Some(file_name) = entry.file_name().to_str() {
                if is_item_file_name(file_name) {
                    names.push(file_name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Decrypt and decode the item file `file_name`.
    pub fn read_item_file(&self, file_name: &str) -> Result<PinTable> {
        let encrypted = fs::read(self.item_path(file_name))?;
        let plaintext = self.cipher.decrypt(&encrypted, CipherContext::AtRest)?;
        PinTable::decode(&plaintext)
    }

    /// Encrypt `table` into a new item file.
    ///
    /// Returns `false` without touching anything if the file exists.
    pub fn write_item_file(&self, file_name: &str, table: &PinTable) -> Result<bool> {
        if !is_item_file_name(file_name) {
            return Err(PinVaultError::Decode(format!(
                "'{file_name}' is not a valid item file name"
            )));
        }
        let path = self.item_path(file_name);
        if path.exists() {
            return Ok(false);
        }
        let encrypted = self
            .cipher
            .encrypt(&table.to_bytes()?, CipherContext::AtRest)?;
        file::write_atomic(&path, &encrypted)?;
        Ok(true)
    }

    /// Remove the item file `file_name`, if present.  The index is not
    /// touched.
    pub fn remove_item_file(&self, file_name: &str) -> Result<()> {
        match fs::remove_file(self.item_path(file_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Union `names` into the index.
    pub fn append_names<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        index::append_strings(&self.cipher, &self.index_path(), names)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the vault directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the cipher service this vault encrypts with.
    pub fn cipher(&self) -> &CipherService {
        &self.cipher
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn item_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(ITEM_DIR).join(file_name)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validate a display name: non-empty, at most 30 characters.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(PinVaultError::InvalidName("name cannot be empty".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(PinVaultError::InvalidName(format!(
                "name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }
        Ok(())
    }
}
