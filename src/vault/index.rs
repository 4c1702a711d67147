//! The vault index: the set of display names stored in the vault.
//!
//! Binary layout (version 0):
//!
//! ```text
//! [version: 1 byte][count: u16 BE]([len: u16 BE][UTF-8 name])*
//! ```
//!
//! On disk the index is encrypted at rest.  Every change is a full
//! decrypt-modify-encrypt round trip that rewrites the file atomically.

use std::collections::BTreeSet;
use std::path::Path;

use super::file::write_atomic;
use crate::codec::strings::{read_string_set, write_string_set};
use crate::codec::{self, ByteReader, Serializable};
use crate::crypto::{CipherContext, CipherService};
use crate::errors::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultIndex {
    names: BTreeSet<String>,
}

impl VaultIndex {
    pub fn new(names: BTreeSet<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn into_names(self) -> BTreeSet<String> {
        self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Insert a name; returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    /// Remove a name; returns `false` if it was absent.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Serializable for VaultIndex {
    const NAME: &'static str = "VaultIndex";
    const VERSION: u8 = 0;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![Self::VERSION];
        write_string_set(&mut buf, &self.names)?;
        tracing::debug!(entries = self.names.len(), size = buf.len(), "encoded VaultIndex");
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        codec::read_version::<Self>(&mut reader)?;
        let names = read_string_set(&mut reader)?;
        reader.finish()?;
        Ok(Self { names })
    }
}

/// Read the index at `path`; a missing file is an empty index.
pub fn load_index(cipher: &CipherService, path: &Path) -> Result<VaultIndex> {
    if !path.exists() {
        return Ok(VaultIndex::default());
    }
    let encrypted = std::fs::read(path)?;
    let plaintext = cipher.decrypt(&encrypted, CipherContext::AtRest)?;
    VaultIndex::decode(&plaintext)
}

/// Encrypt and atomically write `index` to `path`.
pub fn store_index(cipher: &CipherService, path: &Path, index: &VaultIndex) -> Result<()> {
    let encrypted = cipher.encrypt(&index.to_bytes()?, CipherContext::AtRest)?;
    write_atomic(path, &encrypted)
}

/// Union `names` into the index at `path`, creating it if needed.
pub fn append_strings<'a>(
    cipher: &CipherService,
    path: &Path,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut index = load_index(cipher, path)?;
    let mut added = 0usize;
    for name in names {
        if index.insert(name) {
            added += 1;
        }
    }
    tracing::debug!(added, total = index.len(), "appending to index");
    store_index(cipher, path, &index)
}

/// Remove `name` from the index at `path`.  Returns `false` if absent.
pub fn remove_string(cipher: &CipherService, path: &Path, name: &str) -> Result<bool> {
    let mut index = load_index(cipher, path)?;
    if !index.remove(name) {
        return Ok(false);
    }
    store_index(cipher, path, &index)?;
    Ok(true)
}
