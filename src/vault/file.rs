//! On-disk layout of a vault directory and atomic file writes.
//!
//! ```text
//! <vault_dir>/
//!   pins              encrypted VaultIndex
//!   p/p<hash>         one encrypted PinTable per item
//!   keys/<alias>.key  device key (file key store only)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::crypto::identity::{identity_hash, is_identity_hash};
use crate::errors::Result;

/// File name of the encrypted index.
pub const INDEX_FILE: &str = "pins";

/// Sub-directory holding item files.
pub const ITEM_DIR: &str = "p";

/// Sub-directory holding device keys for the file key store.
pub const KEY_DIR: &str = "keys";

/// Prefix of every item file name.
const ITEM_PREFIX: char = 'p';

/// Item file name for a display name: `p` + identity hash.
pub fn item_file_name(name: &str) -> String {
    format!("{ITEM_PREFIX}{}", identity_hash(name))
}

/// Returns `true` if `file_name` is a well-formed item file name.
///
/// Anything else (temp files, path separators, stray files) is ignored
/// on export and rejected on import.
pub fn is_item_file_name(file_name: &str) -> bool {
    file_name
        .strip_prefix(ITEM_PREFIX)
        .is_some_and(is_identity_hash)
}

/// Write `data` to `path` **atomically**.
///
/// Writes to a temp file in the same directory, then renames it over the
/// target, so readers never see a half-written file and a failed write
/// leaves the previous contents untouched.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = temp_path(path);
    if let Err(e) = fs::write(&tmp_path, data) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Temp file used by `write_atomic`: `.<file name>.tmp` next to `path`.
fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn item_file_name_is_prefixed_hash() {
        let file_name = item_file_name("Card A");
        assert!(file_name.starts_with('p'));
        assert_eq!(file_name.len(), 33);
        assert!(is_item_file_name(&file_name));
    }

    #[test]
    fn rejects_foreign_file_names() {
        assert!(!is_item_file_name("pins"));
        assert!(!is_item_file_name(".pabc.tmp"));
        assert!(!is_item_file_name("p../../../../etc/passwd"));
        assert!(!is_item_file_name(&format!("q{}", "0".repeat(32))));
    }

    #[test]
    fn write_atomic_replaces_contents_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pins");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temp file must not be left behind");
    }

    #[test]
    fn write_atomic_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("pins");
        assert!(write_atomic(&path, b"data").is_err());
        assert!(!path.exists());
    }
}
