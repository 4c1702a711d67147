//! Integration tests for backup export and restore.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use pinvault::backup::{
    BackupProtocol, ImportSummary, MultiBackupPinTable, MultiBackupStructure, NoProgress,
    PasswordPrompt, ProgressObserver, RestoreAttempt, INTEGRITY_MARKER,
};
use pinvault::codec::Serializable;
use pinvault::crypto::{Argon2Params, CipherContext, CipherService, DeviceKeyStore};
use pinvault::errors::{PinVaultError, Result};
use pinvault::vault::file::item_file_name;
use pinvault::vault::{PinTable, VaultStore};
use tempfile::TempDir;
use zeroize::Zeroizing;

const FAST: Argon2Params = Argon2Params {
    memory_kib: 8_192,
    iterations: 1,
    parallelism: 1,
};

const PASSWORD: &str = "correctpw1234";
const WRONG_PASSWORD: &str = "wrongpassword1";

fn open_vault(dir: &TempDir) -> VaultStore {
    let cipher = CipherService::new(Arc::new(DeviceKeyStore::in_memory()), FAST);
    VaultStore::open(&dir.path().join("vault"), cipher).unwrap()
}

fn grid(seed: usize) -> PinTable {
    let mut table = PinTable::new();
    for row in 0..7 {
        for column in 0..7 {
            table.put(row, column, ((row * 3 + column * 5 + seed) % 10) as i8).unwrap();
            table.put_pattern(row, column, ((column + seed) % 10) as u8).unwrap();
        }
    }
    table
}

/// Answers with a fixed list of passwords and records the retry flags.
struct ScriptedPrompt {
    answers: Vec<&'static str>,
    retry_flags: Vec<bool>,
}

impl ScriptedPrompt {
    fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: answers.iter().rev().copied().collect(),
            retry_flags: Vec::new(),
        }
    }
}

impl PasswordPrompt for ScriptedPrompt {
    fn backup_password(&mut self, retry_with_error: bool) -> Result<Zeroizing<String>> {
        self.retry_flags.push(retry_with_error);
        self.answers
            .pop()
            .map(|pw| Zeroizing::new(pw.to_string()))
            .ok_or(PinVaultError::UserCancelled)
    }
}

#[derive(Default)]
struct RecordingProgress {
    seen: RefCell<Vec<u8>>,
}

impl ProgressObserver for RecordingProgress {
    fn progress(&self, percent: u8, _message: &str) {
        self.seen.borrow_mut().push(percent);
    }
}

fn path_in(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

// ---------------------------------------------------------------------------
// Single-item scenario
// ---------------------------------------------------------------------------

#[test]
fn single_export_delete_import_restores_item() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    let g = grid(1);
    store.save_item("Card A", &g).unwrap();

    let backup = path_in(&dir, "card.pin");
    let protocol = BackupProtocol::new(&store);
    protocol
        .export_single("Card A", PASSWORD, &backup, &NoProgress)
        .unwrap();
    store.delete_item("Card A").unwrap();
    assert!(store.list_items().unwrap().is_empty());

    let summary = protocol
        .import_backup(&backup, &mut ScriptedPrompt::new(&[PASSWORD]), &NoProgress)
        .unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.total, 1);
    assert_eq!(store.load_item("Card A").unwrap(), g);
    assert!(store.list_items().unwrap().contains("Card A"));
}

#[test]
fn wrong_password_reprompts_with_error_flag_and_leaves_vault_unchanged() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    store.save_item("Card A", &grid(1)).unwrap();

    let backup = path_in(&dir, "card.pin");
    let protocol = BackupProtocol::new(&store);
    protocol
        .export_single("Card A", PASSWORD, &backup, &NoProgress)
        .unwrap();
    store.delete_item("Card A").unwrap();

    assert_eq!(
        protocol.try_import(&backup, WRONG_PASSWORD, &NoProgress).unwrap(),
        RestoreAttempt::WrongPassword
    );
    assert!(store.list_items().unwrap().is_empty());
    assert!(store.item_file_names().unwrap().is_empty());

    let mut prompt = ScriptedPrompt::new(&[WRONG_PASSWORD, PASSWORD]);
    let summary = protocol
        .import_backup(&backup, &mut prompt, &NoProgress)
        .unwrap();
    assert_eq!(prompt.retry_flags, vec![false, true]);
    assert_eq!(summary.imported, 1);
}

#[test]
fn attempts_run_out_with_decryption_failure() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    store.save_item("Card A", &grid(1)).unwrap();
    let backup = path_in(&dir, "card.pin");
    BackupProtocol::new(&store)
        .export_single("Card A", PASSWORD, &backup, &NoProgress)
        .unwrap();

    let protocol = BackupProtocol::new(&store).with_max_password_attempts(2);
    let mut prompt = ScriptedPrompt::new(&[WRONG_PASSWORD, WRONG_PASSWORD, PASSWORD]);
    assert!(matches!(
        protocol.import_backup(&backup, &mut prompt, &NoProgress),
        Err(PinVaultError::DecryptionFailed)
    ));
    assert_eq!(prompt.retry_flags.len(), 2);
}

#[test]
fn short_password_on_import_is_retried() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    store.save_item("Card A", &grid(1)).unwrap();
    let backup = path_in(&dir, "card.pin");
    let protocol = BackupProtocol::new(&store);
    protocol
        .export_single("Card A", PASSWORD, &backup, &NoProgress)
        .unwrap();
    store.delete_item("Card A").unwrap();

    let mut prompt = ScriptedPrompt::new(&["short", PASSWORD]);
    let summary = protocol.import_backup(&backup, &mut prompt, &NoProgress).unwrap();
    assert_eq!(prompt.retry_flags, vec![false, true]);
    assert_eq!(summary.imported, 1);
}

#[test]
fn importing_existing_item_is_not_imported() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    let original = grid(1);
    store.save_item("Card A", &original).unwrap();

    let backup = path_in(&dir, "card.pin");
    let protocol = BackupProtocol::new(&store);
    protocol
        .export_single("Card A", PASSWORD, &backup, &NoProgress)
        .unwrap();

    let summary = protocol
        .import_backup(&backup, &mut ScriptedPrompt::new(&[PASSWORD]), &NoProgress)
        .unwrap();
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.to_string(), "0 of 1 imported");
    assert_eq!(store.load_item("Card A").unwrap(), original);
}

// ---------------------------------------------------------------------------
// Full-vault scenario
// ---------------------------------------------------------------------------

#[test]
fn full_export_delete_all_reimport_reports_three_of_three() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    let items = [("Card A", grid(1)), ("Bank", grid(2)), ("Gym locker", grid(3))];
    for (name, table) in &items {
        store.save_item(name, table).unwrap();
    }

    let backup = path_in(&dir, "all.pinc");
    let protocol = BackupProtocol::new(&store);
    assert_eq!(protocol.export_all(PASSWORD, &backup, &NoProgress).unwrap(), 3);

    for (name, _) in &items {
        store.delete_item(name).unwrap();
    }
    assert!(store.list_items().unwrap().is_empty());

    let summary = protocol
        .import_backup(&backup, &mut ScriptedPrompt::new(&[PASSWORD]), &NoProgress)
        .unwrap();
    assert_eq!(summary.to_string(), "3 of 3 imported");

    let names = store.list_items().unwrap();
    assert_eq!(names.len(), 3);
    for (name, table) in &items {
        assert!(names.contains(*name));
        assert_eq!(&store.load_item(name).unwrap(), table);
    }
}

#[test]
fn multi_import_count_is_total_minus_existing() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    let names = ["a1", "a2", "a3", "a4", "a5"];
    for (i, name) in names.iter().enumerate() {
        store.save_item(name, &grid(i)).unwrap();
    }

    let backup = path_in(&dir, "all.pinc");
    let protocol = BackupProtocol::new(&store);
    protocol.export_all(PASSWORD, &backup, &NoProgress).unwrap();

    // Delete three of five, so two (k) already exist.
    for name in &names[..3] {
        store.delete_item(name).unwrap();
    }

    let summary = match protocol.try_import(&backup, PASSWORD, &NoProgress).unwrap() {
        RestoreAttempt::Restored(summary) => summary,
        RestoreAttempt::WrongPassword => panic!("password should be accepted"),
    };
    assert_eq!(summary.total, 5);
    assert_eq!(summary.imported, 5 - 2);
    assert_eq!(summary.skipped(), 2);
    assert_eq!(store.list_items().unwrap().len(), 5);
}

#[test]
fn restored_vault_on_another_device_matches() {
    let dir = TempDir::new().unwrap();
    let source = open_vault(&dir);
    source.save_item("Card A", &grid(7)).unwrap();
    source.save_item("Card B", &grid(8)).unwrap();
    let backup = path_in(&dir, "all.pinc");
    BackupProtocol::new(&source)
        .export_all(PASSWORD, &backup, &NoProgress)
        .unwrap();

    let other_dir = TempDir::new().unwrap();
    let target = open_vault(&other_dir);
    let summary: ImportSummary = BackupProtocol::new(&target)
        .import_backup(&backup, &mut ScriptedPrompt::new(&[PASSWORD]), &NoProgress)
        .unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(target.load_item("Card B").unwrap(), grid(8));
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn unknown_suffix_fails_before_prompting() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    let file = path_in(&dir, "backup.zip");
    fs::write(&file, b"whatever").unwrap();

    let mut prompt = ScriptedPrompt::new(&[PASSWORD]);
    assert!(matches!(
        BackupProtocol::new(&store).import_backup(&file, &mut prompt, &NoProgress),
        Err(PinVaultError::UnknownFileFormat(_))
    ));
    assert!(prompt.retry_flags.is_empty(), "no password may be requested");
}

#[test]
fn unsupported_version_is_not_a_password_error() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);

    // A future single backup: version byte 1.
    let mut plaintext = vec![1u8];
    plaintext.extend_from_slice(&PinTable::new().to_bytes().unwrap());
    plaintext.extend_from_slice(b"Card A");
    plaintext.extend_from_slice(INTEGRITY_MARKER);
    let encrypted = store
        .cipher()
        .encrypt(&plaintext, CipherContext::Password(PASSWORD))
        .unwrap();
    let backup = path_in(&dir, "future.pin");
    fs::write(&backup, encrypted).unwrap();

    let mut prompt = ScriptedPrompt::new(&[PASSWORD, PASSWORD]);
    assert!(matches!(
        BackupProtocol::new(&store).import_backup(&backup, &mut prompt, &NoProgress),
        Err(PinVaultError::UnsupportedVersion { version: 1, .. })
    ));
    assert_eq!(prompt.retry_flags, vec![false]);
    assert!(store.list_items().unwrap().is_empty());
}

#[test]
fn missing_integrity_marker_is_treated_as_wrong_password() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);

    let encrypted = store
        .cipher()
        .encrypt(b"no marker here", CipherContext::Password(PASSWORD))
        .unwrap();
    let backup = path_in(&dir, "bad.pin");
    fs::write(&backup, encrypted).unwrap();

    assert_eq!(
        BackupProtocol::new(&store)
            .try_import(&backup, PASSWORD, &NoProgress)
            .unwrap(),
        RestoreAttempt::WrongPassword
    );
}

#[test]
fn crafted_file_name_in_multi_backup_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);

    // [ver][count=1][len][entry with a path-like file name][empty index]
    let mut entry = vec![0u8];
    entry.extend_from_slice(&PinTable::new().to_bytes().unwrap());
    entry.extend_from_slice(b"../escape");
    let mut plaintext = vec![0u8, 1];
    plaintext.extend_from_slice(&(entry.len() as u16).to_be_bytes());
    plaintext.extend_from_slice(&entry);
    plaintext.extend_from_slice(&[0, 0, 0]);
    plaintext.extend_from_slice(INTEGRITY_MARKER);
    let encrypted = store
        .cipher()
        .encrypt(&plaintext, CipherContext::Password(PASSWORD))
        .unwrap();
    let backup = path_in(&dir, "evil.pinc");
    fs::write(&backup, encrypted).unwrap();

    assert!(matches!(
        BackupProtocol::new(&store).try_import(&backup, PASSWORD, &NoProgress),
        Err(PinVaultError::Decode(_))
    ));
    assert!(!dir.path().join("escape").exists());
}

/// Encrypt a hand-built full backup the way `export_all` would.
fn seal_multi(store: &VaultStore, dir: &TempDir, multi: &MultiBackupStructure) -> PathBuf {
    let mut plaintext = multi.to_bytes().unwrap();
    plaintext.extend_from_slice(INTEGRITY_MARKER);
    let encrypted = store
        .cipher()
        .encrypt(&plaintext, CipherContext::Password(PASSWORD))
        .unwrap();
    let backup = path_in(dir, "foreign.pinc");
    fs::write(&backup, encrypted).unwrap();
    backup
}

#[test]
fn multi_backup_with_invalid_names_imports_nothing() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);

    let long_name = "x".repeat(200);
    let multi = MultiBackupStructure {
        pins: vec![
            MultiBackupPinTable {
                pin_table: grid(1),
                file_name: item_file_name("Card A"),
            },
            MultiBackupPinTable {
                pin_table: grid(2),
                file_name: item_file_name(&long_name),
            },
        ],
        names: ["Card A".to_string(), String::new(), long_name].into(),
    };
    let backup = seal_multi(&store, &dir, &multi);

    assert!(matches!(
        BackupProtocol::new(&store).try_import(&backup, PASSWORD, &NoProgress),
        Err(PinVaultError::InvalidName(_))
    ));
    assert!(store.list_items().unwrap().is_empty());
    assert!(store.item_file_names().unwrap().is_empty());
}

#[test]
fn multi_import_indexes_only_names_with_items() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);

    let multi = MultiBackupStructure {
        pins: vec![MultiBackupPinTable {
            pin_table: grid(5),
            file_name: item_file_name("Card A"),
        }],
        names: ["Card A".to_string(), "Orphan".to_string()].into(),
    };
    let backup = seal_multi(&store, &dir, &multi);

    let attempt = BackupProtocol::new(&store)
        .try_import(&backup, PASSWORD, &NoProgress)
        .unwrap();
    match attempt {
        RestoreAttempt::Restored(summary) => {
            assert_eq!((summary.imported, summary.total), (1, 1));
        }
        RestoreAttempt::WrongPassword => panic!("password should open the backup"),
    }

    let names: Vec<String> = store.list_items().unwrap().into_iter().collect();
    assert_eq!(names, vec!["Card A".to_string()]);
    assert_eq!(store.load_item("Card A").unwrap(), grid(5));
}

#[test]
fn export_of_empty_vault_fails() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    let backup = path_in(&dir, "all.pinc");
    assert!(matches!(
        BackupProtocol::new(&store).export_all(PASSWORD, &backup, &NoProgress),
        Err(PinVaultError::VaultEmpty)
    ));
    assert!(!backup.exists());
}

#[test]
fn export_rejects_bad_password_and_destination() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    store.save_item("Card A", &grid(1)).unwrap();
    let protocol = BackupProtocol::new(&store);

    assert!(matches!(
        protocol.export_single("Card A", "short", &path_in(&dir, "a.pin"), &NoProgress),
        Err(PinVaultError::InvalidPassword(_))
    ));
    assert!(matches!(
        protocol.export_single("Card A", PASSWORD, &path_in(&dir, "a.pinc"), &NoProgress),
        Err(PinVaultError::InvalidDestination(_))
    ));
    assert!(matches!(
        protocol.export_all(PASSWORD, &path_in(&dir, "a.pin"), &NoProgress),
        Err(PinVaultError::InvalidDestination(_))
    ));
    assert!(matches!(
        protocol.export_single("ghost", PASSWORD, &path_in(&dir, "g.pin"), &NoProgress),
        Err(PinVaultError::ItemNotFound(_))
    ));
}

#[test]
fn backup_file_is_iv_plus_whole_blocks() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    store.save_item("Card A", &grid(1)).unwrap();
    let backup = path_in(&dir, "a.pin");
    BackupProtocol::new(&store)
        .export_single("Card A", PASSWORD, &backup, &NoProgress)
        .unwrap();

    let raw = fs::read(&backup).unwrap();
    // 1 + 99 + "Card A" + marker = 113 bytes -> 8 blocks after padding.
    assert_eq!(raw.len(), 16 + 128);

    let plaintext = store
        .cipher()
        .decrypt(&raw, CipherContext::Password(PASSWORD))
        .unwrap();
    assert!(plaintext.ends_with(INTEGRITY_MARKER));
    assert_eq!(plaintext[0], 0);
}

#[test]
fn progress_reports_fixed_milestones() {
    let dir = TempDir::new().unwrap();
    let store = open_vault(&dir);
    store.save_item("Card A", &grid(1)).unwrap();
    let backup = path_in(&dir, "a.pin");
    let protocol = BackupProtocol::new(&store);

    let export_progress = RecordingProgress::default();
    protocol
        .export_single("Card A", PASSWORD, &backup, &export_progress)
        .unwrap();
    assert_eq!(*export_progress.seen.borrow(), vec![0, 25, 50, 75, 100]);

    let import_progress = RecordingProgress::default();
    protocol
        .try_import(&backup, PASSWORD, &import_progress)
        .unwrap();
    assert_eq!(*import_progress.seen.borrow(), vec![0, 25, 50, 75, 100]);
}
