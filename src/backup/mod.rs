//! Password-protected backup files.
//!
//! - Container structures, suffix detection and file naming (`format`)
//! - Export / restore with integrity checking and retries (`protocol`)

pub mod format;
pub mod protocol;

pub use format::{
    multi_backup_file_name, single_backup_file_name, BackupKind, BackupStructure,
    MultiBackupPinTable, MultiBackupStructure, SingleBackupStructure, INTEGRITY_MARKER,
};
pub use protocol::{
    validate_backup_password, BackupProtocol, ImportSummary, NoProgress, PasswordPrompt,
    ProgressObserver, RestoreAttempt,
};
