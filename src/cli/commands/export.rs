//! `pinvault export`: write a password-protected backup file.
//!
//! With a name, exports that single PIN to a `.pin` file; without one,
//! exports the whole vault to a `.pinc` file.

use std::path::PathBuf;

use chrono::Local;

use crate::backup::{multi_backup_file_name, single_backup_file_name, BackupProtocol};
use crate::cli::output;
use crate::cli::{open_store, prompt_new_backup_password, Cli, ConsoleProgress};
use crate::crypto::identity_hash;
use crate::errors::{PinVaultError, Result};

/// Execute the `export` command.
pub fn execute(cli: &Cli, name: Option<&str>, output_path: Option<&str>) -> Result<()> {
    let (_, store) = open_store(cli)?;

    // Check there is something to export before asking for a password.
    let destination = match name {
        Some(name) => {
            if !store.contains_item(name) {
                return Err(PinVaultError::ItemNotFound(name.to_string()));
            }
            destination_or(output_path, || {
                single_backup_file_name(&identity_hash(name), Local::now())
            })
        }
        None => {
            let count = store.item_file_names()?.len();
            if count == 0 {
                return Err(PinVaultError::VaultEmpty);
            }
            destination_or(output_path, || multi_backup_file_name(count, Local::now()))
        }
    };

    let password = prompt_new_backup_password()?;
    let protocol = BackupProtocol::new(&store);

    match name {
        Some(name) => {
            protocol.export_single(name, &password, &destination, &ConsoleProgress)?;
            output::success(&format!(
                "Exported PIN '{name}' to {}",
                destination.display()
            ));
        }
        None => {
            let count = protocol.export_all(&password, &destination, &ConsoleProgress)?;
            output::success(&format!(
                "Exported {count} PIN(s) to {}",
                destination.display()
            ));
        }
    }

    output::tip("Keep the backup password safe: the file cannot be restored without it.");
    Ok(())
}

fn destination_or(output_path: Option<&str>, suggested: impl FnOnce() -> String) -> PathBuf {
    match output_path {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(suggested()),
    }
}
