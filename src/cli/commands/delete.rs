//! `pinvault delete`: remove a PIN table from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{PinVaultError, Result};
use crate::vault::DeleteOutcome;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete PIN '{name}'?"))
            .default(false)
            .interact()
            .map_err(|e| PinVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let (_, store) = open_store(cli)?;
    match store.delete_item(name)? {
        DeleteOutcome::Deleted => {
            output::success(&format!("Deleted PIN '{name}'"));
            Ok(())
        }
        DeleteOutcome::NotFound => Err(PinVaultError::ItemNotFound(name.to_string())),
    }
}
