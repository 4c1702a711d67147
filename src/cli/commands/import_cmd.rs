//! `pinvault import`: restore a `.pin` or `.pinc` backup file.

use std::path::Path;

use crate::backup::{BackupKind, BackupProtocol};
use crate::cli::output;
use crate::cli::{open_store, Cli, CliPasswordPrompt, ConsoleProgress};
use crate::errors::{PinVaultError, Result};

/// Execute the `import` command.
pub fn execute(cli: &Cli, file: &str) -> Result<()> {
    let source = Path::new(file);

    // Reject unknown files before opening the vault or asking for anything.
    BackupKind::from_path(source)?;
    if !source.exists() {
        return Err(PinVaultError::CommandFailed(format!("file not found: {file}")));
    }

    let (settings, store) = open_store(cli)?;
    let protocol =
        BackupProtocol::new(&store).with_max_password_attempts(settings.max_password_attempts);

    let summary = protocol.import_backup(source, &mut CliPasswordPrompt, &ConsoleProgress)?;

    if summary.imported == summary.total {
        output::success(&format!("Import finished: {summary}"));
    } else {
        output::warning(&format!(
            "Import finished: {summary} ({} already in the vault)",
            summary.skipped()
        ));
    }

    Ok(())
}
