//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::backup::protocol::{
    validate_backup_password, PasswordPrompt, ProgressObserver, MAX_PASSWORD_LEN,
    MIN_PASSWORD_LEN,
};
use crate::codec::grid::{Grid, COLUMN_COUNT, ROW_COUNT};
use crate::config::Settings;
use crate::errors::{PinVaultError, Result};
use crate::vault::pin_table::EMPTY_DIGIT;
use crate::vault::VaultStore;

/// Environment variable holding the backup password for scripted use.
pub const BACKUP_PASSWORD_ENV: &str = "PINVAULT_BACKUP_PASSWORD";

/// Cells in a grid given on the command line.
const CELL_COUNT: usize = ROW_COUNT * COLUMN_COUNT;

/// PinVault CLI: encrypted PIN table vault with portable backups.
#[derive(Parser)]
#[command(
    name = "pinvault",
    about = "Encrypted PIN table vault with password-protected backups",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: vault_dir from .pinvault.toml, else .pinvault)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,

    /// Show debug logs (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a new PIN table
    Add {
        /// Display name (at most 30 characters)
        name: String,

        /// 49 digits, row by row; `_` marks an empty cell (prompted if omitted)
        #[arg(long)]
        digits: Option<String>,

        /// 49 colour indices 0-9, row by row (default: all 0)
        #[arg(long)]
        pattern: Option<String>,

        /// Fill empty cells with random digits
        #[arg(long)]
        fill: bool,
    },

    /// Show a stored PIN table
    Show {
        /// Display name
        name: String,
    },

    /// List stored PIN names
    List,

    /// Delete a PIN table
    Delete {
        /// Display name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export one PIN (.pin) or the whole vault (.pinc) to a backup file
    Export {
        /// PIN to export (omit to export every PIN)
        name: Option<String>,

        /// Destination file (default: a timestamped name in the current directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import a .pin or .pinc backup file
    Import {
        /// Path to the backup file
        file: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Install the `tracing` subscriber.
///
/// Default level is `warn`, `--verbose` raises it to `debug`, and
/// `RUST_LOG` overrides both.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

/// Load `.pinvault.toml` from the current directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the vault directory: `--vault-dir`, else the settings value.
///
/// Example: `<cwd>/.pinvault`
pub fn vault_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.vault_dir {
        Some(dir) => cwd.join(dir),
        None => settings.vault_path(&cwd),
    })
}

/// Load settings and open the vault they (and the CLI flags) point at.
pub fn open_store(cli: &Cli) -> Result<(Settings, VaultStore)> {
    let settings = load_settings()?;
    let path = vault_path(cli, &settings)?;
    let store = settings.open_store(&path)?;
    Ok((settings, store))
}

/// Read the backup password from `PINVAULT_BACKUP_PASSWORD`, if set.
fn password_from_env() -> Option<Zeroizing<String>> {
    match std::env::var(BACKUP_PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}

/// Prompt for a new backup password with confirmation (used by `export`).
///
/// Also respects `PINVAULT_BACKUP_PASSWORD` for scripted/CI usage.
/// Enforces the backup password length rules.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_new_backup_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        validate_backup_password(&pw)?;
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose backup password")
            .with_confirmation(
                "Confirm backup password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| PinVaultError::CommandFailed(format!("password prompt: {e}")))?;
        let password = Zeroizing::new(password);

        if validate_backup_password(&password).is_err() {
            output::warning(&format!(
                "Password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

/// Password source for `import`: the environment variable (tried once)
/// or an interactive prompt that reports the previous failure.
pub struct CliPasswordPrompt;

impl PasswordPrompt for CliPasswordPrompt {
    fn backup_password(&mut self, retry_with_error: bool) -> Result<Zeroizing<String>> {
        if let Some(pw) = password_from_env() {
            if retry_with_error {
                // The same value would fail again.
                return Err(PinVaultError::DecryptionFailed);
            }
            return Ok(pw);
        }

        if retry_with_error {
            output::error("Wrong password or corrupted file. Try again.");
        }
        let pw = dialoguer::Password::new()
            .with_prompt("Enter backup password")
            .interact()
            .map_err(|e| PinVaultError::CommandFailed(format!("password prompt: {e}")))?;
        Ok(Zeroizing::new(pw))
    }
}

/// Prints progress milestones as dim lines on stderr.
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn progress(&self, percent: u8, message: &str) {
        output::progress(percent, message);
    }
}

/// Parse a 49-cell digit grid.
///
/// Whitespace is ignored, `_` is an empty cell, everything else must be
/// a digit.
pub fn parse_digit_grid(text: &str) -> Result<Grid> {
    parse_grid(text, "digits", |c| match c {
        '_' => Some(EMPTY_DIGIT),
        _ => c.to_digit(10).map(|d| d as i8),
    })
}

/// Parse a 49-cell colour pattern grid of indices `0-9`.
pub fn parse_pattern_grid(text: &str) -> Result<Grid> {
    parse_grid(text, "pattern", |c| c.to_digit(10).map(|d| d as i8))
}

fn parse_grid(text: &str, what: &str, cell: impl Fn(char) -> Option<i8>) -> Result<Grid> {
    let cells: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cells.len() != CELL_COUNT {
        return Err(PinVaultError::InvalidPinTable(format!(
            "{what} must have {CELL_COUNT} cells, got {}",
            cells.len()
        )));
    }

    let mut grid = [[0i8; COLUMN_COUNT]; ROW_COUNT];
    for (i, &c) in cells.iter().enumerate() {
        grid[i / COLUMN_COUNT][i % COLUMN_COUNT] = cell(c).ok_or_else(|| {
            PinVaultError::InvalidPinTable(format!("invalid {what} character '{c}'"))
        })?;
    }
    Ok(grid)
}
