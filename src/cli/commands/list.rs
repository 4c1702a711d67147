//! `pinvault list`: display all stored PIN names.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_, store) = open_store(cli)?;

    let names = store.list_items()?;
    if !names.is_empty() {
        output::info(&format!("{} PIN(s)", names.len()));
    }
    output::print_names(&names);

    Ok(())
}
