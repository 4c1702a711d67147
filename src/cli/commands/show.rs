//! `pinvault show`: decrypt and print one PIN table.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let (_, store) = open_store(cli)?;

    let table = store.load_item(name)?;
    output::info(name);
    output::print_pin_table(&table);

    Ok(())
}
