//! `pinvault add`: store a new PIN table.

use dialoguer::Input;

use crate::cli::output;
use crate::cli::{open_store, parse_digit_grid, parse_pattern_grid, Cli};
use crate::codec::grid::ROW_COUNT;
use crate::errors::{PinVaultError, Result};
use crate::vault::{PinTable, SaveOutcome, VaultStore};

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    name: &str,
    digits: Option<&str>,
    pattern: Option<&str>,
    fill: bool,
) -> Result<()> {
    // Fail on a bad name before asking for 49 digits.
    VaultStore::validate_name(name)?;

    let digits = match digits {
        Some(d) => parse_digit_grid(d)?,
        None => parse_digit_grid(&prompt_rows()?)?,
    };
    let pattern = match pattern {
        Some(p) => parse_pattern_grid(p)?,
        None => *PinTable::new().pattern_grid(),
    };

    let mut table = PinTable::from_grids(digits, pattern)?;
    if fill {
        table.fill(&[]);
    }
    if !table.is_filled() {
        output::tip("Pass --fill to complete empty cells with random digits.");
        return Err(PinVaultError::IncompletePinTable);
    }

    let (_, store) = open_store(cli)?;
    match store.save_item(name, &table)? {
        SaveOutcome::Created => {
            output::success(&format!("Saved PIN '{name}'"));
            Ok(())
        }
        SaveOutcome::NameCollision => Err(PinVaultError::NameCollision(name.to_string())),
    }
}

/// Ask for the grid one row at a time.
fn prompt_rows() -> Result<String> {
    output::info("Enter 7 digits per row (`_` for an empty cell).");
    let mut rows = String::new();
    for row in 1..=ROW_COUNT {
        let line: String = Input::new()
            .with_prompt(format!("Row {row}"))
            .interact_text()
            .map_err(|e| PinVaultError::CommandFailed(format!("input prompt: {e}")))?;
        rows.push_str(&line);
    }
    Ok(rows)
}
