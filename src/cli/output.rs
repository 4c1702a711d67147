//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use std::collections::BTreeSet;

use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

use crate::codec::grid::{COLUMN_COUNT, ROW_COUNT};
use crate::vault::pin_table::{PinTable, EMPTY_DIGIT, PALETTE_SIZE};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a dim progress line on stderr: "[ 50%] {msg}"
pub fn progress(percent: u8, msg: &str) {
    eprintln!("{}", style(format!("[{percent:>3}%] {msg}")).dim());
}

/// Print the list of stored PIN names.
pub fn print_names(names: &BTreeSet<String>) {
    if names.is_empty() {
        info("No PINs in this vault yet.");
        tip("Run `pinvault add <NAME>` to store your first PIN.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Name"]);
    for (i, name) in names.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), name.clone()]);
    }

    println!("{table}");
}

/// Print a PIN table as a 7×7 grid, each cell tinted by its pattern colour.
pub fn print_pin_table(pin_table: &PinTable) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    for (digits, pattern) in pin_table
        .digits()
        .iter()
        .zip(pin_table.pattern_grid().iter())
        .take(ROW_COUNT)
    {
        let row = digits
            .iter()
            .zip(pattern.iter())
            .take(COLUMN_COUNT)
            .map(|(&digit, &colour)| {
                let text = if digit == EMPTY_DIGIT {
                    " ".to_string()
                } else {
                    digit.to_string()
                };
                Cell::new(text)
                    .set_alignment(CellAlignment::Center)
                    .fg(palette_colour(colour as u8))
            });
        table.add_row(row);
    }

    println!("{table}");
}

/// Terminal colour for a pattern index; the alternate palette (5-9)
/// reuses the standard hues in their dark variants.
fn palette_colour(index: u8) -> Color {
    let standard = [Color::Red, Color::Green, Color::Blue, Color::Yellow, Color::Magenta];
    let alternate = [
        Color::DarkRed,
        Color::DarkGreen,
        Color::DarkBlue,
        Color::DarkYellow,
        Color::DarkMagenta,
    ];
    let slot = usize::from(index % PALETTE_SIZE);
    if index < PALETTE_SIZE {
        standard[slot]
    } else {
        alternate[slot]
    }
}
