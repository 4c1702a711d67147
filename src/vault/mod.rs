//! Vault module: encrypted PIN storage.
//!
//! This module provides:
//! - The `PinTable` data type and its binary format (`pin_table`)
//! - The encrypted set of display names (`index`)
//! - Directory layout and atomic writes (`file`)
//! - High-level `VaultStore` for saving, listing and deleting items (`store`)

pub mod file;
pub mod index;
pub mod pin_table;
pub mod store;

// Re-export the most commonly used items.
pub use index::VaultIndex;
pub use pin_table::{PinTable, PIN_TABLE_SIZE};
pub use store::{DeleteOutcome, SaveOutcome, VaultStore};
