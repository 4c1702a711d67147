//! Configuration loaded from `.pinvault.toml`.

pub mod settings;

pub use settings::{KeyStoreKind, Settings};
