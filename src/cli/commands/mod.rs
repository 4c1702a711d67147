//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod delete;
pub mod export;
pub mod import_cmd;
pub mod list;
pub mod show;
