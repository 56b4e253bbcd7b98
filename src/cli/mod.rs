//! Interactive shell and script runner over the tracker services.

pub mod commands;
pub mod core;
pub mod forms;
pub mod help;
pub mod output;
pub mod registry;
mod shell;
pub mod shell_context;
pub mod table;

pub use shell::{run_cli, SCRIPT_ENV};
