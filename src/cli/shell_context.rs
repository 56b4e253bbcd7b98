use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;

use crate::{
    config::{Settings, SettingsManager},
    core::clock::Clock,
    storage::Database,
};

use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// State shared by every command handler for the lifetime of the shell.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub db: Database,
    pub clock: Box<dyn Clock>,
    pub settings: Settings,
    pub settings_manager: SettingsManager,
    pub home: PathBuf,
    pub last_command: Option<String>,
    pub running: bool,
}
