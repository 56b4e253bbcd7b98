//! Dispatch, error types and helpers shared by the command handlers.

use std::{io, path::Path};

use chrono::{NaiveDate, Weekday};
use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::{
    config::SettingsManager,
    core::{
        clock::{Clock, SystemClock},
        notify::{AlertNotifier, BudgetNotice, FilteredNotifier},
        services::{AccountService, BudgetService, CategoryService},
    },
    currency,
    domain::{AlertKind, BudgetAlert},
    errors::TrackerError,
    storage::Database,
    utils::paths,
};

use super::commands;
use super::output;
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] TrackerError),
    #[error("Input error: {0}")]
    Input(String),
    #[error("{0}")]
    Command(String),
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("exit requested")]
    ExitRequested,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] TrackerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}

impl CommandError {
    pub(crate) fn usage(usage: &str) -> Self {
        CommandError::InvalidArguments(format!("usage: {usage}"))
    }
}

/// Prints budget notices on the terminal.
pub struct ConsoleNotifier;

impl AlertNotifier for ConsoleNotifier {
    fn notify(&self, notice: &BudgetNotice) {
        let line = format!("{}: {}", notice.title(), notice.body());
        match notice.kind {
            AlertKind::Warning => output::warning(line),
            AlertKind::Exceeded => output::error(line),
        }
    }
}

impl ShellContext {
    /// Opens the database and settings under the application home.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let home = paths::app_home();
        paths::ensure_dir(&home)?;
        let db = Database::open(&paths::database_file_in(&home))?;
        let settings_manager = SettingsManager::new(&home)?;
        let settings = settings_manager.load()?;
        let clock: Box<dyn Clock> = Box::new(SystemClock);
        if db.seed_defaults(clock.now())? {
            debug!("seeded a fresh database");
        }

        let mut registry = CommandRegistry::new();
        for entry in commands::all_definitions() {
            registry.register(entry);
        }

        Ok(Self {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            db,
            clock,
            settings,
            settings_manager,
            home,
            last_command: None,
            running: true,
        })
    }

    pub fn is_interactive(&self) -> bool {
        self.mode == CliMode::Interactive
    }

    pub fn prompt(&self) -> String {
        "expense> ".to_string()
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn week_start(&self) -> Weekday {
        self.settings.first_day_of_week.weekday()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn exports_dir(&self) -> std::path::PathBuf {
        paths::exports_dir_in(&self.home)
    }

    pub fn money(&self, amount: f64) -> String {
        currency::format_amount(amount, &self.settings.currency)
    }

    pub fn date(&self, date: NaiveDate) -> String {
        currency::format_date(date, self.settings.date_format)
    }

    pub fn save_settings(&self) -> Result<(), CommandError> {
        self.settings_manager.save(&self.settings)?;
        Ok(())
    }

    /// Runs the budget alert check and prints any notices that settings allow.
    pub fn refresh_alerts(&self) -> Result<Vec<BudgetAlert>, CommandError> {
        let console = ConsoleNotifier;
        let notifier = FilteredNotifier::new(&console, self.settings.notifications);
        let alerts =
            BudgetService::check_alerts(&self.db, self.clock.as_ref(), self.week_start(), &notifier)?;
        Ok(alerts)
    }

    /// Alert check that only logs failures, used after mutations.
    pub(crate) fn refresh_alerts_quietly(&self) {
        if let Err(err) = self.refresh_alerts() {
            warn!(error = %err, "budget alert check failed");
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        if let Some(name) = self.registry.closest(input) {
            output::hint(format!("Did you mean `{name}`?"));
        }
    }

    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if !self.is_interactive() {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if !self.is_interactive() {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(|err| CliError::Input(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            other => {
                output::error(other.to_string());
                Ok(())
            }
        }
    }

    /// Resolves an account given by id or case-insensitive name.
    pub(crate) fn resolve_account(&self, token: &str) -> Result<i64, CommandError> {
        if let Ok(id) = token.trim().parse::<i64>() {
            return Ok(AccountService::get(&self.db, id)?.id);
        }
        AccountService::list(&self.db)?
            .into_iter()
            .find(|account| account.name.eq_ignore_ascii_case(token.trim()))
            .map(|account| account.id)
            .ok_or_else(|| CommandError::InvalidArguments(format!("unknown account `{token}`")))
    }

    /// Resolves a category given by id or case-insensitive name.
    pub(crate) fn resolve_category(&self, token: &str) -> Result<i64, CommandError> {
        if let Ok(id) = token.trim().parse::<i64>() {
            return Ok(CategoryService::get(&self.db, id)?.id);
        }
        CategoryService::find_by_name(&self.db, token)?
            .map(|category| category.id)
            .ok_or_else(|| CommandError::InvalidArguments(format!("unknown category `{token}`")))
    }
}

pub(crate) fn parse_id(input: Option<&&str>, usage: &str) -> Result<i64, CommandError> {
    let raw = input.ok_or_else(|| CommandError::usage(usage))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid id `{raw}`")))
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{input}` (use YYYY-MM-DD)"))
    })
}

pub(crate) fn path_arg<'a>(args: &'a [&str], index: usize) -> Option<&'a Path> {
    args.get(index).map(|raw| Path::new(*raw))
}
