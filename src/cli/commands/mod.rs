pub mod account;
pub mod analytics;
pub mod budget;
pub mod category;
pub mod data;
pub mod overview;
pub mod settings;
pub mod system;
pub mod transaction;

use crate::cli::core::CommandError;
use crate::cli::registry::CommandEntry;

pub(crate) fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(overview::definitions());
    commands.extend(account::definitions());
    commands.extend(category::definitions());
    commands.extend(transaction::definitions());
    commands.extend(budget::definitions());
    commands.extend(analytics::definitions());
    commands.extend(data::definitions());
    commands.extend(settings::definitions());
    commands
}

/// Splits `args` into a lower-cased subcommand and its arguments.
pub(crate) fn subcommand<'a>(
    args: &'a [&'a str],
    usage: &str,
) -> Result<(String, &'a [&'a str]), CommandError> {
    match args.split_first() {
        Some((first, rest)) => Ok((first.to_lowercase(), rest)),
        None => Err(CommandError::usage(usage)),
    }
}

pub(crate) fn unknown_subcommand(command: &str, other: &str) -> CommandError {
    CommandError::InvalidArguments(format!("unknown {command} subcommand `{other}`"))
}
