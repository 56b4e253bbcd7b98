use super::{subcommand, unknown_subcommand};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::currency;

const USAGE: &str = "settings <show|set> [key value]";

const SUBCOMMANDS: &[&str] = &["show", "set"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "settings",
        "Show or change preferences",
        "settings show | set <currency|date_format|first_day_of_week|budget_alerts|budget_exceeded> <value>",
        cmd_settings,
    )
    .with_subcommands(SUBCOMMANDS)]
}

fn cmd_settings(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, USAGE)?;
    match action.as_str() {
        "show" => show(context),
        "set" => match rest {
            [key, value] => set(context, &key.to_ascii_lowercase(), value),
            _ => Err(CommandError::usage("settings set <key> <value>")),
        },
        other => Err(unknown_subcommand("settings", other)),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn show(context: &mut ShellContext) -> CommandResult {
    let settings = &context.settings;
    output::section("Settings");
    output::info(format!(
        "  currency          : {} ({})",
        settings.currency,
        currency::symbol_for(&settings.currency)
    ));
    output::info(format!(
        "  date_format       : {} (today is {})",
        settings.date_format.key(),
        context.date(context.today())
    ));
    output::info(format!(
        "  first_day_of_week : {}",
        settings.first_day_of_week.as_str()
    ));
    output::info(format!(
        "  budget_alerts     : {}",
        on_off(settings.notifications.budget_alerts)
    ));
    output::info(format!(
        "  budget_exceeded   : {}",
        on_off(settings.notifications.budget_exceeded)
    ));
    output::hint(format!("Stored in {}", context.settings_manager.path().display()));
    Ok(())
}

fn set(context: &mut ShellContext, key: &str, value: &str) -> CommandResult {
    let mut updated = context.settings.clone();
    updated.set_value(key, value)?;
    context.settings_manager.save(&updated)?;
    context.settings = updated;
    output::success(format!("Updated {key}."));
    Ok(())
}
