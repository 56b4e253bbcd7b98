use std::path::PathBuf;

use super::{subcommand, unknown_subcommand};
use crate::cli::core::{path_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::core::services::ExportService;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "export",
            "Export a JSON backup or a transactions CSV",
            "export <json|csv> [directory]",
            cmd_export,
        )
        .with_subcommands(&["json", "csv"]),
        CommandEntry::new(
            "import",
            "Replace all data with a JSON backup",
            "import <path>",
            cmd_import,
        ),
        CommandEntry::new(
            "clear-data",
            "Delete every account, category, transaction and budget",
            "clear-data",
            cmd_clear_data,
        ),
        CommandEntry::new(
            "seed",
            "Insert the default categories and accounts into an empty database",
            "seed",
            cmd_seed,
        ),
    ]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (kind, rest) = subcommand(args, "export <json|csv> [directory]")?;
    let dir = path_arg(rest, 0)
        .map(PathBuf::from)
        .unwrap_or_else(|| context.exports_dir());
    let path = match kind.as_str() {
        "json" => ExportService::export_json(&context.db, context.clock.as_ref(), &dir)?,
        "csv" => ExportService::export_csv(&context.db, context.clock.as_ref(), &dir)?,
        other => return Err(unknown_subcommand("export", other)),
    };
    output::success(format!("Exported {} to {}", kind, path.display()));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = path_arg(args, 0).ok_or_else(|| CommandError::usage("import <path>"))?;
    let document = ExportService::read_backup(path)?;
    let prompt = format!(
        "Replace all data with {} transaction(s) from this backup?",
        document.transactions.len()
    );
    if !context.confirm(&prompt)? {
        output::info("Import cancelled.");
        return Ok(());
    }
    let summary = ExportService::restore(&context.db, &document)?;
    output::success(format!(
        "Imported {} account(s), {} category(ies), {} transaction(s) and {} budget(s).",
        summary.accounts, summary.categories, summary.transactions, summary.budgets
    ));
    context.refresh_alerts_quietly();
    Ok(())
}

fn cmd_clear_data(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm("Delete ALL data? This cannot be undone.")? {
        output::info("Nothing deleted.");
        return Ok(());
    }
    ExportService::clear_all(&context.db)?;
    output::success("All data deleted.");
    output::hint("Run `seed` to restore the default categories and accounts.");
    Ok(())
}

fn cmd_seed(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.db.seed_defaults(context.clock.now())? {
        output::success("Default categories and accounts created.");
    } else {
        output::info("Categories already exist; nothing seeded.");
    }
    Ok(())
}
