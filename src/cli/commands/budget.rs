use colored::Colorize;

use super::{subcommand, unknown_subcommand};
use crate::cli::core::{parse_id, CommandError, CommandResult, ShellContext};
use crate::cli::forms::{FieldDescriptor, FormDescriptor, FormValues, Prefill, Validator};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{bar, Column, Table};
use crate::core::services::BudgetService;
use crate::domain::{
    BudgetFilter, BudgetPeriod, BudgetScope, BudgetStatus, BudgetUpdate, BudgetWithDetails,
    NewBudget, DEFAULT_ALERT_PERCENTAGE, MAX_ALERT_PERCENTAGE, MIN_ALERT_PERCENTAGE,
};

const USAGE: &str =
    "budget <list|show|add|edit|remove|check|alerts|read|summary|history> [args]";
const BAR_WIDTH: usize = 20;

const SUBCOMMANDS: &[&str] = &[
    "list", "show", "add", "edit", "remove", "check", "alerts", "read", "summary", "history",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "budget",
        "Manage budgets, progress and alerts",
        "budget list [active|inactive] | show <id> | add [name=.. scope=.. target=.. amount=.. \
         period=.. start=.. end=.. alert=..] | edit <id> [field=value..] | remove <id> | check | \
         alerts [unread] | read <id|all> | summary | history <id>",
        cmd_budget,
    )
    .with_subcommands(SUBCOMMANDS)]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, USAGE)?;
    match action.as_str() {
        "list" => list_budgets(context, rest.first().copied()),
        "show" => show_budget(context, parse_id(rest.first(), "budget show <id>")?),
        "add" => add_budget(context, rest),
        "edit" => {
            let id = parse_id(rest.first(), "budget edit <id> [field=value..]")?;
            edit_budget(context, id, &rest[1..])
        }
        "remove" => remove_budget(context, parse_id(rest.first(), "budget remove <id>")?),
        "check" => check_budgets(context),
        "alerts" => list_alerts(context, rest.first().copied()),
        "read" => mark_read(context, rest.first().copied()),
        "summary" => summary(context),
        "history" => history(context, parse_id(rest.first(), "budget history <id>")?),
        other => Err(unknown_subcommand("budget", other)),
    }
}

fn period_tokens() -> Vec<&'static str> {
    BudgetPeriod::ALL.iter().map(BudgetPeriod::as_str).collect()
}

fn scope_tokens() -> Vec<&'static str> {
    BudgetScope::ALL.iter().map(BudgetScope::as_str).collect()
}

fn budget_form(today: &str) -> FormDescriptor {
    FormDescriptor::new(
        "budget",
        vec![
            FieldDescriptor::text("name", "Budget name", Validator::MinLength(2)),
            FieldDescriptor::choice("scope", "Applies to", &scope_tokens()).with_default("general"),
            FieldDescriptor::text("target", "Category or account", Validator::NonEmpty)
                .with_help("name or id, unused for general budgets")
                .optional(),
            FieldDescriptor::text("amount", "Budget amount", Validator::PositiveNumber),
            FieldDescriptor::choice("period", "Period", &period_tokens()).with_default("monthly"),
            FieldDescriptor::text("start", "Start date", Validator::Date)
                .with_help("YYYY-MM-DD")
                .with_default(today),
            FieldDescriptor::text("end", "End date", Validator::Date)
                .with_help("YYYY-MM-DD")
                .optional(),
            FieldDescriptor::text(
                "alert",
                "Alert at %",
                Validator::Range(i64::from(MIN_ALERT_PERCENTAGE), i64::from(MAX_ALERT_PERCENTAGE)),
            )
            .with_default(DEFAULT_ALERT_PERCENTAGE.to_string()),
        ],
    )
}

fn edit_form(today: &str) -> FormDescriptor {
    let mut form = budget_form(today);
    form.fields
        .push(FieldDescriptor::choice("active", "Active", &["yes", "no"]).with_default("yes"));
    form
}

/// Target token for `scope`. General budgets ignore the target; category
/// and account budgets must name one.
fn scoped_target(scope: BudgetScope, target: Option<&str>) -> Result<Option<&str>, CommandError> {
    match (scope, target) {
        (BudgetScope::General, _) => Ok(None),
        (_, Some(token)) => Ok(Some(token)),
        (_, None) => Err(CommandError::InvalidArguments(format!(
            "target: a {scope} budget needs a {scope} to follow"
        ))),
    }
}

/// Category and account ids selected by the scope and target fields.
fn resolve_target(
    context: &ShellContext,
    values: &FormValues,
) -> Result<(BudgetScope, Option<i64>, Option<i64>), CommandError> {
    let scope: BudgetScope = values.require("scope")?.parse()?;
    Ok(match scoped_target(scope, values.get("target"))? {
        Some(token) if scope == BudgetScope::Category => {
            (scope, Some(context.resolve_category(token)?), None)
        }
        Some(token) => (scope, None, Some(context.resolve_account(token)?)),
        None => (scope, None, None),
    })
}

/// Rejects a scope change that would reuse the old target id for the new
/// kind of target.
fn ensure_fresh_target(
    previous: BudgetScope,
    previous_target: &str,
    values: &FormValues,
) -> Result<(), CommandError> {
    let scope: BudgetScope = values.require("scope")?.parse()?;
    if scope == previous || scope == BudgetScope::General || previous == BudgetScope::General {
        return Ok(());
    }
    if values.get("target") == Some(previous_target) {
        return Err(CommandError::InvalidArguments(format!(
            "target: name the {scope} this budget should follow after changing its scope"
        )));
    }
    Ok(())
}

fn alert_percentage(values: &FormValues) -> Result<u8, CommandError> {
    values
        .require("alert")?
        .parse::<u8>()
        .map_err(|_| CommandError::InvalidArguments("alert must be a whole percentage".into()))
}

fn status_label(status: BudgetStatus) -> String {
    match status {
        BudgetStatus::Good => status.to_string().bright_green().to_string(),
        BudgetStatus::Warning => status.to_string().bright_yellow().to_string(),
        BudgetStatus::Exceeded => status.to_string().bright_red().to_string(),
    }
}

fn list_budgets(context: &mut ShellContext, state: Option<&str>) -> CommandResult {
    let filter = match state {
        None | Some("all") => BudgetFilter::default(),
        Some("active") => BudgetFilter::active(),
        Some("inactive") => BudgetFilter {
            is_active: Some(false),
            ..BudgetFilter::default()
        },
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown budget state `{other}` (expected active, inactive or all)"
            )))
        }
    };
    let budgets =
        BudgetService::list(&context.db, context.clock.as_ref(), context.week_start(), &filter)?;
    if budgets.is_empty() {
        output::info("No budgets yet. Create one with `budget add`.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        Column::right("ID"),
        Column::left("Name").capped(20),
        Column::left("Target").capped(20),
        Column::left("Period"),
        Column::right("Spent"),
        Column::right("Budget"),
        Column::right("Used"),
        Column::left("Status"),
    ]);
    for entry in &budgets {
        let status = if entry.budget.is_active {
            entry.progress.status.to_string()
        } else {
            "inactive".to_string()
        };
        table.push(vec![
            entry.budget.id.to_string(),
            entry.budget.name.clone(),
            entry.target_label(),
            entry.budget.period.to_string(),
            context.money(entry.progress.spent),
            context.money(entry.budget.amount),
            format!("{:.1}%", entry.progress.percentage),
            status,
        ]);
    }
    output::section("Budgets");
    output::info(table.render());
    Ok(())
}

fn show_budget(context: &mut ShellContext, id: i64) -> CommandResult {
    let entry = BudgetService::get(&context.db, context.clock.as_ref(), context.week_start(), id)?;
    print_budget(context, &entry);
    Ok(())
}

fn print_budget(context: &ShellContext, entry: &BudgetWithDetails) {
    let budget = &entry.budget;
    let progress = &entry.progress;
    output::section(format!("Budget #{} {}", budget.id, budget.name));
    output::info(format!("  Applies to : {}", entry.target_label()));
    output::info(format!("  Period     : {}", budget.period));
    output::info(format!(
        "  Runs       : {} to {}",
        context.date(budget.start_date),
        budget
            .end_date
            .map(|end| context.date(end))
            .unwrap_or_else(|| "open-ended".to_string())
    ));
    match progress.window {
        Some(window) => output::info(format!(
            "  Window     : {} to {}",
            context.date(window.start),
            context.date(window.end)
        )),
        None => output::info("  Window     : not in effect today"),
    }
    output::info(format!(
        "  Spent      : {} of {} ({} remaining)",
        context.money(progress.spent),
        context.money(budget.amount),
        context.money(progress.remaining)
    ));
    output::info(format!(
        "  Progress   : [{:<width$}] {:.1}% {}",
        bar(progress.percentage, 100.0, BAR_WIDTH),
        progress.percentage,
        status_label(progress.status),
        width = BAR_WIDTH
    ));
    output::info(format!("  Alert at   : {}%", budget.alert_percentage));
    if !budget.is_active {
        output::warning("This budget is inactive.");
    }
}

fn add_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let values = budget_form(&context.today().to_string()).run(context, args, &Prefill::new())?;
    let (scope, category_id, account_id) = resolve_target(context, &values)?;
    let start = values
        .date("start")?
        .ok_or_else(|| CommandError::InvalidArguments("missing value for `start`".into()))?;
    let mut budget = NewBudget::general(
        values.require("name")?,
        values.number("amount")?,
        values.require("period")?.parse()?,
        start,
    )
    .with_alert_percentage(alert_percentage(&values)?);
    budget.scope = scope;
    budget.category_id = category_id;
    budget.account_id = account_id;
    if let Some(end) = values.date("end")? {
        budget = budget.with_end_date(end);
    }

    let budget = BudgetService::create(&context.db, context.clock.as_ref(), budget)?;
    output::success(format!("Created budget #{} `{}`.", budget.id, budget.name));
    context.refresh_alerts_quietly();
    Ok(())
}

fn edit_budget(context: &mut ShellContext, id: i64, args: &[&str]) -> CommandResult {
    let existing = BudgetService::get(&context.db, context.clock.as_ref(), context.week_start(), id)?;
    let budget = &existing.budget;
    let target = match budget.scope() {
        BudgetScope::Category => budget.category_id.map(|id| id.to_string()),
        BudgetScope::Account => budget.account_id.map(|id| id.to_string()),
        BudgetScope::General => None,
    };
    let previous_target = target.unwrap_or_default();
    let prefill = Prefill::from([
        ("name", budget.name.clone()),
        ("scope", budget.scope().to_string()),
        ("target", previous_target.clone()),
        ("amount", budget.amount.to_string()),
        ("period", budget.period.to_string()),
        ("start", budget.start_date.to_string()),
        (
            "end",
            budget.end_date.map(|end| end.to_string()).unwrap_or_default(),
        ),
        ("alert", budget.alert_percentage.to_string()),
        ("active", if budget.is_active { "yes" } else { "no" }.to_string()),
    ]);
    let values = edit_form(&context.today().to_string()).run(context, args, &prefill)?;
    ensure_fresh_target(budget.scope(), &previous_target, &values)?;
    let (_, category_id, account_id) = resolve_target(context, &values)?;

    let changes = BudgetUpdate {
        name: values.owned("name"),
        amount: Some(values.number("amount")?),
        period: Some(values.require("period")?.parse()?),
        category_id: Some(category_id),
        account_id: Some(account_id),
        start_date: values.date("start")?,
        end_date: Some(values.date("end")?),
        alert_percentage: Some(alert_percentage(&values)?),
        is_active: Some(values.get("active") == Some("yes")),
    };
    let updated = BudgetService::update(
        &context.db,
        context.clock.as_ref(),
        context.week_start(),
        id,
        changes,
    )?;
    output::success(format!("Updated budget `{}`.", updated.name));
    context.refresh_alerts_quietly();
    Ok(())
}

fn remove_budget(context: &mut ShellContext, id: i64) -> CommandResult {
    let budget = BudgetService::record(&context.db, id)?;
    if !context.confirm(&format!("Delete budget `{}` and its alerts?", budget.name))? {
        output::info("Deletion cancelled.");
        return Ok(());
    }
    if BudgetService::delete(&context.db, id)? {
        output::success(format!("Deleted budget `{}`.", budget.name));
    }
    Ok(())
}

fn check_budgets(context: &mut ShellContext) -> CommandResult {
    let created = context.refresh_alerts()?;
    if created.is_empty() {
        output::info("No new budget alerts.");
    } else {
        output::info(format!("{} new budget alert(s).", created.len()));
    }
    Ok(())
}

fn list_alerts(context: &mut ShellContext, filter: Option<&str>) -> CommandResult {
    let is_read = match filter {
        None | Some("all") => None,
        Some("unread") => Some(false),
        Some("read") => Some(true),
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown alert filter `{other}` (expected all, unread or read)"
            )))
        }
    };
    let alerts = BudgetService::alerts(&context.db, is_read)?;
    if alerts.is_empty() {
        output::info("No alerts.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        Column::right("ID"),
        Column::left("When"),
        Column::left("Type"),
        Column::left("Message").capped(60),
        Column::left(""),
    ]);
    for alert in &alerts {
        table.push(vec![
            alert.id.to_string(),
            context.date(alert.created_at.date_naive()),
            alert.kind.to_string(),
            alert.message.clone(),
            if alert.is_read { "" } else { "new" }.to_string(),
        ]);
    }
    output::section("Budget alerts");
    output::info(table.render());
    output::hint(format!(
        "{} unread. Mark them with `budget read <id|all>`.",
        BudgetService::unread_count(&context.db)?
    ));
    Ok(())
}

fn mark_read(context: &mut ShellContext, target: Option<&str>) -> CommandResult {
    match target {
        Some("all") => {
            let changed = BudgetService::mark_all_read(&context.db)?;
            output::success(format!("Marked {changed} alert(s) as read."));
        }
        Some(raw) => {
            let id = parse_id(Some(&raw), "budget read <id|all>")?;
            if BudgetService::mark_alert_read(&context.db, id)? {
                output::success(format!("Marked alert #{id} as read."));
            } else {
                output::warning(format!("Alert #{id} not found."));
            }
        }
        None => return Err(CommandError::usage("budget read <id|all>")),
    }
    Ok(())
}

fn summary(context: &mut ShellContext) -> CommandResult {
    let summary = BudgetService::summary(&context.db, context.clock.as_ref(), context.week_start())?;
    output::section("Budget summary");
    output::info(format!("  Active budgets : {}", summary.total_budgets));
    output::info(format!("  Budgeted       : {}", context.money(summary.total_amount)));
    output::info(format!("  Spent          : {}", context.money(summary.total_spent)));
    output::info(format!("  Remaining      : {}", context.money(summary.total_remaining)));
    output::info(format!("  Average used   : {:.1}%", summary.average_percentage));
    output::info(format!(
        "  Status         : {} good, {} warning, {} exceeded",
        summary.good, summary.warning, summary.exceeded
    ));
    Ok(())
}

fn history(context: &mut ShellContext, id: i64) -> CommandResult {
    let budget = BudgetService::record(&context.db, id)?;
    let snapshots = BudgetService::history(&context.db, id)?;
    if snapshots.is_empty() {
        output::info(format!(
            "No progress recorded for `{}` yet. Run `budget check` to take a snapshot.",
            budget.name
        ));
        return Ok(());
    }
    output::section(format!("History of {}", budget.name));
    for snapshot in &snapshots {
        output::info(format!(
            "  {}  {:>12}  {:>6.1}%  {}",
            context.date(snapshot.date),
            context.money(snapshot.spent_amount),
            snapshot.percentage,
            bar(snapshot.percentage, 100.0, BAR_WIDTH)
        ));
    }
    Ok(())
}
