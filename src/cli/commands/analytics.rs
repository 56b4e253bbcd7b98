use super::{subcommand, unknown_subcommand};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{bar, Column, Table};
use crate::core::period::TimePeriod;
use crate::core::services::{AnalyticsService, CategorySpending};

const USAGE: &str = "analytics <spending|top|trends|budgets|totals> [args]";
const DEFAULT_TOP: usize = 5;
const DEFAULT_MONTHS: u32 = 6;
const BAR_WIDTH: usize = 24;

const SUBCOMMANDS: &[&str] = &["spending", "top", "trends", "budgets", "totals"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "analytics",
        "Spending reports and trends",
        "analytics spending [period] | top [n] [period] | trends [months] | budgets [period] | \
         totals [period]   (period: week, month, quarter, year)",
        cmd_analytics,
    )
    .with_subcommands(SUBCOMMANDS)]
}

fn cmd_analytics(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, USAGE)?;
    match action.as_str() {
        "spending" => spending(context, period_arg(rest.first())?),
        "top" => {
            let limit = match rest.first() {
                Some(raw) => raw.parse::<usize>().map_err(|_| {
                    CommandError::InvalidArguments(format!("invalid count `{raw}`"))
                })?,
                None => DEFAULT_TOP,
            };
            top(context, limit, period_arg(rest.get(1))?)
        }
        "trends" => {
            let months = match rest.first() {
                Some(raw) => raw
                    .parse::<u32>()
                    .ok()
                    .filter(|months| *months > 0)
                    .ok_or_else(|| {
                        CommandError::InvalidArguments(format!("invalid month count `{raw}`"))
                    })?,
                None => DEFAULT_MONTHS,
            };
            trends(context, months)
        }
        "budgets" => budgets(context, period_arg(rest.first())?),
        "totals" => totals(context, period_arg(rest.first())?),
        other => Err(unknown_subcommand("analytics", other)),
    }
}

fn period_arg(raw: Option<&&str>) -> Result<TimePeriod, CommandError> {
    Ok(match raw {
        Some(raw) => raw.parse()?,
        None => TimePeriod::Month,
    })
}

fn window_title(context: &ShellContext, title: &str, period: TimePeriod) -> String {
    let window = period.window(context.today(), context.week_start());
    format!(
        "{title} ({}: {} to {})",
        period,
        context.date(window.start),
        context.date(window.end)
    )
}

fn spending(context: &mut ShellContext, period: TimePeriod) -> CommandResult {
    let rows = AnalyticsService::spending_by_category(
        &context.db,
        context.clock.as_ref(),
        context.week_start(),
        period,
    )?;
    print_spending(context, &window_title(context, "Spending by category", period), &rows)
}

fn top(context: &mut ShellContext, limit: usize, period: TimePeriod) -> CommandResult {
    let rows = AnalyticsService::top_expense_categories(
        &context.db,
        context.clock.as_ref(),
        context.week_start(),
        period,
        limit,
    )?;
    print_spending(context, &window_title(context, "Top categories", period), &rows)
}

fn print_spending(
    context: &ShellContext,
    title: &str,
    rows: &[CategorySpending],
) -> CommandResult {
    if rows.is_empty() {
        output::info("No expenses in this period.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        Column::left("Category").capped(20),
        Column::right("Amount"),
        Column::right("Share"),
        Column::left(""),
    ]);
    for row in rows {
        table.push(vec![
            row.category_name.clone(),
            context.money(row.amount),
            format!("{:.1}%", row.percentage),
            bar(row.percentage, 100.0, BAR_WIDTH),
        ]);
    }
    output::section(title);
    output::info(table.render());
    Ok(())
}

fn trends(context: &mut ShellContext, months: u32) -> CommandResult {
    let rows = AnalyticsService::monthly_trends(&context.db, context.clock.as_ref(), months)?;
    let peak = rows
        .iter()
        .map(|row| row.income.max(row.expense))
        .fold(0.0_f64, f64::max);
    let mut table = Table::new(vec![
        Column::left("Month"),
        Column::right("Income"),
        Column::right("Expense"),
        Column::right("Net"),
        Column::left("Expense trend"),
    ]);
    for row in &rows {
        table.push(vec![
            row.label.clone(),
            context.money(row.income),
            context.money(row.expense),
            context.money(row.net),
            bar(row.expense, peak, BAR_WIDTH),
        ]);
    }
    output::section(format!("Monthly trends (last {months} months)"));
    output::info(table.render());
    Ok(())
}

fn budgets(context: &mut ShellContext, period: TimePeriod) -> CommandResult {
    let rows = AnalyticsService::budget_analysis(
        &context.db,
        context.clock.as_ref(),
        context.week_start(),
        period,
    )?;
    if rows.is_empty() {
        output::info("No active budgets to analyse.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        Column::left("Budget").capped(20),
        Column::left("Target").capped(20),
        Column::right("Spent"),
        Column::right("Budget"),
        Column::right("Remaining"),
        Column::right("Used"),
        Column::left("Status"),
    ]);
    for row in &rows {
        table.push(vec![
            row.budget_name.clone(),
            row.target.clone(),
            context.money(row.spent_amount),
            context.money(row.budget_amount),
            context.money(row.remaining_amount),
            format!("{:.1}%", row.percentage),
            row.status.to_string(),
        ]);
    }
    output::section(window_title(context, "Budget analysis", period));
    output::info(table.render());
    Ok(())
}

fn totals(context: &mut ShellContext, period: TimePeriod) -> CommandResult {
    let clock = context.clock.as_ref();
    let week_start = context.week_start();
    let income = AnalyticsService::total_income(&context.db, clock, week_start, period)?;
    let spending = AnalyticsService::total_spending(&context.db, clock, week_start, period)?;
    let net = AnalyticsService::net_income(&context.db, clock, week_start, period)?;
    output::section(window_title(context, "Totals", period));
    output::info(format!("  Income   : {}", context.money(income)));
    output::info(format!("  Spending : {}", context.money(spending)));
    output::info(format!("  Net      : {}", context.money(net)));
    Ok(())
}
