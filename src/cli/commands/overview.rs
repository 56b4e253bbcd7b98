use dialoguer::Select;

use super::transaction::print_transactions;
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::config::FirstDayOfWeek;
use crate::core::period::TimePeriod;
use crate::core::services::{AccountService, AnalyticsService, BudgetService, TransactionService};
use crate::currency;

const DASHBOARD_RECENT: usize = 5;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "dashboard",
            "Balances, this month's totals, budgets and recent activity",
            "dashboard",
            cmd_dashboard,
        ),
        CommandEntry::new(
            "onboarding",
            "Walk through the first-run setup",
            "onboarding",
            cmd_onboarding,
        ),
    ]
}

fn cmd_dashboard(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let clock = context.clock.as_ref();
    let week_start = context.week_start();
    let balance = AccountService::total_balance(&context.db)?;
    let income = AnalyticsService::total_income(&context.db, clock, week_start, TimePeriod::Month)?;
    let spending =
        AnalyticsService::total_spending(&context.db, clock, week_start, TimePeriod::Month)?;
    let budgets = BudgetService::summary(&context.db, clock, week_start)?;
    let unread = BudgetService::unread_count(&context.db)?;

    output::section("Dashboard");
    output::info(format!("  Total balance     : {}", context.money(balance)));
    output::info(format!("  Income this month : {}", context.money(income)));
    output::info(format!("  Spent this month  : {}", context.money(spending)));
    output::info(format!(
        "  Net this month    : {}",
        context.money(income - spending)
    ));
    if budgets.total_budgets > 0 {
        output::info(format!(
            "  Budgets           : {} active, {:.1}% used ({} warning, {} exceeded)",
            budgets.total_budgets, budgets.average_percentage, budgets.warning, budgets.exceeded
        ));
    }
    if unread > 0 {
        output::warning(format!(
            "{unread} unread budget alert(s). See `budget alerts unread`."
        ));
    }

    let recent = TransactionService::recent(&context.db, DASHBOARD_RECENT)?;
    print_transactions(context, "Recent transactions", &recent)
}

fn cmd_onboarding(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::section("Welcome to Expense Tracker");
    output::info("  Track spending across accounts, categories and budgets.");
    output::info("  1. Review your accounts with `account list` and add your own.");
    output::info("  2. Record income and expenses with `transaction add`.");
    output::info("  3. Set spending limits with `budget add` and get alerts as you approach them.");

    if context.is_interactive() {
        let codes = currency::supported_codes();
        let labels: Vec<String> = currency::CURRENCIES
            .iter()
            .map(|entry| format!("{} {} ({})", entry.code, entry.name, entry.symbol))
            .collect();
        let current = codes
            .iter()
            .position(|code| *code == context.settings.currency)
            .unwrap_or(0);
        let choice = Select::with_theme(&context.theme)
            .with_prompt("Preferred currency")
            .items(&labels)
            .default(current)
            .interact()?;
        context.settings.currency = codes[choice].to_string();

        let days = [
            FirstDayOfWeek::Sunday,
            FirstDayOfWeek::Monday,
            FirstDayOfWeek::Saturday,
        ];
        let names: Vec<&str> = days.iter().map(FirstDayOfWeek::as_str).collect();
        let current = days
            .iter()
            .position(|day| *day == context.settings.first_day_of_week)
            .unwrap_or(0);
        let choice = Select::with_theme(&context.theme)
            .with_prompt("Weeks start on")
            .items(&names)
            .default(current)
            .interact()?;
        context.settings.first_day_of_week = days[choice];
    }

    context.settings.onboarding_completed = true;
    context.save_settings()?;
    output::success("Setup complete. Type `dashboard` for an overview.");
    Ok(())
}
