use super::{subcommand, unknown_subcommand};
use crate::cli::core::{parse_id, CommandError, CommandResult, ShellContext};
use crate::cli::forms::{FieldDescriptor, FormDescriptor, FormValues, Prefill, Validator};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Column, Table};
use crate::core::services::AccountService;
use crate::currency;
use crate::domain::{Account, AccountKind, AccountUpdate, NewAccount};

const USAGE: &str = "account <list|show|add|edit|remove|balance> [args]";

const SUBCOMMANDS: &[&str] = &["list", "show", "add", "edit", "remove", "balance"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "account",
        "Manage accounts and balances",
        "account list | show <id> | add [name=.. type=.. balance=.. currency=..] | \
         edit <id> [field=value..] | remove <id> | balance [<id> <amount>]",
        cmd_account,
    )
    .with_subcommands(SUBCOMMANDS)]
}

fn cmd_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, USAGE)?;
    match action.as_str() {
        "list" => list_accounts(context),
        "show" => show_account(context, parse_id(rest.first(), "account show <id>")?),
        "add" => add_account(context, rest),
        "edit" => {
            let id = parse_id(rest.first(), "account edit <id> [field=value..]")?;
            edit_account(context, id, &rest[1..])
        }
        "remove" => remove_account(context, parse_id(rest.first(), "account remove <id>")?),
        "balance" => balance(context, rest),
        other => Err(unknown_subcommand("account", other)),
    }
}

fn kind_tokens() -> Vec<&'static str> {
    AccountKind::ALL.iter().map(AccountKind::as_str).collect()
}

fn account_form(default_currency: &str) -> FormDescriptor {
    FormDescriptor::new(
        "account",
        vec![
            FieldDescriptor::text("name", "Account name", Validator::NonEmpty),
            FieldDescriptor::choice("type", "Account type", &kind_tokens()).with_default("bank"),
            FieldDescriptor::text("balance", "Initial balance", Validator::Balance)
                .with_default("0"),
            FieldDescriptor::choice("currency", "Currency", &currency::supported_codes())
                .with_default(default_currency),
        ],
    )
}

fn edit_form(default_currency: &str) -> FormDescriptor {
    let mut form = account_form(default_currency);
    form.fields
        .push(FieldDescriptor::choice("active", "Active", &["yes", "no"]).with_default("yes"));
    form
}

fn parse_kind(values: &FormValues) -> Result<AccountKind, CommandError> {
    Ok(values.require("type")?.parse()?)
}

fn list_accounts(context: &mut ShellContext) -> CommandResult {
    let accounts = AccountService::list(&context.db)?;
    if accounts.is_empty() {
        output::info("No accounts yet. Add one with `account add`.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        Column::right("ID"),
        Column::left("Name").capped(24),
        Column::left("Type"),
        Column::right("Balance"),
        Column::left("Status"),
    ]);
    for account in &accounts {
        table.push(vec![
            account.id.to_string(),
            account.name.clone(),
            account.kind.label().to_string(),
            currency::format_amount(account.current_balance, &account.currency),
            if account.is_active { "active" } else { "inactive" }.to_string(),
        ]);
    }
    output::section("Accounts");
    output::info(table.render());
    Ok(())
}

fn show_account(context: &mut ShellContext, id: i64) -> CommandResult {
    let account = AccountService::get(&context.db, id)?;
    output::section(format!("Account #{}", account.id));
    print_account(&account);
    Ok(())
}

fn print_account(account: &Account) {
    output::info(format!("  Name            : {}", account.name));
    output::info(format!("  Type            : {}", account.kind.label()));
    output::info(format!(
        "  Initial balance : {}",
        currency::format_amount(account.initial_balance, &account.currency)
    ));
    output::info(format!(
        "  Current balance : {}",
        currency::format_amount(account.current_balance, &account.currency)
    ));
    output::info(format!("  Currency        : {}", account.currency));
    output::info(format!(
        "  Status          : {}",
        if account.is_active { "active" } else { "inactive" }
    ));
}

fn add_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let values = account_form(&context.settings.currency).run(context, args, &Prefill::new())?;
    let mut account = NewAccount::new(values.require("name")?, parse_kind(&values)?)
        .with_initial_balance(values.number("balance")?);
    if let Some(code) = values.owned("currency") {
        account.currency = code;
    }
    let account = AccountService::create(&context.db, context.clock.as_ref(), account)?;
    output::success(format!(
        "Created account #{} `{}` with {}.",
        account.id,
        account.name,
        currency::format_amount(account.current_balance, &account.currency)
    ));
    Ok(())
}

fn edit_account(context: &mut ShellContext, id: i64, args: &[&str]) -> CommandResult {
    let existing = AccountService::get(&context.db, id)?;
    let prefill = Prefill::from([
        ("name", existing.name.clone()),
        ("type", existing.kind.as_str().to_string()),
        ("balance", existing.initial_balance.to_string()),
        ("currency", existing.currency.clone()),
        (
            "active",
            if existing.is_active { "yes" } else { "no" }.to_string(),
        ),
    ]);
    let values = edit_form(&context.settings.currency).run(context, args, &prefill)?;
    let changes = AccountUpdate {
        name: values.owned("name"),
        kind: Some(parse_kind(&values)?),
        initial_balance: Some(values.number("balance")?),
        currency: values.owned("currency"),
        is_active: Some(values.get("active") == Some("yes")),
        ..AccountUpdate::default()
    };
    let account = AccountService::update(&context.db, context.clock.as_ref(), id, changes)?;
    output::success(format!("Updated account #{}.", account.id));
    print_account(&account);
    Ok(())
}

fn remove_account(context: &mut ShellContext, id: i64) -> CommandResult {
    let account = AccountService::get(&context.db, id)?;
    if !context.confirm(&format!("Delete account `{}`?", account.name))? {
        output::info("Deletion cancelled.");
        return Ok(());
    }
    if AccountService::delete(&context.db, id)? {
        output::success(format!("Deleted account `{}`.", account.name));
    }
    Ok(())
}

fn balance(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let total = AccountService::total_balance(&context.db)?;
            output::info(format!("Total balance: {}", context.money(total)));
            Ok(())
        }
        [id, amount] => {
            let id = parse_id(Some(id), "account balance <id> <amount>")?;
            let amount = currency::parse_currency_input(amount).ok_or_else(|| {
                CommandError::InvalidArguments(format!("invalid amount `{amount}`"))
            })?;
            let account =
                AccountService::set_balance(&context.db, context.clock.as_ref(), id, amount)?;
            output::success(format!(
                "Balance of `{}` set to {}.",
                account.name,
                currency::format_amount(account.current_balance, &account.currency)
            ));
            Ok(())
        }
        _ => Err(CommandError::usage("account balance [<id> <amount>]")),
    }
}
