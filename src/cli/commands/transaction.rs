use std::collections::HashMap;

use super::{subcommand, unknown_subcommand};
use crate::cli::core::{parse_id, CommandError, CommandResult, ShellContext};
use crate::cli::forms::{FieldDescriptor, FormDescriptor, FormValues, Prefill, Validator};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Column, Table};
use crate::core::services::{AccountService, CategoryService, TransactionService};
use crate::domain::{
    NewTransaction, Transaction, TransactionFilter, TransactionKind, TransactionUpdate,
};

const USAGE: &str = "transaction <list|recent|show|add|edit|remove> [args]";
const DEFAULT_RECENT: usize = 10;

const SUBCOMMANDS: &[&str] = &["list", "recent", "show", "add", "edit", "remove"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "transaction",
        "Record and browse income, expenses and transfers",
        "transaction list [account=.. category=.. type=.. from=.. to=.. min=.. max=..] | \
         recent [n] | show <id> | add [type=.. amount=.. account=.. category=.. date=.. \
         description=.. notes=.. tags=..] | edit <id> [field=value..] | remove <id>",
        cmd_transaction,
    )
    .with_subcommands(SUBCOMMANDS)]
}

fn cmd_transaction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, USAGE)?;
    match action.as_str() {
        "list" => list_transactions(context, rest),
        "recent" => recent_transactions(context, rest.first().copied()),
        "show" => show_transaction(context, parse_id(rest.first(), "transaction show <id>")?),
        "add" => add_transaction(context, rest),
        "edit" => {
            let id = parse_id(rest.first(), "transaction edit <id> [field=value..]")?;
            edit_transaction(context, id, &rest[1..])
        }
        "remove" => {
            remove_transaction(context, parse_id(rest.first(), "transaction remove <id>")?)
        }
        other => Err(unknown_subcommand("transaction", other)),
    }
}

fn kind_tokens() -> Vec<&'static str> {
    TransactionKind::ALL.iter().map(TransactionKind::as_str).collect()
}

fn transaction_form(today: &str, default_account: Option<String>) -> FormDescriptor {
    let mut account = FieldDescriptor::text("account", "Account", Validator::NonEmpty)
        .with_help("name or id");
    if let Some(name) = default_account {
        account = account.with_default(name);
    }
    FormDescriptor::new(
        "transaction",
        vec![
            FieldDescriptor::choice("type", "Type", &kind_tokens()).with_default("expense"),
            FieldDescriptor::text("amount", "Amount", Validator::Amount),
            account,
            FieldDescriptor::text("category", "Category", Validator::NonEmpty)
                .with_help("name or id"),
            FieldDescriptor::text("date", "Date", Validator::Date)
                .with_help("YYYY-MM-DD")
                .with_default(today),
            FieldDescriptor::text("description", "Description", Validator::NonEmpty),
            FieldDescriptor::text("notes", "Notes", Validator::None).optional(),
            FieldDescriptor::text("tags", "Tags", Validator::None)
                .with_help("comma separated")
                .optional(),
        ],
    )
}

fn filter_form() -> FormDescriptor {
    FormDescriptor::new(
        "transaction filter",
        vec![
            FieldDescriptor::text("account", "Account", Validator::NonEmpty).optional(),
            FieldDescriptor::text("category", "Category", Validator::NonEmpty).optional(),
            FieldDescriptor::choice("type", "Type", &kind_tokens()).optional(),
            FieldDescriptor::text("from", "From", Validator::Date).optional(),
            FieldDescriptor::text("to", "To", Validator::Date).optional(),
            FieldDescriptor::text("min", "Minimum amount", Validator::PositiveNumber).optional(),
            FieldDescriptor::text("max", "Maximum amount", Validator::PositiveNumber).optional(),
        ],
    )
}

fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|tags| {
        tags.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn optional_number(values: &FormValues, key: &str) -> Result<Option<f64>, CommandError> {
    values.get(key).map(|_| values.number(key)).transpose()
}

fn list_transactions(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let values = filter_form().from_args(args, &Prefill::new())?;
    let filter = TransactionFilter {
        account_id: values
            .get("account")
            .map(|token| context.resolve_account(token))
            .transpose()?,
        category_id: values
            .get("category")
            .map(|token| context.resolve_category(token))
            .transpose()?,
        kind: values.get("type").map(str::parse::<TransactionKind>).transpose()?,
        date_from: values.date("from")?,
        date_to: values.date("to")?,
        amount_min: optional_number(&values, "min")?,
        amount_max: optional_number(&values, "max")?,
    };
    let transactions = TransactionService::filter(&context.db, &filter)?;
    print_transactions(context, "Transactions", &transactions)
}

fn recent_transactions(context: &mut ShellContext, count: Option<&str>) -> CommandResult {
    let limit = match count {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| CommandError::InvalidArguments(format!("invalid count `{raw}`")))?,
        None => DEFAULT_RECENT,
    };
    let transactions = TransactionService::recent(&context.db, limit)?;
    print_transactions(context, "Recent transactions", &transactions)
}

pub(crate) fn print_transactions(
    context: &ShellContext,
    title: &str,
    transactions: &[Transaction],
) -> CommandResult {
    if transactions.is_empty() {
        output::info("No transactions found.");
        return Ok(());
    }
    let categories: HashMap<i64, String> = CategoryService::list(&context.db)?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();
    let accounts: HashMap<i64, String> = AccountService::list(&context.db)?
        .into_iter()
        .map(|account| (account.id, account.name))
        .collect();
    let mut table = Table::new(vec![
        Column::right("ID"),
        Column::left("Date"),
        Column::left("Type"),
        Column::left("Category").capped(18),
        Column::left("Account").capped(18),
        Column::right("Amount"),
        Column::left("Description").capped(32),
    ]);
    for txn in transactions {
        table.push(vec![
            txn.id.to_string(),
            context.date(txn.date),
            txn.kind.to_string(),
            categories.get(&txn.category_id).cloned().unwrap_or_default(),
            accounts.get(&txn.account_id).cloned().unwrap_or_default(),
            signed_amount(context, txn),
            txn.description.clone().unwrap_or_default(),
        ]);
    }
    output::section(title);
    output::info(table.render());
    Ok(())
}

fn signed_amount(context: &ShellContext, txn: &Transaction) -> String {
    match txn.kind {
        TransactionKind::Expense => format!("-{}", context.money(txn.amount)),
        TransactionKind::Income => format!("+{}", context.money(txn.amount)),
        TransactionKind::Transfer => context.money(txn.amount),
    }
}

fn show_transaction(context: &mut ShellContext, id: i64) -> CommandResult {
    let txn = TransactionService::get(&context.db, id)?;
    let category = CategoryService::get(&context.db, txn.category_id)?;
    let account = AccountService::get(&context.db, txn.account_id)?;
    output::section(format!("Transaction #{}", txn.id));
    output::info(format!("  Date        : {}", context.date(txn.date)));
    output::info(format!("  Type        : {}", txn.kind));
    output::info(format!("  Amount      : {}", signed_amount(context, &txn)));
    output::info(format!("  Category    : {}", category.name));
    output::info(format!("  Account     : {}", account.name));
    if let Some(description) = &txn.description {
        output::info(format!("  Description : {description}"));
    }
    if let Some(notes) = &txn.notes {
        output::info(format!("  Notes       : {notes}"));
    }
    if !txn.tags.is_empty() {
        output::info(format!("  Tags        : {}", txn.tags.join(", ")));
    }
    Ok(())
}

fn add_transaction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let default_account = AccountService::list_active(&context.db)?
        .into_iter()
        .next()
        .map(|account| account.name);
    let form = transaction_form(&context.today().to_string(), default_account);
    let values = form.run(context, args, &Prefill::new())?;

    let account_id = context.resolve_account(values.require("account")?)?;
    let category_id = context.resolve_category(values.require("category")?)?;
    let date = values
        .date("date")?
        .ok_or_else(|| CommandError::InvalidArguments("missing value for `date`".into()))?;
    let mut txn = NewTransaction::new(
        account_id,
        category_id,
        values.require("type")?.parse()?,
        values.number("amount")?,
        date,
    );
    txn.description = values.owned("description");
    txn.notes = values.owned("notes");
    txn.tags = parse_tags(values.get("tags"));

    let txn = TransactionService::create(&context.db, context.clock.as_ref(), txn)?;
    output::success(format!(
        "Recorded {} #{} of {}.",
        txn.kind,
        txn.id,
        context.money(txn.amount)
    ));
    context.refresh_alerts_quietly();
    Ok(())
}

fn edit_transaction(context: &mut ShellContext, id: i64, args: &[&str]) -> CommandResult {
    let existing = TransactionService::get(&context.db, id)?;
    let prefill = Prefill::from([
        ("type", existing.kind.to_string()),
        ("amount", existing.amount.to_string()),
        ("account", existing.account_id.to_string()),
        ("category", existing.category_id.to_string()),
        ("date", existing.date.to_string()),
        ("description", existing.description.clone().unwrap_or_default()),
        ("notes", existing.notes.clone().unwrap_or_default()),
        ("tags", existing.tags.join(", ")),
    ]);
    let values = transaction_form(&existing.date.to_string(), None).run(context, args, &prefill)?;

    let changes = TransactionUpdate {
        account_id: Some(context.resolve_account(values.require("account")?)?),
        category_id: Some(context.resolve_category(values.require("category")?)?),
        kind: Some(values.require("type")?.parse()?),
        amount: Some(values.number("amount")?),
        date: values.date("date")?,
        description: Some(values.owned("description")),
        notes: Some(values.owned("notes")),
        tags: Some(parse_tags(values.get("tags"))),
    };
    let txn = TransactionService::update(&context.db, context.clock.as_ref(), id, changes)?;
    output::success(format!("Updated transaction #{}.", txn.id));
    context.refresh_alerts_quietly();
    Ok(())
}

fn remove_transaction(context: &mut ShellContext, id: i64) -> CommandResult {
    let txn = TransactionService::get(&context.db, id)?;
    let prompt = format!(
        "Delete {} #{} of {}?",
        txn.kind,
        txn.id,
        context.money(txn.amount)
    );
    if !context.confirm(&prompt)? {
        output::info("Deletion cancelled.");
        return Ok(());
    }
    if TransactionService::delete(&context.db, context.clock.as_ref(), id)? {
        output::success(format!("Deleted transaction #{id}."));
        context.refresh_alerts_quietly();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_tags(Some(" lunch, ,work ")),
            vec!["lunch".to_string(), "work".to_string()]
        );
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn filter_form_accepts_partial_arguments() {
        let values = filter_form()
            .from_args(&["type=expense", "from=2024-03-01"], &Prefill::new())
            .unwrap();
        assert_eq!(values.get("type"), Some("expense"));
        assert_eq!(values.get("account"), None);
        assert!(values.date("from").unwrap().is_some());
    }
}
