use std::sync::Arc;

use super::{subcommand, unknown_subcommand};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::forms::{FieldDescriptor, FormDescriptor, Prefill, Validator};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Column, Table};
use crate::core::services::CategoryService;
use crate::domain::{CategoryKind, CategoryUpdate, NewCategory};

const USAGE: &str = "category <list|add|edit|remove> [args]";

const SUBCOMMANDS: &[&str] = &["list", "add", "edit", "remove"];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "category",
        "Manage spending and income categories",
        "category list [expense|income] | add [name=.. type=.. icon=.. color=..] | \
         edit <id|name> [field=value..] | remove <id|name>",
        cmd_category,
    )
    .with_subcommands(SUBCOMMANDS)]
}

fn cmd_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = subcommand(args, USAGE)?;
    match action.as_str() {
        "list" => list_categories(context, rest.first().copied()),
        "add" => add_category(context, rest),
        "edit" => {
            let token = rest
                .first()
                .ok_or_else(|| CommandError::usage("category edit <id|name>"))?;
            let id = context.resolve_category(token)?;
            edit_category(context, id, &rest[1..])
        }
        "remove" => {
            let token = rest
                .first()
                .ok_or_else(|| CommandError::usage("category remove <id|name>"))?;
            let id = context.resolve_category(token)?;
            remove_category(context, id)
        }
        other => Err(unknown_subcommand("category", other)),
    }
}

fn category_form() -> FormDescriptor {
    FormDescriptor::new(
        "category",
        vec![
            FieldDescriptor::text("name", "Category name", Validator::NonEmpty),
            FieldDescriptor::choice("type", "Category type", &["expense", "income"])
                .with_default("expense"),
            FieldDescriptor::text("icon", "Icon", Validator::NonEmpty).with_default("tag"),
            FieldDescriptor::text("color", "Color", hex_color())
                .with_help("#RRGGBB")
                .with_default("#78909C"),
        ],
    )
}

fn hex_color() -> Validator {
    Validator::Custom(Arc::new(|input: &str| {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() == 6 && digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            Ok(format!("#{}", digits.to_ascii_uppercase()))
        } else {
            Err("Use a hex colour such as #4CAF50".to_string())
        }
    }))
}

fn list_categories(context: &mut ShellContext, kind: Option<&str>) -> CommandResult {
    let categories = match kind {
        Some(kind) => CategoryService::list_by_kind(&context.db, kind.parse::<CategoryKind>()?)?,
        None => CategoryService::list(&context.db)?,
    };
    if categories.is_empty() {
        output::info("No categories found.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        Column::right("ID"),
        Column::left("Name").capped(24),
        Column::left("Type"),
        Column::left("Icon"),
        Column::left("Color"),
        Column::left("Default"),
    ]);
    for category in &categories {
        table.push(vec![
            category.id.to_string(),
            category.name.clone(),
            category.kind.to_string(),
            category.icon.clone(),
            category.color.clone(),
            if category.is_default { "yes" } else { "" }.to_string(),
        ]);
    }
    output::section("Categories");
    output::info(table.render());
    Ok(())
}

fn add_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let values = category_form().run(context, args, &Prefill::new())?;
    let category = NewCategory::new(
        values.require("name")?,
        values.require("type")?.parse::<CategoryKind>()?,
    )
    .with_style(values.require("icon")?, values.require("color")?);
    let category = CategoryService::create(&context.db, context.clock.as_ref(), category)?;
    output::success(format!(
        "Created {} category #{} `{}`.",
        category.kind, category.id, category.name
    ));
    Ok(())
}

fn edit_category(context: &mut ShellContext, id: i64, args: &[&str]) -> CommandResult {
    let existing = CategoryService::get(&context.db, id)?;
    let prefill = Prefill::from([
        ("name", existing.name.clone()),
        ("type", existing.kind.to_string()),
        ("icon", existing.icon.clone()),
        ("color", existing.color.clone()),
    ]);
    let values = category_form().run(context, args, &prefill)?;
    let changes = CategoryUpdate {
        name: values.owned("name"),
        icon: values.owned("icon"),
        color: values.owned("color"),
        kind: Some(values.require("type")?.parse()?),
    };
    let category = CategoryService::update(&context.db, context.clock.as_ref(), id, changes)?;
    output::success(format!("Updated category `{}`.", category.name));
    Ok(())
}

fn remove_category(context: &mut ShellContext, id: i64) -> CommandResult {
    let category = CategoryService::get(&context.db, id)?;
    if !context.confirm(&format!("Delete category `{}`?", category.name))? {
        output::info("Deletion cancelled.");
        return Ok(());
    }
    if CategoryService::delete(&context.db, id)? {
        output::success(format!("Deleted category `{}`.", category.name));
    }
    Ok(())
}
