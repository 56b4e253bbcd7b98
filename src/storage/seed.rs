use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::info;

use super::Database;
use crate::{
    domain::{AccountKind, CategoryKind},
    errors::Result,
};

#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultAccount {
    pub name: &'static str,
    pub kind: AccountKind,
    pub icon: &'static str,
    pub color: &'static str,
}

const fn expense(name: &'static str, color: &'static str, icon: &'static str) -> DefaultCategory {
    DefaultCategory {
        name,
        color,
        icon,
        kind: CategoryKind::Expense,
    }
}

const fn income(name: &'static str, color: &'static str, icon: &'static str) -> DefaultCategory {
    DefaultCategory {
        name,
        color,
        icon,
        kind: CategoryKind::Income,
    }
}

pub const DEFAULT_CATEGORIES: [DefaultCategory; 16] = [
    expense("Food & Dining", "#FF6B6B", "restaurant"),
    expense("Transportation", "#4ECDC4", "car"),
    expense("Shopping", "#45B7D1", "shopping-bag"),
    expense("Entertainment", "#FFA726", "movie"),
    expense("Bills & Utilities", "#9575CD", "receipt"),
    expense("Healthcare", "#EF5350", "medical-bag"),
    expense("Education", "#66BB6A", "school"),
    expense("Travel", "#26C6DA", "airplane"),
    expense("Personal Care", "#AB47BC", "person"),
    expense("Other", "#78909C", "more-horizontal"),
    income("Salary", "#4CAF50", "dollar-sign"),
    income("Freelance", "#8BC34A", "briefcase"),
    income("Investment", "#CDDC39", "trending-up"),
    income("Gift", "#FFC107", "gift"),
    income("Bonus", "#FF9800", "award"),
    income("Other Income", "#795548", "plus-circle"),
];

pub const DEFAULT_ACCOUNTS: [DefaultAccount; 2] = [
    DefaultAccount {
        name: "Cash",
        kind: AccountKind::Cash,
        icon: "dollar-sign",
        color: "#4CAF50",
    },
    DefaultAccount {
        name: "Checking Account",
        kind: AccountKind::Bank,
        icon: "credit-card",
        color: "#2196F3",
    },
];

impl Database {
    /// Inserts the default categories and accounts into an empty database.
    /// Returns `false` when categories already exist.
    pub fn seed_defaults(&self, now: DateTime<Utc>) -> Result<bool> {
        self.with_transaction(|conn| {
            let existing: i64 =
                conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
            if existing > 0 {
                return Ok(false);
            }
            for category in DEFAULT_CATEGORIES {
                conn.execute(
                    "INSERT INTO categories (name, icon, color, type, is_default, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
                    params![category.name, category.icon, category.color, category.kind, now],
                )?;
            }
            for account in DEFAULT_ACCOUNTS {
                conn.execute(
                    "INSERT INTO accounts (name, type, initial_balance, current_balance, currency,
                                           icon, color, is_active, created_at, updated_at)
                     VALUES (?1, ?2, 0, 0, 'USD', ?3, ?4, 1, ?5, ?5)",
                    params![account.name, account.kind, account.icon, account.color, now],
                )?;
            }
            info!(
                categories = DEFAULT_CATEGORIES.len(),
                accounts = DEFAULT_ACCOUNTS.len(),
                "seeded default data"
            );
            Ok(true)
        })
    }
}
