use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{AccountService, BudgetService, CategoryService, TransactionService};
use crate::{
    core::clock::Clock,
    domain::{Account, Budget, Category, Transaction},
    errors::{Result, TrackerError},
    storage::Database,
    utils::{build_info::APP_VERSION, paths::ensure_dir},
};

pub const CSV_HEADER: [&str; 7] = [
    "Date",
    "Amount",
    "Type",
    "Category",
    "Account",
    "Description",
    "Notes",
];

/// Full snapshot of user data as written by [`ExportService::export_json`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub export_date: DateTime<Utc>,
    pub app_version: String,
}

impl BackupDocument {
    /// Checks that ids are unique and every reference resolves inside the
    /// document.
    pub fn validate(&self) -> Result<()> {
        let account_ids = unique_ids("account", self.accounts.iter().map(|a| a.id))?;
        let category_ids = unique_ids("category", self.categories.iter().map(|c| c.id))?;
        unique_ids("budget", self.budgets.iter().map(|b| b.id))?;
        unique_ids("transaction", self.transactions.iter().map(|t| t.id))?;

        for txn in &self.transactions {
            if !account_ids.contains(&txn.account_id) {
                return Err(invalid_backup(format!(
                    "transaction {} references missing account {}",
                    txn.id, txn.account_id
                )));
            }
            if !category_ids.contains(&txn.category_id) {
                return Err(invalid_backup(format!(
                    "transaction {} references missing category {}",
                    txn.id, txn.category_id
                )));
            }
        }
        for budget in &self.budgets {
            budget.validate().map_err(|err| {
                invalid_backup(format!("budget {} is invalid: {err}", budget.id))
            })?;
            if let Some(id) = budget.category_id.filter(|id| !category_ids.contains(id)) {
                return Err(invalid_backup(format!(
                    "budget {} references missing category {id}",
                    budget.id
                )));
            }
            if let Some(id) = budget.account_id.filter(|id| !account_ids.contains(id)) {
                return Err(invalid_backup(format!(
                    "budget {} references missing account {id}",
                    budget.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories: usize,
    pub accounts: usize,
    pub budgets: usize,
    pub transactions: usize,
}

pub struct ExportService;

impl ExportService {
    pub fn snapshot(db: &Database, clock: &dyn Clock) -> Result<BackupDocument> {
        let mut transactions = TransactionService::list(db)?;
        transactions.sort_by_key(|txn| txn.id);
        Ok(BackupDocument {
            transactions,
            budgets: BudgetService::records(db)?,
            accounts: AccountService::list(db)?,
            categories: CategoryService::list(db)?,
            export_date: clock.now(),
            app_version: APP_VERSION.to_string(),
        })
    }

    /// Writes `expense_tracker_backup_<timestamp>.json` into `dir`.
    pub fn export_json(db: &Database, clock: &dyn Clock, dir: &Path) -> Result<PathBuf> {
        ensure_dir(dir)?;
        let document = Self::snapshot(db, clock)?;
        let path = dir.join(format!(
            "expense_tracker_backup_{}.json",
            document.export_date.format("%Y-%m-%d_%H-%M-%S")
        ));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.flush()?;
        info!(path = %path.display(), transactions = document.transactions.len(), "exported JSON backup");
        Ok(path)
    }

    /// Writes `transactions_<date>.csv` into `dir`, naming categories and
    /// accounts instead of using their ids.
    pub fn export_csv(db: &Database, clock: &dyn Clock, dir: &Path) -> Result<PathBuf> {
        ensure_dir(dir)?;
        let path = dir.join(format!("transactions_{}.csv", clock.today().format("%Y-%m-%d")));
        let categories: HashMap<i64, String> = CategoryService::list(db)?
            .into_iter()
            .map(|category| (category.id, category.name))
            .collect();
        let accounts: HashMap<i64, String> = AccountService::list(db)?
            .into_iter()
            .map(|account| (account.id, account.name))
            .collect();
        let transactions = TransactionService::list(db)?;

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(CSV_HEADER)?;
        for txn in &transactions {
            writer.write_record([
                txn.date.to_string(),
                format!("{:.2}", txn.amount),
                txn.kind.to_string(),
                categories.get(&txn.category_id).cloned().unwrap_or_default(),
                accounts.get(&txn.account_id).cloned().unwrap_or_default(),
                txn.description.clone().unwrap_or_default(),
                txn.notes.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = transactions.len(), "exported transactions CSV");
        Ok(path)
    }

    pub fn read_backup(path: &Path) -> Result<BackupDocument> {
        let reader = BufReader::new(File::open(path)?);
        let document: BackupDocument = serde_json::from_reader(reader)?;
        Ok(document)
    }

    /// Replaces all stored data with the contents of the backup at `path`.
    pub fn import_json(db: &Database, path: &Path) -> Result<ImportSummary> {
        let document = Self::read_backup(path)?;
        let summary = Self::restore(db, &document)?;
        info!(path = %path.display(), ?summary, "imported backup");
        Ok(summary)
    }

    /// Validates `document`, wipes every table and inserts the backup rows
    /// with their original ids. Nothing changes when any step fails.
    pub fn restore(db: &Database, document: &BackupDocument) -> Result<ImportSummary> {
        document.validate()?;
        db.with_transaction(|conn| {
            Database::clear_tables(conn)?;
            for category in &document.categories {
                conn.execute(
                    "INSERT INTO categories (id, name, icon, color, type, is_default, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        category.id,
                        category.name,
                        category.icon,
                        category.color,
                        category.kind,
                        category.is_default,
                        category.created_at,
                        category.updated_at
                    ],
                )?;
            }
            for account in &document.accounts {
                conn.execute(
                    "INSERT INTO accounts (id, name, type, initial_balance, current_balance, currency,
                                           icon, color, is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        account.id,
                        account.name,
                        account.kind,
                        account.initial_balance,
                        account.current_balance,
                        account.currency,
                        account.icon,
                        account.color,
                        account.is_active,
                        account.created_at,
                        account.updated_at
                    ],
                )?;
            }
            for budget in &document.budgets {
                conn.execute(
                    "INSERT INTO budgets (id, name, category_id, account_id, amount, period, start_date,
                                          end_date, spent_amount, alert_percentage, alert_triggered,
                                          is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                    params![
                        budget.id,
                        budget.name,
                        budget.category_id,
                        budget.account_id,
                        budget.amount,
                        budget.period,
                        budget.start_date,
                        budget.end_date,
                        budget.spent_amount,
                        budget.alert_percentage,
                        budget.alert_triggered,
                        budget.is_active,
                        budget.created_at,
                        budget.updated_at
                    ],
                )?;
            }
            for txn in &document.transactions {
                conn.execute(
                    "INSERT INTO transactions (id, account_id, category_id, type, amount, description,
                                               notes, receipt_photo, date, is_recurring, recurring_id,
                                               tags, location, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        txn.id,
                        txn.account_id,
                        txn.category_id,
                        txn.kind,
                        txn.amount,
                        txn.description,
                        txn.notes,
                        txn.receipt_photo,
                        txn.date,
                        txn.is_recurring,
                        txn.recurring_id,
                        serde_json::to_string(&txn.tags)?,
                        txn.location.map(|loc| serde_json::to_string(&loc)).transpose()?,
                        txn.created_at,
                        txn.updated_at
                    ],
                )?;
            }
            Ok(ImportSummary {
                categories: document.categories.len(),
                accounts: document.accounts.len(),
                budgets: document.budgets.len(),
                transactions: document.transactions.len(),
            })
        })
    }

    /// Deletes every row from every table.
    pub fn clear_all(db: &Database) -> Result<()> {
        db.with_transaction(Database::clear_tables)?;
        warn!("cleared all stored data");
        Ok(())
    }
}

fn unique_ids(entity: &str, ids: impl Iterator<Item = i64>) -> Result<HashSet<i64>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(invalid_backup(format!("duplicate {entity} id {id}")));
        }
    }
    Ok(seen)
}

fn invalid_backup(detail: String) -> TrackerError {
    TrackerError::validation(format!("invalid backup: {detail}"))
}
