use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{json_column, optional_json_column, AccountService, CategoryService};
use crate::{
    core::clock::Clock,
    domain::{NewTransaction, Transaction, TransactionFilter, TransactionUpdate},
    errors::{Result, TrackerError},
    storage::Database,
};

const TRANSACTION_COLUMNS: &str = "id, account_id, category_id, type, amount, description, notes,
     receipt_photo, date, is_recurring, recurring_id, tags, location, created_at, updated_at";

const NEWEST_FIRST: &str = "ORDER BY date DESC, created_at DESC, id DESC";

pub struct TransactionService;

impl TransactionService {
    pub fn list(db: &Database) -> Result<Vec<Transaction>> {
        Self::filter(db, &TransactionFilter::default())
    }

    pub fn get(db: &Database, id: i64) -> Result<Transaction> {
        Self::find(db.conn(), id)?.ok_or_else(|| TrackerError::not_found("Transaction", id))
    }

    pub fn filter(db: &Database, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(account_id) = filter.account_id {
            clauses.push("account_id = ?");
            values.push(Value::Integer(account_id));
        }
        if let Some(category_id) = filter.category_id {
            clauses.push("category_id = ?");
            values.push(Value::Integer(category_id));
        }
        if let Some(kind) = filter.kind {
            clauses.push("type = ?");
            values.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(from) = filter.date_from {
            clauses.push("date >= ?");
            values.push(Value::Text(from.to_string()));
        }
        if let Some(to) = filter.date_to {
            clauses.push("date <= ?");
            values.push(Value::Text(to.to_string()));
        }
        if let Some(min) = filter.amount_min {
            clauses.push("amount >= ?");
            values.push(Value::Real(min));
        }
        if let Some(max) = filter.amount_max {
            clauses.push("amount <= ?");
            values.push(Value::Real(max));
        }
        let predicate = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let mut stmt = db.conn().prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions {predicate} {NEWEST_FIRST}"
        ))?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Most recently recorded transactions, regardless of their date.
    pub fn recent(db: &Database, limit: usize) -> Result<Vec<Transaction>> {
        let mut stmt = db.conn().prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map([limit as i64], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn in_date_range(db: &Database, from: NaiveDate, to: NaiveDate) -> Result<Vec<Transaction>> {
        Self::filter(
            db,
            &TransactionFilter {
                date_from: Some(from),
                date_to: Some(to),
                ..TransactionFilter::default()
            },
        )
    }

    /// Inserts the transaction and applies its effect to the account balance.
    pub fn create(db: &Database, clock: &dyn Clock, txn: NewTransaction) -> Result<Transaction> {
        txn.validate()?;
        let now = clock.now();
        let id = db.with_transaction(|conn| {
            Self::ensure_references(conn, txn.account_id, txn.category_id)?;
            conn.execute(
                "INSERT INTO transactions (account_id, category_id, type, amount, description, notes,
                                           receipt_photo, date, is_recurring, recurring_id, tags,
                                           location, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                params![
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
                    now
                ],
            )?;
            let id = conn.last_insert_rowid();
            AccountService::adjust_balance(
                conn,
                txn.account_id,
                txn.kind.balance_effect(txn.amount),
                now,
            )?;
            Ok(id)
        })?;
        info!(id, amount = txn.amount, kind = %txn.kind, "created transaction");
        Self::get(db, id)
    }

    /// Reverses the old balance effect and applies the new one, possibly on
    /// a different account.
    pub fn update(
        db: &Database,
        clock: &dyn Clock,
        id: i64,
        changes: TransactionUpdate,
    ) -> Result<Transaction> {
        changes.validate()?;
        let now = clock.now();
        db.with_transaction(|conn| {
            let original =
                Self::find(conn, id)?.ok_or_else(|| TrackerError::not_found("Transaction", id))?;
            let mut updated = original.clone();
            changes.apply_to(&mut updated);
            Self::ensure_references(conn, updated.account_id, updated.category_id)?;
            conn.execute(
                "UPDATE transactions
                 SET account_id = ?2, category_id = ?3, type = ?4, amount = ?5, description = ?6,
                     notes = ?7, date = ?8, tags = ?9, updated_at = ?10
                 WHERE id = ?1",
                params![
                    id,
                    updated.account_id,
                    updated.category_id,
                    updated.kind,
                    updated.amount,
                    updated.description,
                    updated.notes,
                    updated.date,
                    serde_json::to_string(&updated.tags)?,
                    now
                ],
            )?;
            AccountService::adjust_balance(conn, original.account_id, -original.balance_effect(), now)?;
            AccountService::adjust_balance(conn, updated.account_id, updated.balance_effect(), now)?;
            Ok(())
        })?;
        debug!(id, "updated transaction");
        Self::get(db, id)
    }

    /// Reverses the balance effect and deletes the row. Returns `false` when
    /// no such transaction exists.
    pub fn delete(db: &Database, clock: &dyn Clock, id: i64) -> Result<bool> {
        let now = clock.now();
        let removed = db.with_transaction(|conn| {
            let Some(existing) = Self::find(conn, id)? else {
                return Ok(false);
            };
            AccountService::adjust_balance(conn, existing.account_id, -existing.balance_effect(), now)?;
            Ok(conn.execute("DELETE FROM transactions WHERE id = ?1", [id])? > 0)
        })?;
        if removed {
            info!(id, "deleted transaction");
        }
        Ok(removed)
    }

    pub(crate) fn find(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
        Ok(conn
            .query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                [id],
                Self::from_row,
            )
            .optional()?)
    }

    fn ensure_references(conn: &Connection, account_id: i64, category_id: i64) -> Result<()> {
        if AccountService::find(conn, account_id)?.is_none() {
            return Err(TrackerError::not_found("Account", account_id));
        }
        if CategoryService::find(conn, category_id)?.is_none() {
            return Err(TrackerError::not_found("Category", category_id));
        }
        Ok(())
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
        Ok(Transaction {
            id: row.get(0)?,
            account_id: row.get(1)?,
            category_id: row.get(2)?,
            kind: row.get(3)?,
            amount: row.get(4)?,
            description: row.get(5)?,
            notes: row.get(6)?,
            receipt_photo: row.get(7)?,
            date: row.get(8)?,
            is_recurring: row.get(9)?,
            recurring_id: row.get(10)?,
            tags: json_column(row, 11)?,
            location: optional_json_column(row, 12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{
        core::clock::FixedClock,
        domain::{AccountKind, CategoryKind, NewAccount, NewCategory, TransactionKind},
    };

    struct Fixture {
        db: Database,
        clock: FixedClock,
        account: i64,
        other_account: i64,
        category: i64,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock::on(date(2024, 5, 10));
        let account = AccountService::create(
            &db,
            &clock,
            NewAccount::new("Wallet", AccountKind::Cash).with_initial_balance(100.0),
        )
        .unwrap()
        .id;
        let other_account = AccountService::create(&db, &clock, NewAccount::new("Bank", AccountKind::Bank))
            .unwrap()
            .id;
        let category =
            CategoryService::create(&db, &clock, NewCategory::new("Food", CategoryKind::Expense))
                .unwrap()
                .id;
        Fixture {
            db,
            clock,
            account,
            other_account,
            category,
        }
    }

    fn balance(f: &Fixture, id: i64) -> f64 {
        AccountService::get(&f.db, id).unwrap().current_balance
    }

    #[test]
    fn create_update_delete_keep_balance_consistent() {
        let f = fixture();
        let txn = TransactionService::create(
            &f.db,
            &f.clock,
            NewTransaction::new(f.account, f.category, TransactionKind::Expense, 30.0, date(2024, 5, 9)),
        )
        .unwrap();
        assert_eq!(balance(&f, f.account), 70.0);

        TransactionService::update(
            &f.db,
            &f.clock,
            txn.id,
            TransactionUpdate {
                account_id: Some(f.other_account),
                kind: Some(TransactionKind::Income),
                amount: Some(12.5),
                ..TransactionUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(balance(&f, f.account), 100.0);
        assert_eq!(balance(&f, f.other_account), 12.5);

        assert!(TransactionService::delete(&f.db, &f.clock, txn.id).unwrap());
        assert_eq!(balance(&f, f.other_account), 0.0);
        assert!(!TransactionService::delete(&f.db, &f.clock, txn.id).unwrap());
    }

    #[test]
    fn transfers_leave_balance_untouched() {
        let f = fixture();
        TransactionService::create(
            &f.db,
            &f.clock,
            NewTransaction::new(f.account, f.category, TransactionKind::Transfer, 50.0, date(2024, 5, 9)),
        )
        .unwrap();
        assert_eq!(balance(&f, f.account), 100.0);
    }

    #[test]
    fn unknown_category_rolls_back() {
        let f = fixture();
        let err = TransactionService::create(
            &f.db,
            &f.clock,
            NewTransaction::new(f.account, 999, TransactionKind::Expense, 5.0, date(2024, 5, 9)),
        )
        .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { entity: "Category", .. }));
        assert!(TransactionService::list(&f.db).unwrap().is_empty());
        assert_eq!(balance(&f, f.account), 100.0);
    }

    #[test]
    fn ordering_and_filters() {
        let f = fixture();
        let mk = |amount: f64, day: u32| {
            f.clock.advance(Duration::minutes(1));
            TransactionService::create(
                &f.db,
                &f.clock,
                NewTransaction::new(f.account, f.category, TransactionKind::Expense, amount, date(2024, 5, day))
                    .with_description(format!("item {amount}")),
            )
            .unwrap()
        };
        let early = mk(10.0, 1);
        let late = mk(20.0, 8);
        let same_day = mk(30.0, 8);

        let all = TransactionService::list(&f.db).unwrap();
        let ids: Vec<i64> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![same_day.id, late.id, early.id]);

        let recent = TransactionService::recent(&f.db, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, same_day.id);

        let filtered = TransactionService::filter(
            &f.db,
            &TransactionFilter {
                amount_min: Some(15.0),
                date_to: Some(date(2024, 5, 8)),
                ..TransactionFilter::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.len(), 2);

        let ranged = TransactionService::in_date_range(&f.db, date(2024, 5, 1), date(2024, 5, 1)).unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].description.as_deref(), Some("item 10"));
    }
}
