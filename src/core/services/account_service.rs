use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::{
    core::clock::Clock,
    domain::{Account, AccountUpdate, NewAccount},
    errors::{Result, TrackerError},
    storage::Database,
};

const ACCOUNT_COLUMNS: &str = "id, name, type, initial_balance, current_balance, currency, icon, color,
     is_active, created_at, updated_at";

pub struct AccountService;

impl AccountService {
    pub fn list(db: &Database) -> Result<Vec<Account>> {
        Self::query(db.conn(), "1 = 1")
    }

    pub fn list_active(db: &Database) -> Result<Vec<Account>> {
        Self::query(db.conn(), "is_active = 1")
    }

    pub fn get(db: &Database, id: i64) -> Result<Account> {
        Self::find(db.conn(), id)?.ok_or_else(|| TrackerError::not_found("Account", id))
    }

    pub fn create(db: &Database, clock: &dyn Clock, account: NewAccount) -> Result<Account> {
        account.validate()?;
        let now = clock.now();
        db.conn().execute(
            "INSERT INTO accounts (name, type, initial_balance, current_balance, currency, icon,
                                   color, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
            params![
                account.name.trim(),
                account.kind,
                account.initial_balance,
                account.currency,
                account.icon,
                account.color,
                now
            ],
        )?;
        let id = db.conn().last_insert_rowid();
        info!(id, name = %account.name, "created account");
        Self::get(db, id)
    }

    /// Changing the initial balance shifts the current balance by the same delta.
    pub fn update(
        db: &Database,
        clock: &dyn Clock,
        id: i64,
        changes: AccountUpdate,
    ) -> Result<Account> {
        changes.validate()?;
        let mut account = Self::get(db, id)?;
        if let Some(name) = changes.name {
            account.name = name.trim().to_string();
        }
        if let Some(kind) = changes.kind {
            account.kind = kind;
        }
        if let Some(initial) = changes.initial_balance {
            account.current_balance += initial - account.initial_balance;
            account.initial_balance = initial;
        }
        if let Some(currency) = changes.currency {
            account.currency = currency;
        }
        if let Some(icon) = changes.icon {
            account.icon = icon;
        }
        if let Some(color) = changes.color {
            account.color = color;
        }
        if let Some(is_active) = changes.is_active {
            account.is_active = is_active;
        }
        db.conn().execute(
            "UPDATE accounts
             SET name = ?2, type = ?3, initial_balance = ?4, current_balance = ?5, currency = ?6,
                 icon = ?7, color = ?8, is_active = ?9, updated_at = ?10
             WHERE id = ?1",
            params![
                id,
                account.name,
                account.kind,
                account.initial_balance,
                account.current_balance,
                account.currency,
                account.icon,
                account.color,
                account.is_active,
                clock.now()
            ],
        )?;
        Self::get(db, id)
    }

    /// Removes an account no transaction or budget refers to.
    pub fn delete(db: &Database, id: i64) -> Result<bool> {
        let references: i64 = db.conn().query_row(
            "SELECT (SELECT COUNT(*) FROM transactions WHERE account_id = ?1)
                  + (SELECT COUNT(*) FROM budgets WHERE account_id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        if references > 0 {
            return Err(TrackerError::Conflict(format!(
                "Account {id} is used by {references} transaction(s) or budget(s)"
            )));
        }
        let removed = db.conn().execute("DELETE FROM accounts WHERE id = ?1", [id])? > 0;
        if removed {
            info!(id, "deleted account");
        }
        Ok(removed)
    }

    pub fn set_balance(db: &Database, clock: &dyn Clock, id: i64, balance: f64) -> Result<Account> {
        if !balance.is_finite() {
            return Err(TrackerError::validation("Balance must be a finite number"));
        }
        let changed = db.conn().execute(
            "UPDATE accounts SET current_balance = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, balance, clock.now()],
        )?;
        if changed == 0 {
            return Err(TrackerError::not_found("Account", id));
        }
        Self::get(db, id)
    }

    /// Sum of current balances over active accounts.
    pub fn total_balance(db: &Database) -> Result<f64> {
        Ok(db.conn().query_row(
            "SELECT COALESCE(SUM(current_balance), 0) FROM accounts WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn find(conn: &Connection, id: i64) -> Result<Option<Account>> {
        Ok(conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                [id],
                Self::from_row,
            )
            .optional()?)
    }

    /// Adds `delta` to the current balance of `id` on `conn`.
    pub(crate) fn adjust_balance(
        conn: &Connection,
        id: i64,
        delta: f64,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        if delta == 0.0 {
            return Ok(());
        }
        let changed = conn.execute(
            "UPDATE accounts SET current_balance = current_balance + ?2, updated_at = ?3
             WHERE id = ?1",
            params![id, delta, now],
        )?;
        if changed == 0 {
            return Err(TrackerError::not_found("Account", id));
        }
        Ok(())
    }

    fn query(conn: &Connection, predicate: &str) -> Result<Vec<Account>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {predicate} ORDER BY id"
        ))?;
        let accounts = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
        Ok(Account {
            id: row.get(0)?,
            name: row.get(1)?,
            kind: row.get(2)?,
            initial_balance: row.get(3)?,
            current_balance: row.get(4)?,
            currency: row.get(5)?,
            icon: row.get(6)?,
            color: row.get(7)?,
            is_active: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{core::clock::FixedClock, domain::AccountKind};

    fn setup() -> (Database, FixedClock) {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        (db, clock)
    }

    #[test]
    fn create_starts_current_at_initial_balance() {
        let (db, clock) = setup();
        let account = AccountService::create(
            &db,
            &clock,
            NewAccount::new("Savings", AccountKind::Bank).with_initial_balance(250.0),
        )
        .unwrap();
        assert_eq!(account.current_balance, 250.0);
        assert!(account.is_active);
    }

    #[test]
    fn total_balance_ignores_inactive_accounts() {
        let (db, clock) = setup();
        let a = AccountService::create(
            &db,
            &clock,
            NewAccount::new("A", AccountKind::Cash).with_initial_balance(100.0),
        )
        .unwrap();
        AccountService::create(
            &db,
            &clock,
            NewAccount::new("B", AccountKind::Cash).with_initial_balance(40.0),
        )
        .unwrap();
        AccountService::update(
            &db,
            &clock,
            a.id,
            AccountUpdate {
                is_active: Some(false),
                ..AccountUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(AccountService::total_balance(&db).unwrap(), 40.0);
        assert_eq!(AccountService::list_active(&db).unwrap().len(), 1);
    }

    #[test]
    fn initial_balance_edit_shifts_current_balance() {
        let (db, clock) = setup();
        let account = AccountService::create(
            &db,
            &clock,
            NewAccount::new("Wallet", AccountKind::Cash).with_initial_balance(10.0),
        )
        .unwrap();
        AccountService::set_balance(&db, &clock, account.id, 4.0).unwrap();
        let updated = AccountService::update(
            &db,
            &clock,
            account.id,
            AccountUpdate {
                initial_balance: Some(20.0),
                ..AccountUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.current_balance, 14.0);
    }

    #[test]
    fn missing_account_is_not_found() {
        let (db, _) = setup();
        assert!(matches!(
            AccountService::get(&db, 42),
            Err(TrackerError::NotFound { entity: "Account", id: 42 })
        ));
        assert!(!AccountService::delete(&db, 42).unwrap());
    }
}
