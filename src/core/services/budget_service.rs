//! Budget bookkeeping: progress over the current calendar window, threshold
//! alerts and daily progress snapshots.

use chrono::{NaiveDate, Weekday};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{AccountService, CategoryService};
use crate::{
    core::{
        clock::Clock,
        notify::{AlertNotifier, BudgetNotice},
        period::calendar_window,
    },
    domain::{
        AlertKind, Budget, BudgetAlert, BudgetFilter, BudgetProgress, BudgetStatus,
        BudgetSummary, BudgetUpdate, BudgetWithDetails, DateWindow, NewBudget, ProgressSnapshot,
    },
    errors::{Result, TrackerError},
    storage::Database,
};

const BUDGET_COLUMNS: &str = "b.id, b.name, b.category_id, b.account_id, b.amount, b.period,
     b.start_date, b.end_date, b.spent_amount, b.alert_percentage, b.alert_triggered,
     b.is_active, b.created_at, b.updated_at";

const ALERT_COLUMNS: &str =
    "id, budget_id, alert_type, message, percentage, amount, is_read, created_at";

pub struct BudgetService;

impl BudgetService {
    pub fn create(db: &Database, clock: &dyn Clock, budget: NewBudget) -> Result<Budget> {
        budget.validate()?;
        Self::ensure_references(db.conn(), budget.category_id, budget.account_id)?;
        db.conn().execute(
            "INSERT INTO budgets (name, category_id, account_id, amount, period, start_date,
                                  end_date, spent_amount, alert_percentage, alert_triggered,
                                  is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, 0, 1, ?9, ?9)",
            params![
                budget.name.trim(),
                budget.category_id,
                budget.account_id,
                budget.amount,
                budget.period,
                budget.start_date,
                budget.end_date,
                budget.alert_percentage,
                clock.now()
            ],
        )?;
        let id = db.conn().last_insert_rowid();
        info!(id, name = %budget.name, period = %budget.period, "created budget");
        Self::record(db, id)
    }

    /// Budgets matching `filter` with their live progress, newest first.
    pub fn list(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        filter: &BudgetFilter,
    ) -> Result<Vec<BudgetWithDetails>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(is_active) = filter.is_active {
            clauses.push("b.is_active = ?");
            values.push(Value::Integer(i64::from(is_active)));
        }
        if let Some(period) = filter.period {
            clauses.push("b.period = ?");
            values.push(Value::Text(period.as_str().to_string()));
        }
        if let Some(category_id) = filter.category_id {
            clauses.push("b.category_id = ?");
            values.push(Value::Integer(category_id));
        }
        if let Some(account_id) = filter.account_id {
            clauses.push("b.account_id = ?");
            values.push(Value::Integer(account_id));
        }
        let predicate = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let rows = {
            let mut stmt = db.conn().prepare(&format!(
                "SELECT {BUDGET_COLUMNS}, c.name, a.name
                 FROM budgets b
                 LEFT JOIN categories c ON c.id = b.category_id
                 LEFT JOIN accounts a ON a.id = b.account_id
                 {predicate}
                 ORDER BY b.created_at DESC, b.id DESC"
            ))?;
            let rows = stmt
                .query_map(params_from_iter(values), Self::detailed_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        let today = clock.today();
        rows.into_iter()
            .map(|(budget, category_name, account_name)| {
                let progress = Self::progress_on(db.conn(), &budget, today, week_start)?;
                Ok(BudgetWithDetails {
                    budget,
                    category_name,
                    account_name,
                    progress,
                })
            })
            .collect()
    }

    pub fn list_active(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
    ) -> Result<Vec<BudgetWithDetails>> {
        Self::list(db, clock, week_start, &BudgetFilter::active())
    }

    /// Single budget with names and live progress.
    pub fn get(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        id: i64,
    ) -> Result<BudgetWithDetails> {
        let (budget, category_name, account_name) = db
            .conn()
            .query_row(
                &format!(
                    "SELECT {BUDGET_COLUMNS}, c.name, a.name
                     FROM budgets b
                     LEFT JOIN categories c ON c.id = b.category_id
                     LEFT JOIN accounts a ON a.id = b.account_id
                     WHERE b.id = ?1"
                ),
                [id],
                Self::detailed_row,
            )
            .optional()?
            .ok_or_else(|| TrackerError::not_found("Budget", id))?;
        let progress = Self::progress_on(db.conn(), &budget, clock.today(), week_start)?;
        Ok(BudgetWithDetails {
            budget,
            category_name,
            account_name,
            progress,
        })
    }

    /// The stored row without progress.
    pub fn record(db: &Database, id: i64) -> Result<Budget> {
        Self::find(db.conn(), id)?.ok_or_else(|| TrackerError::not_found("Budget", id))
    }

    /// Every stored budget row in id order, without progress.
    pub fn records(db: &Database) -> Result<Vec<Budget>> {
        let mut stmt = db
            .conn()
            .prepare(&format!("SELECT {BUDGET_COLUMNS} FROM budgets b ORDER BY b.id"))?;
        let budgets = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(budgets)
    }

    pub fn update(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        id: i64,
        changes: BudgetUpdate,
    ) -> Result<Budget> {
        let mut budget = Self::record(db, id)?;
        changes.apply_to(&mut budget)?;
        Self::ensure_references(db.conn(), budget.category_id, budget.account_id)?;
        db.conn().execute(
            "UPDATE budgets
             SET name = ?2, category_id = ?3, account_id = ?4, amount = ?5, period = ?6,
                 start_date = ?7, end_date = ?8, alert_percentage = ?9, is_active = ?10,
                 updated_at = ?11
             WHERE id = ?1",
            params![
                id,
                budget.name.trim(),
                budget.category_id,
                budget.account_id,
                budget.amount,
                budget.period,
                budget.start_date,
                budget.end_date,
                budget.alert_percentage,
                budget.is_active,
                clock.now()
            ],
        )?;
        if changes.affects_progress() {
            Self::progress_on(db.conn(), &budget, clock.today(), week_start)?;
        }
        debug!(id, "updated budget");
        Self::record(db, id)
    }

    /// Deletes the budget together with its alerts and snapshots.
    pub fn delete(db: &Database, id: i64) -> Result<bool> {
        let removed = db.conn().execute("DELETE FROM budgets WHERE id = ?1", [id])? > 0;
        if removed {
            info!(id, "deleted budget");
        }
        Ok(removed)
    }

    /// Calendar window of the budget's period containing `today`, clipped to
    /// the budget's own date range. `None` when the budget is not in effect.
    pub fn period_window(budget: &Budget, today: NaiveDate, week_start: Weekday) -> Option<DateWindow> {
        let range = budget.active_range();
        if !range.contains(today) {
            return None;
        }
        calendar_window(budget.period, today, week_start).intersect(&range)
    }

    /// Measures spending for the current window and stores it as the
    /// budget's `spent_amount`.
    pub fn calculate_progress(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        budget: &Budget,
    ) -> Result<BudgetProgress> {
        Self::progress_on(db.conn(), budget, clock.today(), week_start)
    }

    /// Evaluates every active budget against its alert threshold.
    ///
    /// A budget crossing the threshold yields one stored alert and one notice
    /// until spending drops back under it. Returns the alerts created by this
    /// call.
    pub fn check_alerts(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        notifier: &dyn AlertNotifier,
    ) -> Result<Vec<BudgetAlert>> {
        let today = clock.today();
        let now = clock.now();
        let active = Self::list_active(db, clock, week_start)?;
        let mut created = Vec::new();
        let mut notices = Vec::new();

        db.with_transaction(|conn| {
            for entry in &active {
                let budget = &entry.budget;
                let progress = &entry.progress;
                if progress.window.is_some() {
                    conn.execute(
                        "INSERT INTO budget_progress (budget_id, date, spent_amount, percentage, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)
                         ON CONFLICT (budget_id, date)
                         DO UPDATE SET spent_amount = excluded.spent_amount,
                                       percentage = excluded.percentage",
                        params![budget.id, today, progress.spent, progress.percentage, now],
                    )?;
                }

                let threshold = f64::from(budget.alert_percentage);
                if progress.percentage >= threshold && !budget.alert_triggered {
                    let kind = if progress.percentage >= 100.0 {
                        AlertKind::Exceeded
                    } else {
                        AlertKind::Warning
                    };
                    let message = alert_message(budget, progress, kind);
                    conn.execute(
                        "INSERT INTO budget_alerts (budget_id, alert_type, message, percentage,
                                                    amount, is_read, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                        params![budget.id, kind, message, progress.percentage, progress.spent, now],
                    )?;
                    created.push(BudgetAlert {
                        id: conn.last_insert_rowid(),
                        budget_id: budget.id,
                        kind,
                        message,
                        percentage: progress.percentage,
                        amount: progress.spent,
                        is_read: false,
                        created_at: now,
                    });
                    conn.execute(
                        "UPDATE budgets SET alert_triggered = 1 WHERE id = ?1",
                        [budget.id],
                    )?;
                    notices.push(BudgetNotice::new(budget, progress, kind));
                } else if progress.percentage < threshold && budget.alert_triggered {
                    conn.execute(
                        "UPDATE budgets SET alert_triggered = 0 WHERE id = ?1",
                        [budget.id],
                    )?;
                    debug!(id = budget.id, "budget back under alert threshold");
                }
            }
            Ok(())
        })?;

        for notice in &notices {
            info!(budget = notice.budget_id, kind = %notice.kind, "budget alert raised");
            notifier.notify(notice);
        }
        Ok(created)
    }

    /// Alerts, newest first, optionally filtered by read state.
    pub fn alerts(db: &Database, is_read: Option<bool>) -> Result<Vec<BudgetAlert>> {
        let (predicate, values) = match is_read {
            Some(flag) => ("WHERE is_read = ?1", vec![Value::Integer(i64::from(flag))]),
            None => ("", Vec::new()),
        };
        let mut stmt = db.conn().prepare(&format!(
            "SELECT {ALERT_COLUMNS} FROM budget_alerts {predicate}
             ORDER BY created_at DESC, id DESC"
        ))?;
        let alerts = stmt
            .query_map(params_from_iter(values), Self::alert_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    pub fn mark_alert_read(db: &Database, id: i64) -> Result<bool> {
        Ok(db
            .conn()
            .execute("UPDATE budget_alerts SET is_read = 1 WHERE id = ?1", [id])?
            > 0)
    }

    /// Returns how many alerts changed state.
    pub fn mark_all_read(db: &Database) -> Result<usize> {
        Ok(db
            .conn()
            .execute("UPDATE budget_alerts SET is_read = 1 WHERE is_read = 0", [])?)
    }

    pub fn unread_count(db: &Database) -> Result<usize> {
        let count: i64 = db.conn().query_row(
            "SELECT COUNT(*) FROM budget_alerts WHERE is_read = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Aggregate over active budgets. The average is weighted by amount.
    pub fn summary(db: &Database, clock: &dyn Clock, week_start: Weekday) -> Result<BudgetSummary> {
        let active = Self::list_active(db, clock, week_start)?;
        let mut summary = BudgetSummary {
            total_budgets: active.len(),
            ..BudgetSummary::default()
        };
        for entry in &active {
            summary.total_amount += entry.budget.amount;
            summary.total_spent += entry.progress.spent;
            match entry.progress.status {
                BudgetStatus::Good => summary.good += 1,
                BudgetStatus::Warning => summary.warning += 1,
                BudgetStatus::Exceeded => summary.exceeded += 1,
            }
        }
        summary.total_remaining = summary.total_amount - summary.total_spent;
        summary.average_percentage = if summary.total_amount > 0.0 {
            summary.total_spent / summary.total_amount * 100.0
        } else {
            0.0
        };
        Ok(summary)
    }

    /// Daily progress snapshots for a budget, oldest first.
    pub fn history(db: &Database, budget_id: i64) -> Result<Vec<ProgressSnapshot>> {
        Self::record(db, budget_id)?;
        let mut stmt = db.conn().prepare(
            "SELECT budget_id, date, spent_amount, percentage FROM budget_progress
             WHERE budget_id = ?1 ORDER BY date",
        )?;
        let snapshots = stmt
            .query_map([budget_id], |row| {
                Ok(ProgressSnapshot {
                    budget_id: row.get(0)?,
                    date: row.get(1)?,
                    spent_amount: row.get(2)?,
                    percentage: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    fn progress_on(
        conn: &Connection,
        budget: &Budget,
        today: NaiveDate,
        week_start: Weekday,
    ) -> Result<BudgetProgress> {
        let window = Self::period_window(budget, today, week_start);
        let spent = match window {
            Some(window) => conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM transactions
                 WHERE type = 'expense' AND date >= ?1 AND date <= ?2
                   AND (?3 IS NULL OR category_id = ?3)
                   AND (?4 IS NULL OR account_id = ?4)",
                params![window.start, window.end, budget.category_id, budget.account_id],
                |row| row.get::<_, f64>(0),
            )?,
            None => 0.0,
        };
        conn.execute(
            "UPDATE budgets SET spent_amount = ?2 WHERE id = ?1",
            params![budget.id, spent],
        )?;
        Ok(BudgetProgress::compute(budget, window, spent))
    }

    pub(crate) fn find(conn: &Connection, id: i64) -> Result<Option<Budget>> {
        Ok(conn
            .query_row(
                &format!("SELECT {BUDGET_COLUMNS} FROM budgets b WHERE b.id = ?1"),
                [id],
                Self::from_row,
            )
            .optional()?)
    }

    fn ensure_references(
        conn: &Connection,
        category_id: Option<i64>,
        account_id: Option<i64>,
    ) -> Result<()> {
        if let Some(id) = category_id {
            if CategoryService::find(conn, id)?.is_none() {
                return Err(TrackerError::not_found("Category", id));
            }
        }
        if let Some(id) = account_id {
            if AccountService::find(conn, id)?.is_none() {
                return Err(TrackerError::not_found("Account", id));
            }
        }
        Ok(())
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
        Ok(Budget {
            id: row.get(0)?,
            name: row.get(1)?,
            category_id: row.get(2)?,
            account_id: row.get(3)?,
            amount: row.get(4)?,
            period: row.get(5)?,
            start_date: row.get(6)?,
            end_date: row.get(7)?,
            spent_amount: row.get(8)?,
            alert_percentage: row.get(9)?,
            alert_triggered: row.get(10)?,
            is_active: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn detailed_row(row: &Row<'_>) -> rusqlite::Result<(Budget, Option<String>, Option<String>)> {
        Ok((Self::from_row(row)?, row.get(14)?, row.get(15)?))
    }

    pub(crate) fn alert_row(row: &Row<'_>) -> rusqlite::Result<BudgetAlert> {
        Ok(BudgetAlert {
            id: row.get(0)?,
            budget_id: row.get(1)?,
            kind: row.get(2)?,
            message: row.get(3)?,
            percentage: row.get(4)?,
            amount: row.get(5)?,
            is_read: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

fn alert_message(budget: &Budget, progress: &BudgetProgress, kind: AlertKind) -> String {
    match kind {
        AlertKind::Exceeded => format!(
            "Budget \"{}\" has been exceeded by ${:.2}",
            budget.name,
            progress.spent - budget.amount
        ),
        AlertKind::Warning => format!(
            "Budget \"{}\" is {:.1}% spent",
            budget.name, progress.percentage
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{clock::FixedClock, notify::RecordingNotifier},
        domain::{BudgetPeriod, BudgetScope},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn budget(period: BudgetPeriod, start: NaiveDate, end: Option<NaiveDate>) -> Budget {
        let now = chrono::Utc::now();
        Budget {
            id: 1,
            name: "Test".into(),
            category_id: None,
            account_id: None,
            amount: 100.0,
            period,
            start_date: start,
            end_date: end,
            spent_amount: 0.0,
            alert_percentage: 80,
            alert_triggered: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn window_is_clipped_to_budget_range() {
        let b = budget(BudgetPeriod::Monthly, date(2024, 3, 10), Some(date(2024, 3, 20)));
        let window = BudgetService::period_window(&b, date(2024, 3, 15), Weekday::Sun).unwrap();
        assert_eq!(window.start, date(2024, 3, 10));
        assert_eq!(window.end, date(2024, 3, 20));
    }

    #[test]
    fn no_window_outside_budget_range() {
        let b = budget(BudgetPeriod::Weekly, date(2024, 3, 10), Some(date(2024, 3, 20)));
        assert!(BudgetService::period_window(&b, date(2024, 3, 9), Weekday::Sun).is_none());
        assert!(BudgetService::period_window(&b, date(2024, 3, 21), Weekday::Sun).is_none());
    }

    #[test]
    fn weekly_window_uses_week_start() {
        let b = budget(BudgetPeriod::Weekly, date(2024, 1, 1), None);
        // 2024-05-15 is a Wednesday.
        let window = BudgetService::period_window(&b, date(2024, 5, 15), Weekday::Mon).unwrap();
        assert_eq!(window.start, date(2024, 5, 13));
        assert_eq!(window.end, date(2024, 5, 19));
    }

    #[test]
    fn creating_with_unknown_category_fails() {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock::on(date(2024, 5, 1));
        let err = BudgetService::create(
            &db,
            &clock,
            NewBudget::for_scope(
                "Dining",
                BudgetScope::Category,
                Some(77),
                50.0,
                BudgetPeriod::Monthly,
                date(2024, 5, 1),
            ),
        )
        .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { entity: "Category", id: 77 }));
    }

    #[test]
    fn budget_without_spending_raises_nothing() {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock::on(date(2024, 5, 1));
        let created = BudgetService::create(
            &db,
            &clock,
            NewBudget::general("Everything", 500.0, BudgetPeriod::Monthly, date(2024, 5, 1)),
        )
        .unwrap();
        let notifier = RecordingNotifier::new();
        let alerts = BudgetService::check_alerts(&db, &clock, Weekday::Sun, &notifier).unwrap();
        assert!(alerts.is_empty());
        assert!(notifier.notices().is_empty());

        let history = BudgetService::history(&db, created.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].spent_amount, 0.0);
    }
}
