use chrono::{NaiveDate, Weekday};
use rusqlite::params;
use serde::Serialize;

use crate::{
    core::{
        clock::Clock,
        period::{month_window, months_before, TimePeriod},
    },
    domain::{BudgetStatus, DateWindow, TransactionKind},
    errors::Result,
    storage::Database,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySpending {
    pub category_id: i64,
    pub category_name: String,
    pub color: String,
    pub amount: f64,
    /// Share of total spending in the period.
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyTrend {
    /// `Mon YYYY`, e.g. `Mar 2024`.
    pub label: String,
    pub month_start: NaiveDate,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetAnalysis {
    pub budget_id: i64,
    pub budget_name: String,
    pub target: String,
    pub budget_amount: f64,
    pub spent_amount: f64,
    pub remaining_amount: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

/// Read-only reports over transactions and budgets.
pub struct AnalyticsService;

impl AnalyticsService {
    /// Expense totals per category, largest first.
    pub fn spending_by_category(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        period: TimePeriod,
    ) -> Result<Vec<CategorySpending>> {
        let window = period.window(clock.today(), week_start);
        let mut stmt = db.conn().prepare(
            "SELECT c.id, c.name, c.color, SUM(t.amount) AS total
             FROM transactions t
             JOIN categories c ON c.id = t.category_id
             WHERE t.type = 'expense' AND t.date >= ?1 AND t.date <= ?2
             GROUP BY c.id, c.name, c.color
             ORDER BY total DESC, c.name",
        )?;
        let rows = stmt
            .query_map(params![window.start, window.end], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let total: f64 = rows.iter().map(|(_, _, _, amount)| amount).sum();
        Ok(rows
            .into_iter()
            .map(|(category_id, category_name, color, amount)| CategorySpending {
                category_id,
                category_name,
                color,
                amount,
                percentage: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
            })
            .collect())
    }

    pub fn top_expense_categories(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        period: TimePeriod,
        limit: usize,
    ) -> Result<Vec<CategorySpending>> {
        let mut spending = Self::spending_by_category(db, clock, week_start, period)?;
        spending.truncate(limit);
        Ok(spending)
    }

    /// Income and expense per calendar month, oldest first, ending with the
    /// current month.
    pub fn monthly_trends(db: &Database, clock: &dyn Clock, months_back: u32) -> Result<Vec<MonthlyTrend>> {
        let today = clock.today();
        (0..months_back)
            .rev()
            .map(|offset| {
                let month = month_window(months_before(today, offset));
                let income = Self::sum_kind(db, TransactionKind::Income, &month)?;
                let expense = Self::sum_kind(db, TransactionKind::Expense, &month)?;
                Ok(MonthlyTrend {
                    label: month.start.format("%b %Y").to_string(),
                    month_start: month.start,
                    income,
                    expense,
                    net: income - expense,
                })
            })
            .collect()
    }

    /// Active budgets measured over `period` instead of their own window,
    /// highest utilisation first.
    pub fn budget_analysis(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        period: TimePeriod,
    ) -> Result<Vec<BudgetAnalysis>> {
        let window = period.window(clock.today(), week_start);
        let mut stmt = db.conn().prepare(
            "SELECT b.id, b.name, b.amount, b.alert_percentage, c.name, a.name,
                    (SELECT COALESCE(SUM(t.amount), 0) FROM transactions t
                     WHERE t.type = 'expense' AND t.date >= ?1 AND t.date <= ?2
                       AND (b.category_id IS NULL OR t.category_id = b.category_id)
                       AND (b.account_id IS NULL OR t.account_id = b.account_id))
             FROM budgets b
             LEFT JOIN categories c ON c.id = b.category_id
             LEFT JOIN accounts a ON a.id = b.account_id
             WHERE b.is_active = 1",
        )?;
        let mut analysis = stmt
            .query_map(params![window.start, window.end], |row| {
                let amount: f64 = row.get(2)?;
                let alert_percentage: u8 = row.get(3)?;
                let category: Option<String> = row.get(4)?;
                let account: Option<String> = row.get(5)?;
                let spent: f64 = row.get(6)?;
                let percentage = if amount > 0.0 { spent / amount * 100.0 } else { 0.0 };
                Ok(BudgetAnalysis {
                    budget_id: row.get(0)?,
                    budget_name: row.get(1)?,
                    target: category.or(account).unwrap_or_else(|| "All spending".into()),
                    budget_amount: amount,
                    spent_amount: spent,
                    remaining_amount: amount - spent,
                    percentage,
                    status: BudgetStatus::from_percentage(percentage, alert_percentage),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        analysis.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        Ok(analysis)
    }

    pub fn total_spending(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        period: TimePeriod,
    ) -> Result<f64> {
        Self::sum_kind(db, TransactionKind::Expense, &period.window(clock.today(), week_start))
    }

    pub fn total_income(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        period: TimePeriod,
    ) -> Result<f64> {
        Self::sum_kind(db, TransactionKind::Income, &period.window(clock.today(), week_start))
    }

    pub fn net_income(
        db: &Database,
        clock: &dyn Clock,
        week_start: Weekday,
        period: TimePeriod,
    ) -> Result<f64> {
        Ok(Self::total_income(db, clock, week_start, period)?
            - Self::total_spending(db, clock, week_start, period)?)
    }

    fn sum_kind(db: &Database, kind: TransactionKind, window: &DateWindow) -> Result<f64> {
        Ok(db.conn().query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions
             WHERE type = ?1 AND date >= ?2 AND date <= ?3",
            params![kind, window.start, window.end],
            |row| row.get(0),
        )?)
    }
}
