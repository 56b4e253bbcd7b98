use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::common::{sql_token_enum, DateWindow};
use crate::errors::{Result, TrackerError};

pub const DEFAULT_ALERT_PERCENTAGE: u8 = 80;
pub const MIN_ALERT_PERCENTAGE: u8 = 10;
pub const MAX_ALERT_PERCENTAGE: u8 = 100;

/// Calendar granularity a budget resets on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

sql_token_enum!(BudgetPeriod, "budget period", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

/// What a budget's spending is measured against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetScope {
    Category,
    Account,
    General,
}

sql_token_enum!(BudgetScope, "budget type", {
    Category => "category",
    Account => "account",
    General => "general",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Good,
    Warning,
    Exceeded,
}

sql_token_enum!(BudgetStatus, "budget status", {
    Good => "good",
    Warning => "warning",
    Exceeded => "exceeded",
});

impl BudgetStatus {
    pub fn from_percentage(percentage: f64, alert_percentage: u8) -> Self {
        if percentage >= 100.0 {
            BudgetStatus::Exceeded
        } else if percentage >= f64::from(alert_percentage) {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Good
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Warning,
    Exceeded,
}

sql_token_enum!(AlertKind, "alert type", {
    Warning => "warning",
    Exceeded => "exceeded",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub spent_amount: f64,
    pub alert_percentage: u8,
    pub alert_triggered: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn scope(&self) -> BudgetScope {
        match (self.category_id, self.account_id) {
            (Some(_), _) => BudgetScope::Category,
            (None, Some(_)) => BudgetScope::Account,
            (None, None) => BudgetScope::General,
        }
    }

    /// Dates the budget is in effect; open-ended budgets run indefinitely.
    pub fn active_range(&self) -> DateWindow {
        DateWindow {
            start: self.start_date,
            end: self.end_date.unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            self.amount,
            self.alert_percentage,
            self.start_date,
            self.end_date,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub name: String,
    pub scope: BudgetScope,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub alert_percentage: u8,
}

impl NewBudget {
    pub fn general(
        name: impl Into<String>,
        amount: f64,
        period: BudgetPeriod,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            scope: BudgetScope::General,
            category_id: None,
            account_id: None,
            amount,
            period,
            start_date,
            end_date: None,
            alert_percentage: DEFAULT_ALERT_PERCENTAGE,
        }
    }

    /// Builds a budget bound to `target` according to `scope`.
    pub fn for_scope(
        name: impl Into<String>,
        scope: BudgetScope,
        target: Option<i64>,
        amount: f64,
        period: BudgetPeriod,
        start_date: NaiveDate,
    ) -> Self {
        let mut budget = Self::general(name, amount, period, start_date);
        budget.scope = scope;
        match scope {
            BudgetScope::Category => budget.category_id = target,
            BudgetScope::Account => budget.account_id = target,
            BudgetScope::General => {}
        }
        budget
    }

    pub fn with_alert_percentage(mut self, percentage: u8) -> Self {
        self.alert_percentage = percentage;
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            self.amount,
            self.alert_percentage,
            self.start_date,
            self.end_date,
        )?;
        match self.scope {
            BudgetScope::Category if self.category_id.is_none() => Err(
                TrackerError::validation("Category is required for category budgets"),
            ),
            BudgetScope::Account if self.account_id.is_none() => Err(
                TrackerError::validation("Account is required for account budgets"),
            ),
            _ => Ok(()),
        }
    }
}

/// Partial update. Nested options distinguish "leave as is" from "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub period: Option<BudgetPeriod>,
    pub category_id: Option<Option<i64>>,
    pub account_id: Option<Option<i64>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub alert_percentage: Option<u8>,
    pub is_active: Option<bool>,
}

impl BudgetUpdate {
    pub fn is_empty(&self) -> bool {
        *self == BudgetUpdate::default()
    }

    /// Applies the update and validates the merged result.
    pub fn apply_to(&self, budget: &mut Budget) -> Result<()> {
        if let Some(name) = &self.name {
            budget.name = name.clone();
        }
        if let Some(amount) = self.amount {
            budget.amount = amount;
        }
        if let Some(period) = self.period {
            budget.period = period;
        }
        if let Some(category_id) = self.category_id {
            budget.category_id = category_id;
        }
        if let Some(account_id) = self.account_id {
            budget.account_id = account_id;
        }
        if let Some(start_date) = self.start_date {
            budget.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            budget.end_date = end_date;
        }
        if let Some(percentage) = self.alert_percentage {
            budget.alert_percentage = percentage;
        }
        if let Some(is_active) = self.is_active {
            budget.is_active = is_active;
        }
        budget.validate()
    }

    /// Whether the change can move the budget's progress, so the stored
    /// `spent_amount` must be recomputed. The alert flag is left for the next
    /// alert check to clear.
    pub fn affects_progress(&self) -> bool {
        self.amount.is_some()
            || self.period.is_some()
            || self.category_id.is_some()
            || self.account_id.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.alert_percentage.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetFilter {
    pub is_active: Option<bool>,
    pub period: Option<BudgetPeriod>,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
}

impl BudgetFilter {
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }
}

/// Spending measured over the budget's current window.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetProgress {
    pub budget_id: i64,
    pub window: Option<DateWindow>,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    pub fn compute(budget: &Budget, window: Option<DateWindow>, spent: f64) -> Self {
        let percentage = if budget.amount > 0.0 {
            spent / budget.amount * 100.0
        } else {
            0.0
        };
        Self {
            budget_id: budget.id,
            window,
            spent,
            remaining: budget.amount - spent,
            percentage,
            status: BudgetStatus::from_percentage(percentage, budget.alert_percentage),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetWithDetails {
    pub budget: Budget,
    pub category_name: Option<String>,
    pub account_name: Option<String>,
    pub progress: BudgetProgress,
}

impl BudgetWithDetails {
    /// Human readable label of what the budget tracks.
    pub fn target_label(&self) -> String {
        match (&self.category_name, &self.account_name) {
            (Some(category), Some(account)) => format!("{category} / {account}"),
            (Some(category), None) => category.clone(),
            (None, Some(account)) => account.clone(),
            (None, None) => "All spending".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetAlert {
    pub id: i64,
    pub budget_id: i64,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub percentage: f64,
    pub amount: f64,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BudgetSummary {
    pub total_budgets: usize,
    pub total_amount: f64,
    pub total_spent: f64,
    pub total_remaining: f64,
    pub average_percentage: f64,
    pub good: usize,
    pub warning: usize,
    pub exceeded: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressSnapshot {
    pub budget_id: i64,
    pub date: NaiveDate,
    pub spent_amount: f64,
    pub percentage: f64,
}

fn validate_fields(
    name: &str,
    amount: f64,
    alert_percentage: u8,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<()> {
    if name.trim().chars().count() < 2 {
        return Err(TrackerError::validation(
            "Budget name must be at least 2 characters",
        ));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TrackerError::validation("Amount must be positive"));
    }
    if !(MIN_ALERT_PERCENTAGE..=MAX_ALERT_PERCENTAGE).contains(&alert_percentage) {
        return Err(TrackerError::validation(format!(
            "Alert percentage must be between {MIN_ALERT_PERCENTAGE} and {MAX_ALERT_PERCENTAGE}"
        )));
    }
    if let Some(end) = end_date {
        if end < start_date {
            return Err(TrackerError::validation(
                "End date must not precede the start date",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(BudgetStatus::from_percentage(79.9, 80), BudgetStatus::Good);
        assert_eq!(BudgetStatus::from_percentage(80.0, 80), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::from_percentage(100.0, 80), BudgetStatus::Exceeded);
        assert_eq!(BudgetStatus::from_percentage(100.0, 100), BudgetStatus::Exceeded);
    }

    #[test]
    fn scoped_budget_requires_target() {
        let start = date(2024, 1, 1);
        let missing =
            NewBudget::for_scope("Food", BudgetScope::Category, None, 100.0, BudgetPeriod::Monthly, start);
        assert!(missing.validate().is_err());

        let ok = NewBudget::for_scope(
            "Food",
            BudgetScope::Category,
            Some(3),
            100.0,
            BudgetPeriod::Monthly,
            start,
        );
        assert!(ok.validate().is_ok());
        assert_eq!(ok.category_id, Some(3));
    }

    #[test]
    fn rejects_bad_fields() {
        let start = date(2024, 1, 1);
        let base = NewBudget::general("Groceries", 100.0, BudgetPeriod::Weekly, start);
        assert!(NewBudget { name: "G".into(), ..base.clone() }.validate().is_err());
        assert!(NewBudget { amount: 0.0, ..base.clone() }.validate().is_err());
        assert!(base.clone().with_alert_percentage(5).validate().is_err());
        assert!(base.clone().with_end_date(date(2023, 12, 31)).validate().is_err());
        assert!(base.validate().is_ok());
    }

    #[test]
    fn zero_amount_progress_reports_zero_percent() {
        let now = Utc::now();
        let budget = Budget {
            id: 1,
            name: "Legacy".into(),
            category_id: None,
            account_id: None,
            amount: 0.0,
            period: BudgetPeriod::Monthly,
            start_date: date(2024, 1, 1),
            end_date: None,
            spent_amount: 0.0,
            alert_percentage: 80,
            alert_triggered: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let progress = BudgetProgress::compute(&budget, None, 25.0);
        assert_eq!(progress.percentage, 0.0);
        assert_eq!(progress.remaining, -25.0);
        assert_eq!(progress.status, BudgetStatus::Good);
    }
}
