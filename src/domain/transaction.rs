use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::common::sql_token_enum;
use crate::{
    currency::validate_amount,
    errors::{Result, TrackerError},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
}

sql_token_enum!(TransactionKind, "transaction type", {
    Expense => "expense",
    Income => "income",
    Transfer => "transfer",
});

impl TransactionKind {
    /// Signed change applied to the owning account's balance.
    pub fn balance_effect(&self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
            TransactionKind::Transfer => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub category_id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub receipt_photo: Option<String>,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurring_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn balance_effect(&self) -> f64 {
        self.kind.balance_effect(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: i64,
    pub kind: TransactionKind,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub receipt_photo: Option<String>,
    pub is_recurring: bool,
    pub recurring_id: Option<i64>,
    pub tags: Vec<String>,
    pub location: Option<Location>,
}

impl NewTransaction {
    pub fn new(
        account_id: i64,
        category_id: i64,
        kind: TransactionKind,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            category_id,
            kind,
            amount,
            date,
            description: None,
            notes: None,
            receipt_photo: None,
            is_recurring: false,
            recurring_id: None,
            tags: Vec::new(),
            location: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_transaction_amount(self.amount)
    }
}

/// Partial update; nested options clear the column when set to `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub description: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<()> {
        match self.amount {
            Some(amount) => validate_transaction_amount(amount),
            None => Ok(()),
        }
    }

    pub fn apply_to(&self, target: &mut Transaction) {
        if let Some(account_id) = self.account_id {
            target.account_id = account_id;
        }
        if let Some(category_id) = self.category_id {
            target.category_id = category_id;
        }
        if let Some(kind) = self.kind {
            target.kind = kind;
        }
        if let Some(amount) = self.amount {
            target.amount = amount;
        }
        if let Some(date) = self.date {
            target.date = date;
        }
        if let Some(description) = &self.description {
            target.description = description.clone();
        }
        if let Some(notes) = &self.notes {
            target.notes = notes.clone();
        }
        if let Some(tags) = &self.tags {
            target.tags = tags.clone();
        }
    }
}

/// Conjunctive filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
}

fn validate_transaction_amount(amount: f64) -> Result<()> {
    if validate_amount(amount) {
        Ok(())
    } else {
        Err(TrackerError::validation("Please enter a valid amount"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_effect_by_kind() {
        assert_eq!(TransactionKind::Income.balance_effect(10.0), 10.0);
        assert_eq!(TransactionKind::Expense.balance_effect(10.0), -10.0);
        assert_eq!(TransactionKind::Transfer.balance_effect(10.0), 0.0);
    }

    #[test]
    fn update_clears_optional_text() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let now = Utc::now();
        let mut txn = Transaction {
            id: 1,
            account_id: 1,
            category_id: 1,
            kind: TransactionKind::Expense,
            amount: 5.0,
            description: Some("Coffee".into()),
            notes: Some("oat milk".into()),
            receipt_photo: None,
            date,
            is_recurring: false,
            recurring_id: None,
            tags: vec![],
            location: None,
            created_at: now,
            updated_at: now,
        };
        let update = TransactionUpdate {
            amount: Some(6.5),
            notes: Some(None),
            ..TransactionUpdate::default()
        };
        update.apply_to(&mut txn);
        assert_eq!(txn.amount, 6.5);
        assert_eq!(txn.description.as_deref(), Some("Coffee"));
        assert!(txn.notes.is_none());
    }

    #[test]
    fn rejects_out_of_range_amounts() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let txn = NewTransaction::new(1, 1, TransactionKind::Expense, 0.0, date);
        assert!(txn.validate().is_err());
        let txn = NewTransaction::new(1, 1, TransactionKind::Expense, 1_000_000.0, date);
        assert!(txn.validate().is_err());
    }
}
