use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::sql_token_enum;
use crate::{
    currency::MAX_AMOUNT,
    errors::{Result, TrackerError},
};

/// Where money is held.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Bank,
    Cash,
    CreditCard,
    Investment,
}

sql_token_enum!(AccountKind, "account type", {
    Bank => "bank",
    Cash => "cash",
    CreditCard => "credit_card",
    Investment => "investment",
});

impl AccountKind {
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Bank => "Bank",
            AccountKind::Cash => "Cash",
            AccountKind::CreditCard => "Credit Card",
            AccountKind::Investment => "Investment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub initial_balance: f64,
    pub current_balance: f64,
    pub currency: String,
    pub icon: String,
    pub color: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to open an account; the current balance starts at the
/// initial balance.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: f64,
    pub currency: String,
    pub icon: String,
    pub color: String,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            name: name.into(),
            kind,
            initial_balance: 0.0,
            currency: "USD".into(),
            icon: default_icon(kind).into(),
            color: "#2196F3".into(),
        }
    }

    pub fn with_initial_balance(mut self, amount: f64) -> Self {
        self.initial_balance = amount;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_initial_balance(self.initial_balance)
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub initial_balance: Option<f64>,
    pub currency: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

impl AccountUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(amount) = self.initial_balance {
            validate_initial_balance(amount)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TrackerError::validation("Please enter an account name"));
    }
    Ok(())
}

fn validate_initial_balance(amount: f64) -> Result<()> {
    if !amount.is_finite() || !(0.0..=MAX_AMOUNT).contains(&amount) {
        return Err(TrackerError::validation(
            "Please enter a valid initial balance",
        ));
    }
    Ok(())
}

fn default_icon(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::Bank => "credit-card",
        AccountKind::Cash => "dollar-sign",
        AccountKind::CreditCard => "credit-card",
        AccountKind::Investment => "trending-up",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tokens_round_trip() {
        assert_eq!("credit-card".parse::<AccountKind>().unwrap(), AccountKind::CreditCard);
        assert_eq!(AccountKind::Investment.to_string(), "investment");
        assert!("vault".parse::<AccountKind>().is_err());
    }

    #[test]
    fn new_account_validation() {
        assert!(NewAccount::new("Wallet", AccountKind::Cash).validate().is_ok());
        assert!(NewAccount::new("  ", AccountKind::Cash).validate().is_err());
        assert!(NewAccount::new("Wallet", AccountKind::Cash)
            .with_initial_balance(-5.0)
            .validate()
            .is_err());
    }
}
