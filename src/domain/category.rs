use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::sql_token_enum;
use crate::errors::{Result, TrackerError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Expense,
    Income,
}

sql_token_enum!(CategoryKind, "category type", {
    Expense => "expense",
    Income => "income",
});

/// Labels transactions for reporting and budget scoping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub kind: CategoryKind,
    pub is_default: bool,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            name: name.into(),
            icon: "tag".into(),
            color: "#78909C".into(),
            kind,
            is_default: false,
        }
    }

    pub fn with_style(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.icon = icon.into();
        self.color = color.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub kind: Option<CategoryKind>,
}

impl CategoryUpdate {
    pub fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(TrackerError::validation("Category name is required"))
    } else {
        Ok(())
    }
}
