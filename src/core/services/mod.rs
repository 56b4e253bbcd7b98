//! Stateless services over [`Database`](crate::storage::Database). Mutating
//! operations take a [`Clock`](crate::core::clock::Clock) for timestamps.

pub mod account_service;
pub mod analytics_service;
pub mod budget_service;
pub mod category_service;
pub mod export_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use analytics_service::{
    AnalyticsService, BudgetAnalysis, CategorySpending, MonthlyTrend,
};
pub use budget_service::BudgetService;
pub use category_service::CategoryService;
pub use export_service::{BackupDocument, ExportService, ImportSummary};
pub use transaction_service::TransactionService;

use rusqlite::{types::Type, Row};
use serde::de::DeserializeOwned;

/// Decodes a JSON TEXT column.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(crate) fn optional_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| {
        serde_json::from_str(&text).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
        })
    })
    .transpose()
}
