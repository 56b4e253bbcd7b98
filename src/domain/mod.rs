//! Plain data types shared by storage, services and the CLI.

pub mod account;
pub mod budget;
pub mod category;
pub mod common;
pub mod transaction;

pub use account::{Account, AccountKind, AccountUpdate, NewAccount};
pub use budget::{
    AlertKind, Budget, BudgetAlert, BudgetFilter, BudgetPeriod, BudgetProgress, BudgetScope,
    BudgetStatus, BudgetSummary, BudgetUpdate, BudgetWithDetails, NewBudget, ProgressSnapshot,
    DEFAULT_ALERT_PERCENTAGE, MAX_ALERT_PERCENTAGE, MIN_ALERT_PERCENTAGE,
};
pub use category::{Category, CategoryKind, CategoryUpdate, NewCategory};
pub use common::DateWindow;
pub use transaction::{
    Location, NewTransaction, Transaction, TransactionFilter, TransactionKind, TransactionUpdate,
};
