mod common;

use chrono::Weekday;
use common::{date, Fixture};
use expense_tracker::{
    core::services::{AccountService, BudgetService, ExportService, TransactionService},
    domain::{BudgetPeriod, BudgetScope, NewBudget},
    storage::DATA_TABLES,
    TrackerError,
};
use tempfile::tempdir;

fn populated() -> Fixture {
    let fx = Fixture::on(date(2024, 6, 10));
    fx.income(3_000.0, date(2024, 6, 1));
    fx.expense(45.25, date(2024, 6, 3));
    BudgetService::create(
        &fx.db,
        &fx.clock,
        NewBudget::for_scope(
            "Food",
            BudgetScope::Category,
            Some(fx.groceries),
            400.0,
            BudgetPeriod::Monthly,
            date(2024, 6, 1),
        ),
    )
    .unwrap();
    fx
}

#[test]
fn json_backup_restores_into_an_empty_database() {
    let source = populated();
    let dir = tempdir().unwrap();
    let path = ExportService::export_json(&source.db, &source.clock, dir.path()).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("expense_tracker_backup_"));

    let target = Fixture::on(date(2024, 6, 10));
    target.expense(1.0, date(2024, 6, 9));
    let summary = ExportService::import_json(&target.db, &path).unwrap();
    assert_eq!(summary.transactions, 2);
    assert_eq!(summary.budgets, 1);
    assert_eq!(summary.accounts, 1);
    assert_eq!(summary.categories, 2);

    let restored = TransactionService::list(&target.db).unwrap();
    assert_eq!(restored, TransactionService::list(&source.db).unwrap());
    assert_eq!(
        AccountService::get(&target.db, source.account).unwrap().current_balance,
        source.balance()
    );
    let budgets = BudgetService::list_active(&target.db, &target.clock, Weekday::Sun).unwrap();
    assert_eq!(budgets[0].progress.spent, 45.25);
}

#[test]
fn invalid_backup_changes_nothing() {
    let source = populated();
    let mut document = ExportService::snapshot(&source.db, &source.clock).unwrap();
    document.categories.clear();

    let target = Fixture::on(date(2024, 6, 10));
    target.expense(5.0, date(2024, 6, 9));
    let err = ExportService::restore(&target.db, &document).unwrap_err();
    assert!(matches!(err, TrackerError::Validation(_)));
    assert_eq!(TransactionService::list(&target.db).unwrap().len(), 1);
}

#[test]
fn csv_export_names_categories_and_accounts() {
    let fx = populated();
    let dir = tempdir().unwrap();
    let path = ExportService::export_csv(&fx.db, &fx.clock, dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "transactions_2024-06-10.csv");

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(
        headers,
        ["Date", "Amount", "Type", "Category", "Account", "Description", "Notes"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "2024-06-03");
    assert_eq!(&rows[0][1], "45.25");
    assert_eq!(&rows[0][3], "Groceries");
    assert_eq!(&rows[0][4], "Checking");
}

#[test]
fn clear_all_empties_every_table() {
    let fx = populated();
    ExportService::clear_all(&fx.db).unwrap();
    for table in DATA_TABLES {
        assert_eq!(fx.db.row_count(table).unwrap(), 0, "{table} not cleared");
    }
}
