mod common;

use chrono::Weekday;
use common::{date, Fixture};
use expense_tracker::{
    core::{period::TimePeriod, services::{AnalyticsService, BudgetService, CategoryService}},
    domain::{BudgetPeriod, BudgetStatus, CategoryKind, NewBudget, NewCategory, TransactionKind},
};

const WEEK: Weekday = Weekday::Sun;

#[test]
fn spending_by_category_is_sorted_with_shares() {
    let fx = Fixture::on(date(2024, 3, 20));
    let rent = CategoryService::create(&fx.db, &fx.clock, NewCategory::new("Rent", CategoryKind::Expense))
        .unwrap()
        .id;
    fx.expense(100.0, date(2024, 3, 2));
    fx.record(rent, TransactionKind::Expense, 300.0, date(2024, 3, 1));
    fx.expense(999.0, date(2024, 2, 28));
    fx.income(2_000.0, date(2024, 3, 1));

    let rows = AnalyticsService::spending_by_category(&fx.db, &fx.clock, WEEK, TimePeriod::Month).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category_name, "Rent");
    assert_eq!(rows[0].percentage, 75.0);
    assert_eq!(rows[1].amount, 100.0);

    let top = AnalyticsService::top_expense_categories(&fx.db, &fx.clock, WEEK, TimePeriod::Month, 1)
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].category_id, rent);

    let quarter =
        AnalyticsService::spending_by_category(&fx.db, &fx.clock, WEEK, TimePeriod::Quarter).unwrap();
    assert_eq!(quarter[0].category_name, "Groceries");
    assert_eq!(quarter[0].amount, 1_099.0);
}

#[test]
fn monthly_trends_end_with_the_current_month() {
    let fx = Fixture::on(date(2024, 3, 20));
    fx.income(1_000.0, date(2024, 1, 5));
    fx.expense(250.0, date(2024, 1, 9));
    fx.expense(80.0, date(2024, 3, 1));

    let trends = AnalyticsService::monthly_trends(&fx.db, &fx.clock, 3).unwrap();
    let labels: Vec<&str> = trends.iter().map(|trend| trend.label.as_str()).collect();
    assert_eq!(labels, ["Jan 2024", "Feb 2024", "Mar 2024"]);
    assert_eq!(trends[0].net, 750.0);
    assert_eq!(trends[1].income, 0.0);
    assert_eq!(trends[2].expense, 80.0);
}

#[test]
fn totals_and_budget_analysis() {
    let fx = Fixture::on(date(2024, 3, 20));
    fx.income(1_500.0, date(2024, 3, 1));
    fx.expense(600.0, date(2024, 3, 4));
    let budget = BudgetService::create(
        &fx.db,
        &fx.clock,
        NewBudget::general("All", 500.0, BudgetPeriod::Monthly, date(2024, 1, 1)),
    )
    .unwrap();

    let month = TimePeriod::Month;
    assert_eq!(AnalyticsService::total_income(&fx.db, &fx.clock, WEEK, month).unwrap(), 1_500.0);
    assert_eq!(AnalyticsService::total_spending(&fx.db, &fx.clock, WEEK, month).unwrap(), 600.0);
    assert_eq!(AnalyticsService::net_income(&fx.db, &fx.clock, WEEK, month).unwrap(), 900.0);

    let analysis = AnalyticsService::budget_analysis(&fx.db, &fx.clock, WEEK, month).unwrap();
    assert_eq!(analysis.len(), 1);
    assert_eq!(analysis[0].budget_id, budget.id);
    assert_eq!(analysis[0].target, "All spending");
    assert_eq!(analysis[0].percentage, 120.0);
    assert_eq!(analysis[0].status, BudgetStatus::Exceeded);
}
