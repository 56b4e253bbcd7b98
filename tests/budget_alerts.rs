mod common;

use chrono::Weekday;
use common::{date, Fixture};
use expense_tracker::{
    core::{notify::RecordingNotifier, services::BudgetService},
    domain::{AlertKind, BudgetPeriod, BudgetScope, BudgetStatus, BudgetUpdate, NewBudget},
};

const SUNDAY: Weekday = Weekday::Sun;

fn groceries_budget(fx: &Fixture, amount: f64) -> i64 {
    BudgetService::create(
        &fx.db,
        &fx.clock,
        NewBudget::for_scope(
            "Groceries",
            BudgetScope::Category,
            Some(fx.groceries),
            amount,
            BudgetPeriod::Monthly,
            date(2024, 3, 1),
        ),
    )
    .unwrap()
    .id
}

#[test]
fn crossing_the_threshold_alerts_once() {
    let fx = Fixture::on(date(2024, 3, 15));
    let budget = groceries_budget(&fx, 200.0);
    let notifier = RecordingNotifier::new();

    fx.expense(100.0, date(2024, 3, 3));
    assert!(BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier)
        .unwrap()
        .is_empty());

    fx.expense(70.0, date(2024, 3, 10));
    let created = BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].kind, AlertKind::Warning);
    assert_eq!(created[0].budget_id, budget);
    assert!((created[0].percentage - 85.0).abs() < 1e-9);

    // Still above the threshold: no duplicate, even after exceeding.
    fx.expense(50.0, date(2024, 3, 12));
    assert!(BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier)
        .unwrap()
        .is_empty());
    assert_eq!(notifier.notices().len(), 1);
    assert_eq!(BudgetService::unread_count(&fx.db).unwrap(), 1);
}

#[test]
fn jumping_straight_past_the_limit_raises_exceeded() {
    let fx = Fixture::on(date(2024, 3, 15));
    groceries_budget(&fx, 100.0);
    fx.expense(130.0, date(2024, 3, 14));

    let notifier = RecordingNotifier::new();
    let created = BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].kind, AlertKind::Exceeded);
    assert_eq!(notifier.notices()[0].title(), "Budget Exceeded!");
}

#[test]
fn new_period_rearms_the_alert() {
    let fx = Fixture::on(date(2024, 3, 30));
    let budget = groceries_budget(&fx, 100.0);
    let notifier = RecordingNotifier::new();

    fx.expense(90.0, date(2024, 3, 29));
    assert_eq!(
        BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier)
            .unwrap()
            .len(),
        1
    );
    assert!(BudgetService::record(&fx.db, budget).unwrap().alert_triggered);

    fx.clock.set_date(date(2024, 4, 2));
    assert!(BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier)
        .unwrap()
        .is_empty());
    assert!(!BudgetService::record(&fx.db, budget).unwrap().alert_triggered);

    fx.expense(95.0, date(2024, 4, 2));
    let created = BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(BudgetService::alerts(&fx.db, None).unwrap().len(), 2);
}

#[test]
fn deleting_spending_resets_the_flag() {
    let fx = Fixture::on(date(2024, 3, 15));
    let budget = groceries_budget(&fx, 100.0);
    let notifier = RecordingNotifier::new();
    let txn = fx.expense(85.0, date(2024, 3, 10));
    BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();

    expense_tracker::core::services::TransactionService::delete(&fx.db, &fx.clock, txn.id).unwrap();
    BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();
    assert!(!BudgetService::record(&fx.db, budget).unwrap().alert_triggered);
}

#[test]
fn raising_the_amount_clears_the_flag_on_the_next_check() {
    let fx = Fixture::on(date(2024, 3, 15));
    let budget = groceries_budget(&fx, 100.0);
    let notifier = RecordingNotifier::new();
    fx.expense(85.0, date(2024, 3, 10));
    BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();

    let changes = BudgetUpdate {
        amount: Some(400.0),
        ..BudgetUpdate::default()
    };
    let updated = BudgetService::update(&fx.db, &fx.clock, SUNDAY, budget, changes).unwrap();
    assert!(updated.alert_triggered);
    assert!((updated.spent_amount - 85.0).abs() < 1e-9);

    assert!(BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier)
        .unwrap()
        .is_empty());
    assert!(!BudgetService::record(&fx.db, budget).unwrap().alert_triggered);
}

#[test]
fn budget_outside_its_date_range_spends_nothing() {
    let fx = Fixture::on(date(2024, 3, 15));
    let budget = BudgetService::create(
        &fx.db,
        &fx.clock,
        NewBudget::general("Spring", 100.0, BudgetPeriod::Monthly, date(2024, 4, 1)),
    )
    .unwrap();
    fx.expense(500.0, date(2024, 3, 10));

    let detail = BudgetService::get(&fx.db, &fx.clock, SUNDAY, budget.id).unwrap();
    assert!(detail.progress.window.is_none());
    assert_eq!(detail.progress.spent, 0.0);
    assert_eq!(detail.progress.status, BudgetStatus::Good);
}

#[test]
fn weekly_window_follows_the_first_weekday() {
    // Wednesday 2024-03-13; Sunday weeks start 03-10, Monday weeks 03-11.
    let fx = Fixture::on(date(2024, 3, 13));
    let budget = BudgetService::create(
        &fx.db,
        &fx.clock,
        NewBudget::general("Weekly", 100.0, BudgetPeriod::Weekly, date(2024, 1, 1)),
    )
    .unwrap();
    fx.expense(40.0, date(2024, 3, 10));
    fx.expense(10.0, date(2024, 3, 12));

    let sunday = BudgetService::calculate_progress(&fx.db, &fx.clock, Weekday::Sun, &budget).unwrap();
    assert_eq!(sunday.spent, 50.0);
    let monday = BudgetService::calculate_progress(&fx.db, &fx.clock, Weekday::Mon, &budget).unwrap();
    assert_eq!(monday.spent, 10.0);
}

#[test]
fn summary_history_and_read_state() {
    let fx = Fixture::on(date(2024, 3, 15));
    let budget = groceries_budget(&fx, 200.0);
    BudgetService::create(
        &fx.db,
        &fx.clock,
        NewBudget::general("Everything", 1_000.0, BudgetPeriod::Monthly, date(2024, 3, 1)),
    )
    .unwrap();
    fx.expense(180.0, date(2024, 3, 5));
    fx.income(900.0, date(2024, 3, 1));

    let notifier = RecordingNotifier::new();
    BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();
    fx.clock.set_date(date(2024, 3, 16));
    BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier).unwrap();

    let summary = BudgetService::summary(&fx.db, &fx.clock, SUNDAY).unwrap();
    assert_eq!(summary.total_budgets, 2);
    assert_eq!(summary.total_amount, 1_200.0);
    assert_eq!(summary.total_spent, 360.0);
    assert_eq!(summary.warning, 1);
    assert_eq!(summary.good, 1);

    let history = BudgetService::history(&fx.db, budget).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].date < history[1].date);

    assert_eq!(BudgetService::mark_all_read(&fx.db).unwrap(), 1);
    assert_eq!(BudgetService::unread_count(&fx.db).unwrap(), 0);
}

#[test]
fn deactivated_budgets_are_skipped() {
    let fx = Fixture::on(date(2024, 3, 15));
    let budget = groceries_budget(&fx, 50.0);
    BudgetService::update(
        &fx.db,
        &fx.clock,
        SUNDAY,
        budget,
        BudgetUpdate {
            is_active: Some(false),
            ..BudgetUpdate::default()
        },
    )
    .unwrap();
    fx.expense(80.0, date(2024, 3, 10));

    let notifier = RecordingNotifier::new();
    assert!(BudgetService::check_alerts(&fx.db, &fx.clock, SUNDAY, &notifier)
        .unwrap()
        .is_empty());
    assert!(BudgetService::list_active(&fx.db, &fx.clock, SUNDAY)
        .unwrap()
        .is_empty());
}
