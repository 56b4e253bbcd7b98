#![allow(dead_code)]

use chrono::NaiveDate;
use expense_tracker::{
    core::{
        clock::FixedClock,
        services::{AccountService, CategoryService, TransactionService},
    },
    domain::{AccountKind, CategoryKind, NewAccount, NewCategory, NewTransaction, Transaction, TransactionKind},
    storage::Database,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// In-memory database with one account and one expense and income category,
/// frozen at `today`.
pub struct Fixture {
    pub db: Database,
    pub clock: FixedClock,
    pub account: i64,
    pub groceries: i64,
    pub salary: i64,
}

impl Fixture {
    pub fn on(today: NaiveDate) -> Self {
        let db = Database::open_in_memory().expect("open in-memory database");
        let clock = FixedClock::on(today);
        let account = AccountService::create(
            &db,
            &clock,
            NewAccount::new("Checking", AccountKind::Bank).with_initial_balance(1_000.0),
        )
        .expect("create account")
        .id;
        let groceries =
            CategoryService::create(&db, &clock, NewCategory::new("Groceries", CategoryKind::Expense))
                .expect("create expense category")
                .id;
        let salary =
            CategoryService::create(&db, &clock, NewCategory::new("Salary", CategoryKind::Income))
                .expect("create income category")
                .id;
        Self {
            db,
            clock,
            account,
            groceries,
            salary,
        }
    }

    pub fn expense(&self, amount: f64, on: NaiveDate) -> Transaction {
        self.record(self.groceries, TransactionKind::Expense, amount, on)
    }

    pub fn income(&self, amount: f64, on: NaiveDate) -> Transaction {
        self.record(self.salary, TransactionKind::Income, amount, on)
    }

    pub fn record(
        &self,
        category: i64,
        kind: TransactionKind,
        amount: f64,
        on: NaiveDate,
    ) -> Transaction {
        TransactionService::create(
            &self.db,
            &self.clock,
            NewTransaction::new(self.account, category, kind, amount, on),
        )
        .expect("create transaction")
    }

    pub fn balance(&self) -> f64 {
        AccountService::get(&self.db, self.account)
            .expect("load account")
            .current_balance
    }
}
