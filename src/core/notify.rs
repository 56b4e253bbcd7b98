use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::NotificationSettings,
    domain::{AlertKind, Budget, BudgetProgress},
};

/// Payload handed to notifiers when a budget crosses its alert threshold.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetNotice {
    pub budget_id: i64,
    pub budget_name: String,
    pub kind: AlertKind,
    pub percentage: f64,
    pub spent: f64,
    pub amount: f64,
}

impl BudgetNotice {
    pub fn new(budget: &Budget, progress: &BudgetProgress, kind: AlertKind) -> Self {
        Self {
            budget_id: budget.id,
            budget_name: budget.name.clone(),
            kind,
            percentage: progress.percentage,
            spent: progress.spent,
            amount: budget.amount,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            AlertKind::Warning => "Budget Alert",
            AlertKind::Exceeded => "Budget Exceeded!",
        }
    }

    pub fn body(&self) -> String {
        match self.kind {
            AlertKind::Warning => format!(
                "{} is {:.1}% spent (${:.2} of ${:.2})",
                self.budget_name, self.percentage, self.spent, self.amount
            ),
            AlertKind::Exceeded => format!(
                "{} exceeded by ${:.2}. Total spent: ${:.2}",
                self.budget_name,
                self.spent - self.amount,
                self.spent
            ),
        }
    }

    pub fn is_enabled(&self, settings: &NotificationSettings) -> bool {
        match self.kind {
            AlertKind::Warning => settings.budget_alerts,
            AlertKind::Exceeded => settings.budget_exceeded,
        }
    }
}

pub trait AlertNotifier: Send + Sync {
    fn notify(&self, notice: &BudgetNotice);
}

/// Drops notices whose kind is switched off in the user's settings.
pub struct FilteredNotifier<'a> {
    inner: &'a dyn AlertNotifier,
    settings: NotificationSettings,
}

impl<'a> FilteredNotifier<'a> {
    pub fn new(inner: &'a dyn AlertNotifier, settings: NotificationSettings) -> Self {
        Self { inner, settings }
    }
}

impl AlertNotifier for FilteredNotifier<'_> {
    fn notify(&self, notice: &BudgetNotice) {
        if notice.is_enabled(&self.settings) {
            self.inner.notify(notice);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl AlertNotifier for TracingNotifier {
    fn notify(&self, notice: &BudgetNotice) {
        match notice.kind {
            AlertKind::Warning => info!(budget = notice.budget_id, "{}: {}", notice.title(), notice.body()),
            AlertKind::Exceeded => warn!(budget = notice.budget_id, "{}: {}", notice.title(), notice.body()),
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<BudgetNotice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<BudgetNotice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AlertNotifier for RecordingNotifier {
    fn notify(&self, notice: &BudgetNotice) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(kind: AlertKind, spent: f64) -> BudgetNotice {
        BudgetNotice {
            budget_id: 1,
            budget_name: "Groceries".into(),
            kind,
            percentage: spent / 200.0 * 100.0,
            spent,
            amount: 200.0,
        }
    }

    #[test]
    fn bodies_match_notice_kind() {
        assert_eq!(
            notice(AlertKind::Warning, 170.0).body(),
            "Groceries is 85.0% spent ($170.00 of $200.00)"
        );
        assert_eq!(
            notice(AlertKind::Exceeded, 250.5).body(),
            "Groceries exceeded by $50.50. Total spent: $250.50"
        );
    }

    #[test]
    fn filtered_notifier_honours_settings() {
        let recorder = RecordingNotifier::new();
        let settings = NotificationSettings {
            budget_alerts: false,
            budget_exceeded: true,
        };
        let filtered = FilteredNotifier::new(&recorder, settings);
        filtered.notify(&notice(AlertKind::Warning, 170.0));
        filtered.notify(&notice(AlertKind::Exceeded, 250.0));

        let seen = recorder.notices();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, AlertKind::Exceeded);
    }

    #[test]
    fn tracing_notifier_accepts_both_kinds() {
        crate::init();
        let notifier = TracingNotifier;
        notifier.notify(&notice(AlertKind::Warning, 170.0));
        notifier.notify(&notice(AlertKind::Exceeded, 250.0));
    }
}
