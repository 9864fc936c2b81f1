//! In-memory fakes for unit tests of the core services.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::expense::RecordedExpense;
use crate::limits::{DedupState, LimitProfile};
use crate::notifier::{Notifier, NotifyError, OutgoingMessage};
use crate::store::{CategoryUsage, ExpenseStore, ProfileStore, StoreError};
use crate::types::{Date, DbId};

/// An expense about to be recorded in a [`FakeLedger`].
pub struct PendingExpense {
    user_id: DbId,
    name: String,
    amount: Decimal,
    created_on: Date,
}

pub fn expense_on(user_id: DbId, name: &str, amount: Decimal, created_on: Date) -> PendingExpense {
    PendingExpense {
        user_id,
        name: name.to_string(),
        amount,
        created_on,
    }
}

#[derive(Default)]
struct LedgerState {
    next_id: DbId,
    expenses: Vec<(RecordedExpense, String)>,
    profiles: HashMap<DbId, LimitProfile>,
}

/// Expense and profile store backed by plain collections.
#[derive(Default)]
pub struct FakeLedger {
    state: Mutex<LedgerState>,
    pub fail_expenses: AtomicBool,
    pub fail_profiles: AtomicBool,
}

impl FakeLedger {
    pub fn with_user(user_id: DbId, email: &str, daily_limit: Decimal) -> Self {
        let ledger = Self::default();
        ledger.state.lock().unwrap().profiles.insert(
            user_id,
            LimitProfile {
                user_id,
                email: email.to_string(),
                daily_limit,
                last_notified_date: None,
            },
        );
        ledger
    }

    /// Persist an expense under `category`, returning the stored snapshot.
    pub fn record(&self, pending: PendingExpense, category: &str) -> RecordedExpense {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let expense = RecordedExpense {
            id: state.next_id,
            user_id: pending.user_id,
            name: pending.name,
            amount: pending.amount,
            created_on: pending.created_on,
        };
        state.expenses.push((expense.clone(), category.to_string()));
        expense
    }

    pub fn last_notified(&self, user_id: DbId) -> Option<Date> {
        self.state
            .lock()
            .unwrap()
            .profiles
            .get(&user_id)
            .and_then(|p| p.last_notified_date)
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExpenseStore for FakeLedger {
    async fn sum_between(
        &self,
        user_id: DbId,
        from: Date,
        to: Date,
    ) -> Result<Decimal, StoreError> {
        Self::check(&self.fail_expenses)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .expenses
            .iter()
            .filter(|(e, _)| e.user_id == user_id && e.created_on >= from && e.created_on <= to)
            .map(|(e, _)| e.amount)
            .sum())
    }

    async fn category_usage(&self, user_id: DbId) -> Result<Vec<CategoryUsage>, StoreError> {
        Self::check(&self.fail_expenses)?;
        let state = self.state.lock().unwrap();
        let mut usage: Vec<CategoryUsage> = Vec::new();
        for (expense, category) in state.expenses.iter().filter(|(e, _)| e.user_id == user_id) {
            match usage.iter_mut().find(|u| &u.name == category) {
                Some(row) => {
                    row.count += 1;
                    row.total += expense.amount;
                }
                None => usage.push(CategoryUsage {
                    name: category.clone(),
                    count: 1,
                    total: expense.amount,
                }),
            }
        }
        Ok(usage)
    }
}

#[async_trait]
impl ProfileStore for FakeLedger {
    async fn limit_profile(&self, user_id: DbId) -> Result<Option<LimitProfile>, StoreError> {
        Self::check(&self.fail_profiles)?;
        Ok(self.state.lock().unwrap().profiles.get(&user_id).cloned())
    }

    async fn record_notified(&self, user_id: DbId, date: Date) -> Result<bool, StoreError> {
        Self::check(&self.fail_profiles)?;
        let mut state = self.state.lock().unwrap();
        let Some(profile) = state.profiles.get_mut(&user_id) else {
            return Ok(false);
        };
        let mut dedup = DedupState::from(&*profile);
        let advanced = dedup.advance(date);
        profile.last_notified_date = dedup.last_notified();
        Ok(advanced)
    }
}

/// Notifier that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutgoingMessage>>,
    delay: Option<Duration>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("SMTP 451 try again later".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
