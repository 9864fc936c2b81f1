//! Limit evaluation service.
//!
//! [`LimitEvaluator`] runs the daily-limit rule for one freshly persisted
//! expense: sum the day's spend, load the profile, decide, notify, and
//! advance the dedup date. The whole read-compare-notify-write sequence is
//! serialized per user through [`UserLocks`] so concurrent expenses on the
//! same day cannot both send.
//!
//! Nothing here returns an error to the caller. Every failure is logged and
//! reported through [`LimitOutcome`]; the expense itself is already
//! committed by the time the evaluator runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::expense::RecordedExpense;
use crate::limits::{evaluate_limit, limit_message, DedupState, LimitDecision};
use crate::notifier::{Notifier, NotifyError};
use crate::store::{ExpenseStore, ProfileStore};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Default operator address copied on every limit notification.
pub const DEFAULT_OPERATOR_EMAIL: &str = "operator@dailyspend.local";

/// Default upper bound on a single notifier call.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time to wait for a user's lock on each attempt.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Default number of lock attempts before giving up on a check.
pub const DEFAULT_LOCK_ATTEMPTS: u32 = 3;

/// Tunables for [`LimitEvaluator`].
#[derive(Debug, Clone)]
pub struct LimitSettings {
    /// Fixed operator address, first recipient of every notification.
    pub operator_email: String,
    /// Upper bound on a single notifier call; elapsed counts as failure.
    pub notify_timeout: Duration,
    /// How long one lock attempt waits.
    pub lock_wait: Duration,
    /// How many lock attempts before the check is skipped.
    pub lock_attempts: u32,
}

/// Rejected [`LimitSettings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lock wait budget {budget:?} must exceed the notify timeout {notify_timeout:?}")]
pub struct InvalidLimitSettings {
    pub budget: Duration,
    pub notify_timeout: Duration,
}

impl LimitSettings {
    /// Longest a check waits for its user's lock over all attempts.
    pub fn lock_budget(&self) -> Duration {
        self.lock_wait.saturating_mul(self.lock_attempts.max(1))
    }

    /// A queued check must be able to outwait one in-flight notifier call,
    /// otherwise a failed send is never retried by a later expense that day.
    pub fn validate(&self) -> Result<(), InvalidLimitSettings> {
        let budget = self.lock_budget();
        if budget <= self.notify_timeout {
            return Err(InvalidLimitSettings {
                budget,
                notify_timeout: self.notify_timeout,
            });
        }
        Ok(())
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            operator_email: DEFAULT_OPERATOR_EMAIL.to_string(),
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            lock_wait: DEFAULT_LOCK_WAIT,
            lock_attempts: DEFAULT_LOCK_ATTEMPTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a check ended without evaluating the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The user's lock could not be acquired within the allowed attempts.
    LockContention,
    /// The expense or profile store failed.
    StoreUnavailable,
    /// No profile row for the user.
    ProfileMissing,
}

/// What happened during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitOutcome {
    UnderLimit,
    AlreadyNotified,
    Notified,
    /// The notifier failed or timed out; the dedup date was left unchanged.
    NotifyFailed,
    Skipped(SkipReason),
}

// ---------------------------------------------------------------------------
// Per-user locks
// ---------------------------------------------------------------------------

/// Number of idle entries tolerated before the lock map is pruned.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Returned when a user's lock stayed busy for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Lock for user {user_id} still busy after {attempts} attempts")]
pub struct LockContention {
    pub user_id: DbId,
    pub attempts: u32,
}

/// One async mutex per user id.
///
/// Handles are created on demand and dropped by [`UserLocks::prune`] once no
/// task holds or awaits them.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<DbId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `user_id`, waiting up to `wait` per attempt.
    pub async fn acquire(
        &self,
        user_id: DbId,
        wait: Duration,
        attempts: u32,
    ) -> Result<OwnedMutexGuard<()>, LockContention> {
        let handle = self.handle(user_id);
        for attempt in 1..=attempts.max(1) {
            match tokio::time::timeout(wait, Arc::clone(&handle).lock_owned()).await {
                Ok(guard) => return Ok(guard),
                Err(_) => {
                    tracing::debug!(user_id, attempt, "Limit check lock wait elapsed");
                }
            }
        }
        Err(LockContention {
            user_id,
            attempts: attempts.max(1),
        })
    }

    /// Number of users with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    fn handle(&self, user_id: DbId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() >= LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(user_id).or_default())
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Runs the daily-limit rule after an expense is persisted.
pub struct LimitEvaluator<E, P, N> {
    expenses: E,
    profiles: P,
    notifier: N,
    locks: UserLocks,
    settings: LimitSettings,
}

impl<E, P, N> LimitEvaluator<E, P, N>
where
    E: ExpenseStore,
    P: ProfileStore,
    N: Notifier,
{
    pub fn new(expenses: E, profiles: P, notifier: N, settings: LimitSettings) -> Self {
        Self {
            expenses,
            profiles,
            notifier,
            locks: UserLocks::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &LimitSettings {
        &self.settings
    }

    /// Evaluate the limit for `expense`, notifying at most once per user-day.
    pub async fn evaluate(&self, expense: &RecordedExpense) -> LimitOutcome {
        let user_id = expense.user_id;
        let day = expense.created_on;

        let _guard = match self
            .locks
            .acquire(user_id, self.settings.lock_wait, self.settings.lock_attempts)
            .await
        {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!(
                    user_id,
                    expense_id = expense.id,
                    error = %e,
                    "Skipping limit check, user lock contended"
                );
                return LimitOutcome::Skipped(SkipReason::LockContention);
            }
        };

        let daily_total = match self.expenses.sum_between(user_id, day, day).await {
            Ok(total) => total,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to sum daily expenses");
                return LimitOutcome::Skipped(SkipReason::StoreUnavailable);
            }
        };

        let profile = match self.profiles.limit_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(user_id, "No limit profile for user, skipping limit check");
                return LimitOutcome::Skipped(SkipReason::ProfileMissing);
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to load limit profile");
                return LimitOutcome::Skipped(SkipReason::StoreUnavailable);
            }
        };

        match evaluate_limit(
            daily_total,
            profile.daily_limit,
            DedupState::from(&profile),
            day,
        ) {
            LimitDecision::UnderLimit => return LimitOutcome::UnderLimit,
            LimitDecision::AlreadyNotified => {
                tracing::debug!(user_id, %day, "Limit already notified today");
                return LimitOutcome::AlreadyNotified;
            }
            LimitDecision::Notify => {}
        }

        let message = limit_message(
            expense,
            profile.daily_limit,
            &self.settings.operator_email,
            &profile.email,
        );

        let sent = match tokio::time::timeout(
            self.settings.notify_timeout,
            self.notifier.send(&message),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.settings.notify_timeout)),
        };

        if let Err(e) = sent {
            tracing::warn!(
                user_id,
                expense_id = expense.id,
                error = %e,
                "Limit notification failed, will retry on next expense"
            );
            return LimitOutcome::NotifyFailed;
        }

        match self.profiles.record_notified(user_id, day).await {
            Ok(true) => {
                tracing::info!(
                    user_id,
                    %day,
                    %daily_total,
                    limit = %profile.daily_limit,
                    "Daily limit notification sent"
                );
            }
            Ok(false) => {
                tracing::warn!(
                    user_id,
                    %day,
                    "Notification sent but dedup date was already at or past this day"
                );
            }
            Err(e) => {
                tracing::error!(
                    user_id,
                    %day,
                    error = %e,
                    "Notification sent but dedup date could not be persisted"
                );
            }
        }

        LimitOutcome::Notified
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::testing::{expense_on, FakeLedger, RecordingNotifier};
    use crate::types::Date;

    fn day(d: u32) -> Date {
        Date::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn evaluator(
        ledger: &Arc<FakeLedger>,
        notifier: &Arc<RecordingNotifier>,
    ) -> LimitEvaluator<Arc<FakeLedger>, Arc<FakeLedger>, Arc<RecordingNotifier>> {
        LimitEvaluator::new(
            Arc::clone(ledger),
            Arc::clone(ledger),
            Arc::clone(notifier),
            LimitSettings {
                operator_email: "ops@example.com".into(),
                notify_timeout: Duration::from_millis(200),
                lock_wait: Duration::from_millis(500),
                lock_attempts: 2,
            },
        )
    }

    #[tokio::test]
    async fn scenario_notifies_once_per_day() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(200)));
        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = evaluator(&ledger, &notifier);

        let a = ledger.record(expense_on(1, "Lunch", dec!(120), day(4)), "Food");
        assert_eq!(evaluator.evaluate(&a).await, LimitOutcome::UnderLimit);
        assert_eq!(ledger.last_notified(1), None);

        let b = ledger.record(expense_on(1, "Dinner", dec!(90), day(4)), "Food");
        assert_eq!(evaluator.evaluate(&b).await, LimitOutcome::Notified);
        assert_eq!(ledger.last_notified(1), Some(day(4)));

        let c = ledger.record(expense_on(1, "Snack", dec!(10), day(4)), "Food");
        assert_eq!(evaluator.evaluate(&c).await, LimitOutcome::AlreadyNotified);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Passed the limit with Dinner");
        assert_eq!(sent[0].recipients, vec!["ops@example.com", "jane@example.com"]);
    }

    #[tokio::test]
    async fn other_days_do_not_count_toward_today() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(200)));
        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = evaluator(&ledger, &notifier);

        ledger.record(expense_on(1, "Rent", dec!(500), day(3)), "Housing");
        let today = ledger.record(expense_on(1, "Coffee", dec!(5), day(4)), "Food");

        assert_eq!(evaluator.evaluate(&today).await, LimitOutcome::UnderLimit);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn new_day_notifies_again() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(100)));
        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = evaluator(&ledger, &notifier);

        let first = ledger.record(expense_on(1, "TV", dec!(150), day(4)), "Home");
        assert_eq!(evaluator.evaluate(&first).await, LimitOutcome::Notified);
        let second = ledger.record(expense_on(1, "Sofa", dec!(150), day(5)), "Home");
        assert_eq!(evaluator.evaluate(&second).await, LimitOutcome::Notified);

        assert_eq!(notifier.sent().len(), 2);
        assert_eq!(ledger.last_notified(1), Some(day(5)));
    }

    #[tokio::test]
    async fn notifier_failure_leaves_dedup_unchanged_and_retries() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(100)));
        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = evaluator(&ledger, &notifier);

        notifier.fail.store(true, Ordering::SeqCst);
        let a = ledger.record(expense_on(1, "Shoes", dec!(120), day(4)), "Clothes");
        assert_eq!(evaluator.evaluate(&a).await, LimitOutcome::NotifyFailed);
        assert_eq!(ledger.last_notified(1), None);

        notifier.fail.store(false, Ordering::SeqCst);
        let b = ledger.record(expense_on(1, "Socks", dec!(5), day(4)), "Clothes");
        assert_eq!(evaluator.evaluate(&b).await, LimitOutcome::Notified);
        assert_eq!(ledger.last_notified(1), Some(day(4)));
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn notifier_timeout_counts_as_failure() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(10)));
        let notifier = Arc::new(RecordingNotifier::with_delay(Duration::from_secs(5)));
        let evaluator = evaluator(&ledger, &notifier);

        let a = ledger.record(expense_on(1, "Taxi", dec!(30), day(4)), "Transport");
        assert_eq!(evaluator.evaluate(&a).await, LimitOutcome::NotifyFailed);
        assert_eq!(ledger.last_notified(1), None);
    }

    #[tokio::test]
    async fn store_failure_skips_notification() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(10)));
        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = evaluator(&ledger, &notifier);

        let a = ledger.record(expense_on(1, "Taxi", dec!(30), day(4)), "Transport");
        ledger.fail_profiles.store(true, Ordering::SeqCst);

        assert_eq!(
            evaluator.evaluate(&a).await,
            LimitOutcome::Skipped(SkipReason::StoreUnavailable)
        );
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_profile_is_skipped() {
        let ledger = Arc::new(FakeLedger::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = evaluator(&ledger, &notifier);

        let a = ledger.record(expense_on(42, "Taxi", dec!(30), day(4)), "Transport");
        assert_eq!(
            evaluator.evaluate(&a).await,
            LimitOutcome::Skipped(SkipReason::ProfileMissing)
        );
    }

    /// Two expenses persisted before either evaluation runs: both would see
    /// `last_notified_date = None`. The per-user lock must still yield a
    /// single notification.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_same_day_expenses_notify_exactly_once() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(200)));
        let notifier = Arc::new(RecordingNotifier::with_delay(Duration::from_millis(50)));
        let evaluator = Arc::new(evaluator(&ledger, &notifier));

        let a = ledger.record(expense_on(1, "Lunch", dec!(150), day(4)), "Food");
        let b = ledger.record(expense_on(1, "Dinner", dec!(150), day(4)), "Food");

        let first = tokio::spawn({
            let evaluator = Arc::clone(&evaluator);
            async move { evaluator.evaluate(&a).await }
        });
        let second = tokio::spawn({
            let evaluator = Arc::clone(&evaluator);
            async move { evaluator.evaluate(&b).await }
        });

        let mut outcomes = vec![first.await.unwrap(), second.await.unwrap()];
        outcomes.sort_by_key(|o| *o == LimitOutcome::Notified);

        assert_eq!(
            outcomes,
            vec![LimitOutcome::AlreadyNotified, LimitOutcome::Notified]
        );
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(ledger.last_notified(1), Some(day(4)));
    }

    #[tokio::test]
    async fn many_concurrent_checks_still_notify_once() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(50)));
        let notifier = Arc::new(RecordingNotifier::with_delay(Duration::from_millis(5)));
        let evaluator = Arc::new(evaluator(&ledger, &notifier));

        let expenses: Vec<_> = (0..10)
            .map(|i| ledger.record(expense_on(1, &format!("Item {i}"), dec!(20), day(4)), "Misc"))
            .collect();

        let handles: Vec<_> = expenses
            .into_iter()
            .map(|expense| {
                let evaluator = Arc::clone(&evaluator);
                tokio::spawn(async move { evaluator.evaluate(&expense).await })
            })
            .collect();

        let notified = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .filter(|o| *o == LimitOutcome::Notified)
            .count();

        assert_eq!(notified, 1);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn default_settings_outwait_the_notify_timeout() {
        let settings = LimitSettings::default();
        assert!(settings.lock_budget() > settings.notify_timeout);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn lock_budget_within_notify_timeout_is_rejected() {
        let settings = LimitSettings {
            notify_timeout: Duration::from_secs(10),
            lock_wait: Duration::from_secs(2),
            lock_attempts: 3,
            ..LimitSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(InvalidLimitSettings {
                budget: Duration::from_secs(6),
                notify_timeout: Duration::from_secs(10),
            })
        );
    }

    /// A check queued behind a slow failing send must still get the lock and
    /// retry once the first send gives up.
    #[tokio::test(start_paused = true)]
    async fn queued_check_retries_after_slow_notifier_failure() {
        let ledger = Arc::new(FakeLedger::with_user(1, "jane@example.com", dec!(100)));
        let notifier = Arc::new(RecordingNotifier::with_delay(Duration::from_secs(9)));
        notifier.fail.store(true, Ordering::SeqCst);
        let evaluator = Arc::new(LimitEvaluator::new(
            Arc::clone(&ledger),
            Arc::clone(&ledger),
            Arc::clone(&notifier),
            LimitSettings::default(),
        ));

        let a = ledger.record(expense_on(1, "Shoes", dec!(120), day(4)), "Clothes");
        let b = ledger.record(expense_on(1, "Socks", dec!(5), day(4)), "Clothes");

        let first = tokio::spawn({
            let evaluator = Arc::clone(&evaluator);
            async move { evaluator.evaluate(&a).await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let evaluator = Arc::clone(&evaluator);
            async move { evaluator.evaluate(&b).await }
        });

        assert_eq!(first.await.unwrap(), LimitOutcome::NotifyFailed);
        notifier.fail.store(false, Ordering::SeqCst);

        assert_eq!(second.await.unwrap(), LimitOutcome::Notified);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(ledger.last_notified(1), Some(day(4)));
    }

    #[tokio::test]
    async fn lock_contention_exhausts_attempts() {
        let locks = UserLocks::new();
        let held = locks
            .acquire(7, Duration::from_millis(10), 1)
            .await
            .unwrap();

        let result = locks.acquire(7, Duration::from_millis(10), 3).await;
        assert_eq!(
            result.unwrap_err(),
            LockContention {
                user_id: 7,
                attempts: 3
            }
        );

        drop(held);
        assert!(locks.acquire(7, Duration::from_millis(10), 1).await.is_ok());
    }

    #[tokio::test]
    async fn different_users_do_not_contend() {
        let locks = UserLocks::new();
        let _a = locks.acquire(1, Duration::from_millis(10), 1).await.unwrap();
        assert!(locks.acquire(2, Duration::from_millis(10), 1).await.is_ok());
    }

    #[tokio::test]
    async fn prune_drops_idle_entries() {
        let locks = UserLocks::new();
        let held = locks.acquire(1, Duration::from_millis(10), 1).await.unwrap();
        drop(locks.acquire(2, Duration::from_millis(10), 1).await.unwrap());
        assert_eq!(locks.len(), 2);

        locks.prune();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
