//! Limit-check task queue.
//!
//! The create-expense handler pushes a [`LimitCheck`] onto a bounded
//! [`LimitCheckQueue`] and returns immediately. [`LimitCheckWorker`] drains
//! the queue in the background, running one evaluation task per check. The
//! evaluator serializes checks for the same user itself, so the worker is
//! free to run checks for different users in parallel.

use std::sync::Arc;

use async_trait::async_trait;
use dailyspend_core::evaluator::{LimitEvaluator, LimitOutcome};
use dailyspend_core::expense::RecordedExpense;
use dailyspend_core::notifier::Notifier;
use dailyspend_core::store::{ExpenseStore, ProfileStore};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Default capacity of the limit-check queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// LimitChecker
// ---------------------------------------------------------------------------

/// Runs the daily-limit check for one persisted expense.
#[async_trait]
pub trait LimitChecker: Send + Sync + 'static {
    async fn check(&self, expense: &RecordedExpense) -> LimitOutcome;
}

#[async_trait]
impl<E, P, N> LimitChecker for LimitEvaluator<E, P, N>
where
    E: ExpenseStore + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
{
    async fn check(&self, expense: &RecordedExpense) -> LimitOutcome {
        self.evaluate(expense).await
    }
}

// ---------------------------------------------------------------------------
// LimitCheckQueue
// ---------------------------------------------------------------------------

/// A pending limit check for a newly created expense.
#[derive(Debug, Clone)]
pub struct LimitCheck {
    pub expense: RecordedExpense,
}

/// Producer side of the limit-check queue. Cheap to clone.
#[derive(Clone)]
pub struct LimitCheckQueue {
    sender: mpsc::Sender<LimitCheck>,
}

impl LimitCheckQueue {
    /// Create a queue holding at most `capacity` pending checks.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LimitCheck>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue a check without waiting.
    ///
    /// Returns `false` if the queue is full or the worker has stopped. The
    /// expense is already persisted either way; a dropped check only means
    /// this expense does not trigger a notification.
    pub fn enqueue(&self, expense: RecordedExpense) -> bool {
        match self.sender.try_send(LimitCheck { expense }) {
            Ok(()) => true,
            Err(TrySendError::Full(check)) => {
                tracing::warn!(
                    user_id = check.expense.user_id,
                    expense_id = check.expense.id,
                    "Limit check queue full, dropping check"
                );
                false
            }
            Err(TrySendError::Closed(check)) => {
                tracing::error!(
                    user_id = check.expense.user_id,
                    expense_id = check.expense.id,
                    "Limit check queue closed, dropping check"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// LimitCheckWorker
// ---------------------------------------------------------------------------

/// Background service that drains a [`LimitCheckQueue`].
pub struct LimitCheckWorker<C> {
    checker: Arc<C>,
}

impl<C: LimitChecker> LimitCheckWorker<C> {
    pub fn new(checker: Arc<C>) -> Self {
        Self { checker }
    }

    /// Run the worker loop.
    ///
    /// Exits when `cancel` fires or every queue sender is dropped. Either
    /// way, checks already queued are still run and in-flight checks are
    /// awaited before returning.
    pub async fn run(&self, mut receiver: mpsc::Receiver<LimitCheck>, cancel: CancellationToken) {
        let mut tasks: JoinSet<LimitOutcome> = JoinSet::new();
        tracing::info!("Limit check worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Limit check worker cancelled, draining queue");
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join_error(joined);
                }
                next = receiver.recv() => match next {
                    Some(check) => self.spawn(&mut tasks, check),
                    None => {
                        tracing::info!("Limit check queue closed");
                        break;
                    }
                }
            }
        }

        receiver.close();
        while let Some(check) = receiver.recv().await {
            self.spawn(&mut tasks, check);
        }
        while let Some(joined) = tasks.join_next().await {
            log_join_error(joined);
        }
        tracing::info!("Limit check worker stopped");
    }

    fn spawn(&self, tasks: &mut JoinSet<LimitOutcome>, check: LimitCheck) {
        let checker = Arc::clone(&self.checker);
        tasks.spawn(async move {
            let outcome = checker.check(&check.expense).await;
            tracing::debug!(
                user_id = check.expense.user_id,
                expense_id = check.expense.id,
                ?outcome,
                "Limit check finished"
            );
            outcome
        });
    }
}

fn log_join_error(joined: Result<LimitOutcome, JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Limit check task failed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
