//! Background services started alongside the HTTP server.

use std::sync::Arc;

use dailyspend_core::evaluator::LimitEvaluator;
use dailyspend_core::notifier::Notifier;
use dailyspend_db::PgLedger;
use dailyspend_events::{LimitCheckQueue, LimitCheckWorker};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::LimitConfig;

/// Build the limit evaluator over `ledger` and spawn the worker that drains
/// the limit-check queue.
///
/// Returns the queue handle for [`AppState`](crate::state::AppState) and the
/// worker's join handle. The worker stops when `cancel` fires, after running
/// every check still queued.
pub fn spawn_limit_worker<N>(
    ledger: PgLedger,
    notifier: N,
    config: &LimitConfig,
    cancel: CancellationToken,
) -> (LimitCheckQueue, JoinHandle<()>)
where
    N: Notifier + 'static,
{
    let evaluator = Arc::new(LimitEvaluator::new(
        ledger.clone(),
        ledger,
        notifier,
        config.evaluator_settings(),
    ));
    let (queue, receiver) = LimitCheckQueue::new(config.queue_capacity);
    let worker = LimitCheckWorker::new(evaluator);

    let handle = tokio::spawn(async move {
        worker.run(receiver, cancel).await;
    });

    (queue, handle)
}
