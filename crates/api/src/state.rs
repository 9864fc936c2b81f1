use std::sync::Arc;

use dailyspend_db::PgLedger;
use dailyspend_events::LimitCheckQueue;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dailyspend_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Store-trait view of the database, used by the statistics aggregator.
    pub ledger: PgLedger,
    /// Producer side of the limit-check queue.
    pub limit_checks: LimitCheckQueue,
}
