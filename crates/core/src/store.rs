//! Storage seams used by the limit evaluator and the statistics aggregator.
//!
//! The PostgreSQL implementation lives in `dailyspend-db`; tests use
//! in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::limits::LimitProfile;
use crate::types::{Date, DbId};

/// Error type for store operations called from the core services.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or the query failed.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Per-category usage for one user: how many expenses and how much in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    pub name: String,
    pub count: i64,
    pub total: Decimal,
}

/// Read-side queries over a user's expenses.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Sum of amounts for `user_id` with `from <= created_on <= to`.
    ///
    /// Returns zero when no expense matches.
    async fn sum_between(&self, user_id: DbId, from: Date, to: Date)
        -> Result<Decimal, StoreError>;

    /// Expense count and amount total per category, over all of the user's
    /// expenses. Order is unspecified.
    async fn category_usage(&self, user_id: DbId) -> Result<Vec<CategoryUsage>, StoreError>;
}

/// Access to the per-user limit profile and its dedup date.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load the limit profile, or `None` if the user does not exist.
    async fn limit_profile(&self, user_id: DbId) -> Result<Option<LimitProfile>, StoreError>;

    /// Advance `last_notified_date` to `date`.
    ///
    /// Must be a single atomic conditional write that only moves the date
    /// forward. Returns `false` when the stored date was already `date` or
    /// later (nothing written).
    async fn record_notified(&self, user_id: DbId, date: Date) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T: ExpenseStore + ?Sized> ExpenseStore for Arc<T> {
    async fn sum_between(
        &self,
        user_id: DbId,
        from: Date,
        to: Date,
    ) -> Result<Decimal, StoreError> {
        (**self).sum_between(user_id, from, to).await
    }

    async fn category_usage(&self, user_id: DbId) -> Result<Vec<CategoryUsage>, StoreError> {
        (**self).category_usage(user_id).await
    }
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    async fn limit_profile(&self, user_id: DbId) -> Result<Option<LimitProfile>, StoreError> {
        (**self).limit_profile(user_id).await
    }

    async fn record_notified(&self, user_id: DbId, date: Date) -> Result<bool, StoreError> {
        (**self).record_notified(user_id, date).await
    }
}
