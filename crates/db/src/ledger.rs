//! [`PgLedger`]: the core store traits implemented over a PostgreSQL pool.

use async_trait::async_trait;
use dailyspend_core::limits::LimitProfile;
use dailyspend_core::store::{CategoryUsage, ExpenseStore, ProfileStore, StoreError};
use dailyspend_core::types::{Date, DbId};
use rust_decimal::Decimal;

use crate::repositories::{ExpenseRepo, UserRepo};
use crate::DbPool;

fn store_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Expense and profile store backed by the application database.
///
/// Cheap to clone; holds only the pool handle.
#[derive(Clone)]
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ExpenseStore for PgLedger {
    async fn sum_between(
        &self,
        user_id: DbId,
        from: Date,
        to: Date,
    ) -> Result<Decimal, StoreError> {
        ExpenseRepo::sum_between(&self.pool, user_id, from, to)
            .await
            .map_err(store_error)
    }

    async fn category_usage(&self, user_id: DbId) -> Result<Vec<CategoryUsage>, StoreError> {
        let rows = ExpenseRepo::category_usage(&self.pool, user_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(CategoryUsage::from).collect())
    }
}

#[async_trait]
impl ProfileStore for PgLedger {
    async fn limit_profile(&self, user_id: DbId) -> Result<Option<LimitProfile>, StoreError> {
        let user = UserRepo::find_by_id(&self.pool, user_id)
            .await
            .map_err(store_error)?;
        Ok(user.map(|u| LimitProfile {
            user_id: u.id,
            email: u.email,
            daily_limit: u.daily_expenses_limit,
            last_notified_date: u.last_notified_date,
        }))
    }

    async fn record_notified(&self, user_id: DbId, date: Date) -> Result<bool, StoreError> {
        UserRepo::record_notified(&self.pool, user_id, date)
            .await
            .map_err(store_error)
    }
}
