//! Handler for `GET /statistics`.

use axum::extract::State;
use axum::Json;
use dailyspend_core::statistics::{SpendingStatistics, StatisticsAggregator};
use dailyspend_core::types::today_utc;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/statistics
///
/// Computed fresh on every request, with "today" as the current UTC date.
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SpendingStatistics>>> {
    let stats = StatisticsAggregator::new(state.ledger.clone())
        .compute(auth.user_id, today_utc())
        .await?;
    Ok(Json(DataResponse { data: stats }))
}
