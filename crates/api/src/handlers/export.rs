//! Handler for `GET /csv-export`.

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use dailyspend_core::export::{expenses_csv, ExportRow, CSV_FILENAME};
use dailyspend_db::repositories::ExpenseRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/csv-export
///
/// Download every expense of the caller as CSV, ordered by id.
pub async fn csv_export(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let rows: Vec<ExportRow> = ExpenseRepo::export_lines(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .map(ExportRow::from)
        .collect();

    let body = expenses_csv(&rows)
        .map_err(|e| AppError::InternalError(format!("CSV export failed: {e}")))?;

    tracing::info!(user_id = auth.user_id, rows = rows.len(), "CSV export generated");
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={CSV_FILENAME}"),
            ),
        ],
        body,
    ))
}
