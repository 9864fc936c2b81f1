//! Handlers for the `/expenses` resource.
//!
//! Creating an expense enqueues a daily-limit check; the response never
//! waits on it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dailyspend_core::error::CoreError;
use dailyspend_core::expense::{validate_amount, validate_name, RecordedExpense};
use dailyspend_core::types::{today_utc, DbId};
use dailyspend_db::models::expense::{CreateExpense, Expense, UpdateExpense};
use dailyspend_db::repositories::{CategoryRepo, ExpenseRepo};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /expenses`.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub name: String,
    pub amount: Decimal,
    pub category_id: DbId,
}

/// Query parameters for `GET /expenses`.
#[derive(Debug, Default, Deserialize)]
pub struct ListExpensesParams {
    /// Case-insensitive match on name, creation date or amount.
    pub search: Option<String>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Expense",
        id,
    })
}

/// POST /api/v1/expenses
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateExpenseRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Expense>>)> {
    let name = validate_name("Expense name", &input.name)?;
    let amount = validate_amount(input.amount)?;
    if CategoryRepo::find_visible(&state.pool, input.category_id, auth.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Category {} does not exist",
            input.category_id
        ))));
    }

    let expense = ExpenseRepo::create(
        &state.pool,
        &CreateExpense {
            user_id: auth.user_id,
            category_id: input.category_id,
            name,
            amount,
            created_on: today_utc(),
        },
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        expense_id = expense.id,
        amount = %expense.amount,
        "Expense recorded"
    );
    state.limit_checks.enqueue(RecordedExpense::from(&expense));

    Ok((StatusCode::CREATED, Json(DataResponse { data: expense })))
}

/// GET /api/v1/expenses?search=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListExpensesParams>,
) -> AppResult<Json<DataResponse<Vec<Expense>>>> {
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let expenses = ExpenseRepo::list_for_user(&state.pool, auth.user_id, search).await?;
    Ok(Json(DataResponse { data: expenses }))
}

/// GET /api/v1/expenses/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Expense>>> {
    let expense = ExpenseRepo::find_for_user(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: expense }))
}

/// PATCH /api/v1/expenses/{id}
///
/// Only the name may change; owner, category and amount are fixed.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateExpense>,
) -> AppResult<Json<DataResponse<Expense>>> {
    let expense = match input.name.as_deref() {
        Some(name) => {
            let name = validate_name("Expense name", name)?;
            ExpenseRepo::update_name(&state.pool, id, auth.user_id, &name).await?
        }
        None => ExpenseRepo::find_for_user(&state.pool, id, auth.user_id).await?,
    }
    .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: expense }))
}

/// DELETE /api/v1/expenses/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ExpenseRepo::delete_for_user(&state.pool, id, auth.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
