//! Handlers for the `/categories` resource.
//!
//! Callers see their own categories plus the global ones, but may only
//! modify their own.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dailyspend_core::category::{ensure_unique_name, validate_category};
use dailyspend_core::error::CoreError;
use dailyspend_core::types::DbId;
use dailyspend_db::models::category::{Category, CreateCategory, UpdateCategory};
use dailyspend_db::repositories::CategoryRepo;
use dailyspend_db::DbPool;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /categories`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Load a category the caller owns.
///
/// Missing ids are 404; global or foreign categories are 403.
async fn find_owned(pool: &DbPool, id: DbId, user_id: DbId) -> AppResult<Category> {
    let category = CategoryRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;
    if category.user_id != Some(user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only modify your own categories".into(),
        )));
    }
    Ok(category)
}

/// GET /api/v1/categories
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let categories = CategoryRepo::list_visible(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/v1/categories
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let name = validate_category(&input.name, &input.description)?;
    let visible = CategoryRepo::visible_names(&state.pool, auth.user_id).await?;
    ensure_unique_name(visible.iter().map(String::as_str), &name)?;

    let category = CategoryRepo::create(
        &state.pool,
        &CreateCategory {
            user_id: Some(auth.user_id),
            name,
            description: input.description,
        },
    )
    .await?;

    tracing::info!(user_id = auth.user_id, category_id = category.id, "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PATCH /api/v1/categories/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<DataResponse<Category>>> {
    let current = find_owned(&state.pool, id, auth.user_id).await?;

    let name = validate_category(
        input.name.as_deref().unwrap_or(&current.name),
        input.description.as_deref().unwrap_or(&current.description),
    )?;
    if name != current.name {
        let others: Vec<Category> = CategoryRepo::list_visible(&state.pool, auth.user_id)
            .await?
            .into_iter()
            .filter(|c| c.id != id)
            .collect();
        ensure_unique_name(others.iter().map(|c| c.name.as_str()), &name)?;
    }

    let category = CategoryRepo::update_owned(
        &state.pool,
        id,
        auth.user_id,
        &UpdateCategory {
            name: Some(name),
            description: input.description,
            is_active: input.is_active,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Category",
        id,
    }))?;
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
///
/// Expenses filed under the category are deleted with it.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned(&state.pool, id, auth.user_id).await?;
    if CategoryRepo::delete_owned(&state.pool, id, auth.user_id).await? {
        tracing::info!(user_id = auth.user_id, category_id = id, "Category deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))
    }
}
