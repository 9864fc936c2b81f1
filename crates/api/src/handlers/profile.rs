//! Handlers for the `/profile` resource (registration and the caller's own
//! profile).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use dailyspend_core::error::CoreError;
use dailyspend_core::expense::validate_name;
use dailyspend_core::profile::{
    validate_daily_limit, validate_email, validate_password, validate_region,
};
use dailyspend_db::models::user::{CreateUser, UpdateUser, UserResponse};
use dailyspend_db::repositories::UserRepo;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /profile`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub password: String,
}

/// Request body for `PATCH /profile`. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub region: Option<String>,
    pub daily_expenses_limit: Option<Decimal>,
    pub password: Option<String>,
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}

/// POST /api/v1/profile
///
/// Register a new user. The daily limit starts at the default.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let email = validate_email(&input.email)?;
    let name = validate_name("Name", &input.name)?;
    validate_region(&input.region)?;
    validate_password(&input.password)?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email,
            name,
            region: input.region,
            password_hash: hash(&input.password)?,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: user.into() }),
    ))
}

/// GET /api/v1/profile
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PATCH /api/v1/profile
///
/// `last_notified_date` cannot be changed here.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let name = input
        .name
        .as_deref()
        .map(|n| validate_name("Name", n))
        .transpose()?;
    if let Some(region) = input.region.as_deref() {
        validate_region(region)?;
    }
    let daily_expenses_limit = input
        .daily_expenses_limit
        .map(validate_daily_limit)
        .transpose()?;
    let password_hash = match input.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash(password)?)
        }
        None => None,
    };

    let user = UserRepo::update(
        &state.pool,
        auth.user_id,
        &UpdateUser {
            name,
            region: input.region,
            daily_expenses_limit,
            password_hash,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "User",
        id: auth.user_id,
    }))?;

    if let Some(limit) = daily_expenses_limit {
        tracing::info!(user_id = user.id, %limit, "Daily limit updated");
    }
    Ok(Json(DataResponse { data: user.into() }))
}
