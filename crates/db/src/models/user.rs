//! User entity model and DTOs.

use dailyspend_core::types::{Date, DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub region: String,
    pub password_hash: String,
    pub is_active: bool,
    pub daily_expenses_limit: Decimal,
    pub last_notified_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub region: String,
    pub daily_expenses_limit: Decimal,
    pub last_notified_date: Option<Date>,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            region: user.region,
            daily_expenses_limit: user.daily_expenses_limit,
            last_notified_date: user.last_notified_date,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub region: String,
    pub password_hash: String,
}

/// DTO for updating an existing user. All fields are optional.
///
/// `last_notified_date` is deliberately absent: only the limit evaluator
/// moves it, through [`UserRepo::record_notified`](crate::repositories::UserRepo::record_notified).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub region: Option<String>,
    pub daily_expenses_limit: Option<Decimal>,
    pub password_hash: Option<String>,
}
