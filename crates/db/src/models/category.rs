//! Category entity model and DTOs.

use dailyspend_core::types::{Date, DbId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table. `user_id = None` is a global category.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_on: Date,
}

impl Category {
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}

/// DTO for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub user_id: Option<DbId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// DTO for updating a category. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
