//! Expense entity model, DTOs and aggregate rows.

use dailyspend_core::expense::RecordedExpense;
use dailyspend_core::export::ExportRow;
use dailyspend_core::store::CategoryUsage;
use dailyspend_core::types::{Date, DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `expenses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Expense {
    pub id: DbId,
    pub user_id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub amount: Decimal,
    pub created_on: Date,
    pub image_path: Option<String>,
    pub updated_at: Timestamp,
}

impl From<&Expense> for RecordedExpense {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id,
            user_id: expense.user_id,
            name: expense.name.clone(),
            amount: expense.amount,
            created_on: expense.created_on,
        }
    }
}

/// DTO for inserting an expense. Values are already validated.
#[derive(Debug)]
pub struct CreateExpense {
    pub user_id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub amount: Decimal,
    pub created_on: Date,
}

/// DTO for updating an expense. Owner, category and amount are immutable.
#[derive(Debug, Deserialize)]
pub struct UpdateExpense {
    pub name: Option<String>,
}

/// Per-category aggregate for one user.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryUsageRow {
    pub name: String,
    pub count: i64,
    pub total: Decimal,
}

impl From<CategoryUsageRow> for CategoryUsage {
    fn from(row: CategoryUsageRow) -> Self {
        Self {
            name: row.name,
            count: row.count,
            total: row.total,
        }
    }
}

/// One line of the CSV export.
#[derive(Debug, Clone, FromRow)]
pub struct ExportLine {
    pub user_email: String,
    pub expense_name: String,
    pub amount: Decimal,
    pub category_name: String,
}

impl From<ExportLine> for ExportRow {
    fn from(line: ExportLine) -> Self {
        Self {
            user_email: line.user_email,
            expense_name: line.expense_name,
            amount: line.amount,
            category_name: line.category_name,
        }
    }
}
