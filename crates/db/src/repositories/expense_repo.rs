//! Repository for the `expenses` table, including the aggregate queries
//! behind statistics and limit evaluation.

use dailyspend_core::types::{Date, DbId};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::expense::{CategoryUsageRow, CreateExpense, Expense, ExportLine};

/// Column list for `expenses` queries.
const COLUMNS: &str = "id, user_id, category_id, name, amount, created_on, image_path, updated_at";

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Provides CRUD and aggregate queries for expenses.
pub struct ExpenseRepo;

impl ExpenseRepo {
    /// Insert an expense, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateExpense) -> Result<Expense, sqlx::Error> {
        let query = format!(
            "INSERT INTO expenses (user_id, category_id, name, amount, created_on)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Expense>(&query)
            .bind(input.user_id)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(input.amount)
            .bind(input.created_on)
            .fetch_one(pool)
            .await
    }

    /// Find an expense by ID, scoped to its owner.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Expense>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM expenses WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Expense>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's expenses ordered by ID.
    ///
    /// With `search`, keeps rows whose name, creation date or amount contains
    /// the text (case-insensitive).
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        search: Option<&str>,
    ) -> Result<Vec<Expense>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM expenses
             WHERE user_id = $1
               AND ($2::TEXT IS NULL
                    OR name ILIKE $2
                    OR created_on::TEXT LIKE $2
                    OR amount::TEXT LIKE $2)
             ORDER BY id"
        );
        sqlx::query_as::<_, Expense>(&query)
            .bind(user_id)
            .bind(search.map(like_pattern))
            .fetch_all(pool)
            .await
    }

    /// Rename an expense owned by `user_id`.
    ///
    /// Returns `None` if the row does not exist or is not owned by the user.
    pub async fn update_name(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        name: &str,
    ) -> Result<Option<Expense>, sqlx::Error> {
        let query = format!(
            "UPDATE expenses SET name = $3, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Expense>(&query)
            .bind(id)
            .bind(user_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Delete an expense owned by `user_id`. Returns `true` if deleted.
    pub async fn delete_for_user(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sum of a user's amounts with `from <= created_on <= to`. Zero if none.
    pub async fn sum_between(
        pool: &PgPool,
        user_id: DbId,
        from: Date,
        to: Date,
    ) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0.00) FROM expenses
             WHERE user_id = $1 AND created_on BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await
    }

    /// Count and total of a user's expenses per category, all time.
    pub async fn category_usage(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<CategoryUsageRow>, sqlx::Error> {
        sqlx::query_as::<_, CategoryUsageRow>(
            "SELECT c.name AS name, COUNT(*) AS count, SUM(e.amount) AS total
             FROM expenses e
             JOIN categories c ON c.id = e.category_id
             WHERE e.user_id = $1
             GROUP BY c.id, c.name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Rows for the CSV export, ordered by expense ID.
    pub async fn export_lines(pool: &PgPool, user_id: DbId) -> Result<Vec<ExportLine>, sqlx::Error> {
        sqlx::query_as::<_, ExportLine>(
            "SELECT u.email AS user_email, e.name AS expense_name, e.amount AS amount,
                    c.name AS category_name
             FROM expenses e
             JOIN users u ON u.id = e.user_id
             JOIN categories c ON c.id = e.category_id
             WHERE e.user_id = $1
             ORDER BY e.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
