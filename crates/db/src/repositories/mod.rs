//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod category_repo;
pub mod expense_repo;
pub mod user_repo;

pub use category_repo::CategoryRepo;
pub use expense_repo::ExpenseRepo;
pub use user_repo::UserRepo;
