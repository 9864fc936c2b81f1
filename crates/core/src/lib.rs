//! Domain logic for the dailyspend expense tracker.
//!
//! - [`limits`] and [`evaluator`]: the daily spending limit rule, its dedup
//!   state, and the service that runs it after each expense.
//! - [`statistics`]: rolling-window totals and category breakdowns.
//! - [`store`] and [`notifier`]: the seams the services depend on.

pub mod category;
pub mod error;
pub mod evaluator;
pub mod expense;
pub mod export;
pub mod limits;
pub mod notifier;
pub mod profile;
pub mod statistics;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;
