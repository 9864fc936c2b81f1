//! Spending statistics for one user.
//!
//! Window totals use a rolling window measured back from "today":
//! an expense counts toward the N-day total when
//! `created_on >= today - N days`. This is intentionally different from the
//! calendar-day total used by the limit evaluator.
//!
//! Category figures are all-time. The most-used ranking orders by expense
//! count descending, then by category name ascending.

use std::collections::BTreeMap;

use chrono::Days;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::store::{CategoryUsage, ExpenseStore, StoreError};
use crate::types::{Date, DbId};

/// Window lengths, in days, reported by [`SpendingStatistics`].
pub const WINDOW_DAYS: [u64; 3] = [1, 7, 30];

/// Aggregate spending figures for one user.
///
/// Empty windows are reported as zero rather than omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpendingStatistics {
    pub last_1_day: Decimal,
    pub last_7_days: Decimal,
    pub last_30_days: Decimal,
    /// Category name to total amount, all time.
    pub expenses_by_category: BTreeMap<String, Decimal>,
    /// Category names, most expenses first.
    pub most_used_categories: Vec<String>,
}

/// Rolling-window totals, in [`WINDOW_DAYS`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    pub last_1_day: Decimal,
    pub last_7_days: Decimal,
    pub last_30_days: Decimal,
}

/// First date included in an N-day window ending `today`.
pub fn window_start(today: Date, days: u64) -> Date {
    today.checked_sub_days(Days::new(days)).unwrap_or(Date::MIN)
}

/// Merge usage rows that share a category name.
///
/// A user's own category and a global one can end up with the same name if
/// the global one is created later; statistics report by name.
fn merge_by_name(usage: Vec<CategoryUsage>) -> BTreeMap<String, (i64, Decimal)> {
    let mut merged: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
    for row in usage {
        let entry = merged.entry(row.name).or_insert((0, Decimal::ZERO));
        entry.0 += row.count;
        entry.1 += row.total;
    }
    merged
}

/// Rank category names by usage count, descending; ties by name ascending.
pub fn rank_most_used(usage: &[CategoryUsage]) -> Vec<String> {
    let merged = merge_by_name(usage.to_vec());
    let mut ranked: Vec<(String, i64)> = merged
        .into_iter()
        .map(|(name, (count, _))| (name, count))
        .collect();
    ranked.sort_by(|(a_name, a_count), (b_name, b_count)| {
        b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
    });
    ranked.into_iter().map(|(name, _)| name).collect()
}

/// Assemble the statistics from window totals and per-category usage.
pub fn build_statistics(windows: WindowTotals, usage: Vec<CategoryUsage>) -> SpendingStatistics {
    let most_used_categories = rank_most_used(&usage);
    let expenses_by_category = merge_by_name(usage)
        .into_iter()
        .map(|(name, (_, total))| (name, total))
        .collect();

    SpendingStatistics {
        last_1_day: windows.last_1_day,
        last_7_days: windows.last_7_days,
        last_30_days: windows.last_30_days,
        expenses_by_category,
        most_used_categories,
    }
}

/// Computes [`SpendingStatistics`] from an [`ExpenseStore`].
///
/// Read-only; every call queries the store afresh.
pub struct StatisticsAggregator<E> {
    store: E,
}

impl<E: ExpenseStore> StatisticsAggregator<E> {
    pub fn new(store: E) -> Self {
        Self { store }
    }

    /// Compute statistics for `user_id` as of `today`.
    ///
    /// Any store failure fails the whole computation; no partial result is
    /// returned.
    pub async fn compute(
        &self,
        user_id: DbId,
        today: Date,
    ) -> Result<SpendingStatistics, StoreError> {
        let [one, seven, thirty] = WINDOW_DAYS;
        let windows = WindowTotals {
            last_1_day: self.window_total(user_id, today, one).await?,
            last_7_days: self.window_total(user_id, today, seven).await?,
            last_30_days: self.window_total(user_id, today, thirty).await?,
        };
        let usage = self.store.category_usage(user_id).await?;

        Ok(build_statistics(windows, usage))
    }

    async fn window_total(
        &self,
        user_id: DbId,
        today: Date,
        days: u64,
    ) -> Result<Decimal, StoreError> {
        self.store
            .sum_between(user_id, window_start(today, days), today)
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
