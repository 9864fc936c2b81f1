/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Expenses are recorded with day granularity.
pub type Date = chrono::NaiveDate;

/// Current calendar date in UTC.
///
/// Expense creation dates and the statistics "today" both come from here so
/// the limit evaluator and the aggregator agree on what a day is.
pub fn today_utc() -> Date {
    chrono::Utc::now().date_naive()
}
