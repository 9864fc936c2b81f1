//! Daily spending limit rule and its notification dedup state.
//!
//! The rule works on calendar days: the total is the sum of the user's
//! expenses dated the same day as the triggering expense. At most one
//! notification goes out per user per day; `last_notified_date` records the
//! day of the last one actually sent.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::expense::RecordedExpense;
use crate::notifier::OutgoingMessage;
use crate::types::{Date, DbId};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The slice of a user profile the limit rule reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitProfile {
    pub user_id: DbId,
    pub email: String,
    pub daily_limit: Decimal,
    pub last_notified_date: Option<Date>,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Result of applying the limit rule to a day's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitDecision {
    /// The day's total is below the limit.
    UnderLimit,
    /// Over the limit, but this day's notification was already sent.
    AlreadyNotified,
    /// Over the limit and not yet notified today.
    Notify,
}

/// Apply the limit rule.
///
/// Notifies iff `daily_total >= daily_limit` and the dedup state has not
/// already recorded `day`. The comparison is inclusive, so a total exactly
/// equal to the limit notifies; a limit of zero or below notifies on the
/// first expense of every day.
pub fn evaluate_limit(
    daily_total: Decimal,
    daily_limit: Decimal,
    dedup: DedupState,
    day: Date,
) -> LimitDecision {
    if daily_total < daily_limit {
        LimitDecision::UnderLimit
    } else if !dedup.allows(day) {
        LimitDecision::AlreadyNotified
    } else {
        LimitDecision::Notify
    }
}

// ---------------------------------------------------------------------------
// Dedup state
// ---------------------------------------------------------------------------

/// `last_notified_date` as a value with its transition rules.
///
/// The date only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupState {
    last_notified: Option<Date>,
}

impl DedupState {
    pub fn new(last_notified: Option<Date>) -> Self {
        Self { last_notified }
    }

    pub fn last_notified(&self) -> Option<Date> {
        self.last_notified
    }

    /// Whether a notification for `day` may still be sent.
    pub fn allows(&self, day: Date) -> bool {
        self.last_notified != Some(day)
    }

    /// Record a notification sent for `day`.
    ///
    /// Returns `false` and leaves the state untouched when `day` is not after
    /// the stored date.
    pub fn advance(&mut self, day: Date) -> bool {
        match self.last_notified {
            Some(current) if current >= day => false,
            _ => {
                self.last_notified = Some(day);
                true
            }
        }
    }
}

impl From<&LimitProfile> for DedupState {
    fn from(profile: &LimitProfile) -> Self {
        Self::new(profile.last_notified_date)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Build the limit-reached message for `expense`.
///
/// Sent to the operator first, then to the user.
pub fn limit_message(
    expense: &RecordedExpense,
    daily_limit: Decimal,
    operator_email: &str,
    user_email: &str,
) -> OutgoingMessage {
    OutgoingMessage {
        subject: format!("Passed the limit with {}", expense.name),
        body: format!(
            "You just bought {} and you got to the limit per day of {}!",
            expense.name,
            daily_limit.normalize()
        ),
        recipients: vec![operator_email.to_string(), user_email.to_string()],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
