//! Expense validation rules and the snapshot handed to the limit evaluator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, DbId};

/// Maximum length of an expense or category name.
pub const MAX_NAME_LEN: usize = 255;

/// Amounts carry exactly two decimal places.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount a single expense may record (7 significant digits).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, AMOUNT_SCALE);

/// A freshly persisted expense, as seen by the limit evaluator.
///
/// Only the fields the limit rule and the notification message need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedExpense {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub amount: Decimal,
    pub created_on: Date,
}

/// Validate and normalise an expense (or category) name.
///
/// Returns the trimmed name.
pub fn validate_name(field: &str, name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an expense amount.
///
/// The amount must be strictly positive, have at most two decimal places and
/// fit within [`MAX_AMOUNT`]. Returns the amount rescaled to two places.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "Amount must be greater than zero".into(),
        ));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(CoreError::Validation(format!(
            "Amount must have at most {AMOUNT_SCALE} decimal places"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(CoreError::Validation(format!(
            "Amount must not exceed {MAX_AMOUNT}"
        )));
    }
    let mut scaled = amount;
    scaled.rescale(AMOUNT_SCALE);
    Ok(scaled)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn name_is_trimmed() {
        assert_eq!(validate_name("Expense name", "  Coffee ").unwrap(), "Coffee");
    }

    #[test]
    fn blank_name_rejected() {
        assert_matches!(
            validate_name("Expense name", "   "),
            Err(CoreError::Validation(msg)) if msg.contains("must not be empty")
        );
    }

    #[test]
    fn overlong_name_rejected() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name("Expense name", &name).is_err());
        assert!(validate_name("Expense name", &name[1..]).is_ok());
    }

    #[test]
    fn amount_rescaled_to_two_places() {
        let amount = validate_amount(dec!(12.5)).unwrap();
        assert_eq!(amount.to_string(), "12.50");
    }

    #[test]
    fn trailing_zeros_beyond_scale_are_accepted() {
        assert_eq!(validate_amount(dec!(3.100)).unwrap(), dec!(3.10));
    }

    #[test]
    fn zero_and_negative_amounts_rejected() {
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(dec!(-4.20)).is_err());
    }

    #[test]
    fn three_decimal_places_rejected() {
        assert_matches!(
            validate_amount(dec!(1.005)),
            Err(CoreError::Validation(msg)) if msg.contains("decimal places")
        );
    }

    #[test]
    fn amount_upper_bound() {
        assert_eq!(MAX_AMOUNT, dec!(99999.99));
        assert!(validate_amount(dec!(99999.99)).is_ok());
        assert!(validate_amount(dec!(100000.00)).is_err());
    }
}
