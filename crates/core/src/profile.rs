//! User profile rules: regions, passwords and the daily limit setting.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::expense::AMOUNT_SCALE;

/// Limit assigned to every new user.
pub const DEFAULT_DAILY_LIMIT: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// Largest configurable daily limit.
pub const MAX_DAILY_LIMIT: Decimal = Decimal::from_parts(99_999, 0, 0, false, 0);

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Regions a user may pick. The empty string means "not specified".
pub const REGIONS: &[&str] = &["Europe", "Asia", "America"];

/// Validate a region value.
pub fn validate_region(region: &str) -> Result<(), CoreError> {
    if region.is_empty() || REGIONS.contains(&region) {
        return Ok(());
    }
    Err(CoreError::Validation(format!(
        "Region must be one of: {}",
        REGIONS.join(", ")
    )))
}

/// Validate a user-chosen daily limit.
///
/// Zero is allowed and means every day's first expense triggers a
/// notification.
pub fn validate_daily_limit(limit: Decimal) -> Result<Decimal, CoreError> {
    if limit < Decimal::ZERO || limit > MAX_DAILY_LIMIT {
        return Err(CoreError::Validation(format!(
            "Daily expenses limit must be between 0 and {MAX_DAILY_LIMIT}"
        )));
    }
    if limit.normalize().scale() > AMOUNT_SCALE {
        return Err(CoreError::Validation(format!(
            "Daily expenses limit must have at most {AMOUNT_SCALE} decimal places"
        )));
    }
    Ok(limit)
}

/// Minimal sanity check on an email address; full parsing happens at send time.
pub fn validate_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(CoreError::Validation("Invalid email address".into()));
    }
    Ok(email.to_lowercase())
}

/// Validate that a password meets the minimum length.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}
