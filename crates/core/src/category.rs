//! Category naming rules.
//!
//! A user sees their own categories plus the global ones (no owner). Names
//! must be unique within that visible set; the check runs at creation time.

use crate::error::CoreError;
use crate::expense::{validate_name, MAX_NAME_LEN};

/// Maximum length of a category description.
pub const MAX_DESCRIPTION_LEN: usize = MAX_NAME_LEN;

/// Message returned when a user tries to create a name they can already see.
pub const DUPLICATE_CATEGORY_MESSAGE: &str = "You already have this category";

/// Validate a new category's name and description.
///
/// Returns the trimmed name.
pub fn validate_category(name: &str, description: &str) -> Result<String, CoreError> {
    let name = validate_name("Category name", name)?;
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(name)
}

/// Reject `name` if it already appears among the user's visible category names.
///
/// Comparison is exact, matching how names are stored.
pub fn ensure_unique_name<'a, I>(visible: I, name: &str) -> Result<(), CoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    if visible.into_iter().any(|existing| existing == name) {
        return Err(CoreError::Conflict(DUPLICATE_CATEGORY_MESSAGE.into()));
    }
    Ok(())
}
