use email_address::EmailAddress;

use crate::errors::{ValidationError, ValidationIssue};

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Checks a required free-text field, collecting an issue when it is blank.
pub fn require_text(field: &str, value: &str, issues: &mut Vec<ValidationIssue>) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::new(field, "validation.required", format!("{field} must not be empty")));
    }
}

/// Turns collected issues into a result.
pub fn finish(issues: Vec<ValidationIssue>) -> Result<(), ValidationError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(issues))
    }
}
