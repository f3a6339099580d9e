// Checkout
pub mod coupons;
pub mod orders;
pub mod payments;

use std::borrow::Cow;
use validator::ValidationError;

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Rejects empty and whitespace-only strings.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("blank", "must not be blank"));
    }
    Ok(())
}

/// Loose email check: something on both sides of an `@`.
pub(crate) fn email_like(value: &str) -> Result<(), ValidationError> {
    match value.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(field_error("email", "must be a valid email address")),
    }
}
