//! Field validation for client registration.
//!
//! Every check returns [`SubvaultError::Validation`]; callers collecting
//! input interactively ask again instead of aborting.

use crate::SubvaultError;

/// Minimum email length in characters.
pub const MIN_EMAIL_LEN: usize = 6;

/// Exact card number length in digits.
pub const CARD_NUMBER_LEN: usize = 16;

fn invalid(field: &'static str, reason: impl Into<String>) -> SubvaultError {
    SubvaultError::Validation {
        field,
        reason: reason.into(),
    }
}

/// Check an email address.
///
/// Accepts at least six characters with an `@`, a `.` at least two
/// positions after the `@`, and no spaces.
pub fn validate_email(email: &str) -> Result<(), SubvaultError> {
    if email.trim().is_empty() {
        return Err(invalid("email", "cannot be empty"));
    }
    if email.contains(char::is_whitespace) {
        return Err(invalid("email", "cannot contain spaces"));
    }
    let at = email
        .find('@')
        .ok_or_else(|| invalid("email", "must contain '@'"))?;
    if email.chars().count() < MIN_EMAIL_LEN {
        return Err(invalid(
            "email",
            format!("must be at least {} characters", MIN_EMAIL_LEN),
        ));
    }
    if !email.char_indices().any(|(i, c)| c == '.' && i >= at + 2) {
        return Err(invalid(
            "email",
            "must have a '.' at least two positions after '@'",
        ));
    }
    Ok(())
}

/// Check a card number: exactly sixteen ASCII digits.
pub fn validate_card_number(card_number: &str) -> Result<(), SubvaultError> {
    if card_number.trim().is_empty() {
        return Err(invalid("card number", "cannot be empty"));
    }
    if card_number.len() != CARD_NUMBER_LEN || !card_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(
            "card number",
            format!("must be {} digits without spaces", CARD_NUMBER_LEN),
        ));
    }
    Ok(())
}

/// Check a required name part and return it trimmed.
pub fn validate_name_part(field: &'static str, value: &str) -> Result<String, SubvaultError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(field, "cannot be empty"));
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return Err(invalid(field, "may only contain letters and spaces"));
    }
    Ok(trimmed.to_string())
}

/// Check an optional name part. Blank input is `Ok(None)`.
pub fn validate_optional_name_part(
    field: &'static str,
    value: &str,
) -> Result<Option<String>, SubvaultError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    validate_name_part(field, value).map(Some)
}

/// Join the non-empty name parts with single spaces.
pub fn compose_full_name<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
