//! Character-set validation of gateway fields.
//!
//! The gateway rejects any key or value containing a character outside its
//! allowed set, so fields are checked before anything is sent.

use std::fmt;

use crate::domain::Fields;

/// ASCII punctuation accepted by the gateway, including space.
pub const ALLOWED_PUNCTUATION: &str = "@:,{}\"#^[]*'\\/-_.$?+();|! ~";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Whether the gateway accepts `ch` in a field key or value.
///
/// Besides ASCII letters, digits and [`ALLOWED_PUNCTUATION`], the Latin-1
/// accented letters U+00C0..=U+00FF are accepted, except the multiplication
/// and division signs that sit in that block.
pub fn is_allowed_char(ch: char) -> bool {
    match ch {
        'A'..='Z' | 'a'..='z' | '0'..='9' => true,
        '\u{00D7}' | '\u{00F7}' => false,
        '\u{00C0}'..='\u{00FF}' => true,
        _ => ALLOWED_PUNCTUATION.contains(ch),
    }
}

fn first_forbidden(value: &str) -> Option<char> {
    value.chars().find(|ch| !is_allowed_char(*ch))
}

/// Checks one key and its value.
pub fn validate_field(key: &str, value: &str) -> ValidationResult {
    if let Some(ch) = first_forbidden(key) {
        return Err(ValidationError::new(
            key,
            format!("key contains invalid character {:?}", ch),
        ));
    }

    if let Some(ch) = first_forbidden(value) {
        return Err(ValidationError::new(
            key,
            format!("value contains invalid character {:?}", ch),
        ));
    }

    Ok(())
}

/// Checks every key and value, failing on the first forbidden character.
pub fn validate_fields(fields: &Fields) -> ValidationResult {
    fields
        .iter()
        .try_for_each(|(key, value)| validate_field(key, value))
}

pub fn validate_required(fields: &Fields, key: &str) -> ValidationResult {
    match fields.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::new(key, "must not be empty")),
    }
}
