//! Structural validation for provider JSON.
//!
//! serde enforces field presence and primitive types; `Validate` enforces the
//! value-level rules serde cannot express (ranges, non-empty text, enum coercion).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Implemented by every typed provider response.
pub trait Validate: Sized {
    fn validate(self) -> Result<Self, ValidationError>;
}

/// Rejects blank strings.
pub fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// Rejects values outside `min..=max`.
pub fn require_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("{value} is outside {min}..={max}"),
        ));
    }
    Ok(())
}
