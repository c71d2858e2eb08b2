pub mod email;
pub mod list;

use crate::error::resource::{ValidationErrorKind, ValidationFieldError};

/// Rejects blank strings.
pub fn require_text(value: &str, type_id: &'static str, path: &str) -> Option<ValidationFieldError> {
    if !value.trim().is_empty() {
        return None;
    }

    Some(ValidationFieldError::new(
        type_id,
        value.into(),
        path.into(),
        vec![ValidationErrorKind::Required],
    ))
}

pub fn require_non_negative(
    value: i32,
    type_id: &'static str,
    path: &str,
) -> Option<ValidationFieldError> {
    if value >= 0 {
        return None;
    }

    Some(ValidationFieldError::new(
        type_id,
        value.to_string(),
        path.into(),
        vec![ValidationErrorKind::Minimum(0)],
    ))
}
