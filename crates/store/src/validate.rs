//! Field validation shared by all store backends.
//!
//! The error messages here are surfaced to the user verbatim by the tool
//! executor, so they are phrased as user-facing sentences.

use lodestar_core::error::StoreError;

/// Validate and normalize an entity title: trimmed, 3–200 characters.
pub(crate) fn validate_title(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < 3 {
        return Err(StoreError::Validation(
            "Title must be at least 3 characters".into(),
        ));
    }
    if trimmed.chars().count() > 200 {
        return Err(StoreError::Validation(
            "Title must be less than 200 characters".into(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a milestone progress percentage.
pub(crate) fn validate_progress(progress: u8) -> Result<u8, StoreError> {
    if progress > 100 {
        return Err(StoreError::Validation(
            "Progress must be between 0 and 100".into(),
        ));
    }
    Ok(progress)
}

/// Normalize an optional free-text field: trimmed, empty collapsed to None.
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
