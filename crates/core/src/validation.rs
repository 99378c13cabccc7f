//! Input checks applied before contacting the job service.

use crate::error::CoreError;

/// Validate a user-supplied source reference (e.g. a video URL).
///
/// Returns the reference with surrounding whitespace removed. Empty and
/// whitespace-only input is rejected.
pub fn validate_source_reference(source: &str) -> Result<&str, CoreError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "source reference must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_empty_reference_rejected() {
        assert_matches!(validate_source_reference(""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_whitespace_reference_rejected() {
        assert_matches!(
            validate_source_reference("  \t\n "),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn test_reference_is_trimmed() {
        assert_eq!(
            validate_source_reference("  https://youtu.be/abc  ").unwrap(),
            "https://youtu.be/abc"
        );
    }
}
