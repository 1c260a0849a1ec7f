//! Internal helpers for input normalization and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation applies the same rules.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidArgument(format!("invalid {label} id")))
}

/// Trim and NFC-normalize a required display name.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}

/// Trim optional free text, mapping blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.nfc().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_composed() {
        assert_eq!(
            normalize_required_name("  Cafe\u{0301} ", "name").unwrap(),
            "Caf\u{00e9}"
        );
        assert!(normalize_required_name("   ", "name").is_err());
    }

    #[test]
    fn blank_optional_text_is_none() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(
            normalize_optional_text(Some(" rooftop ")),
            Some("rooftop".to_string())
        );
    }

    #[test]
    fn bad_ids_are_invalid_arguments() {
        assert!(matches!(
            parse_uuid("nope", "book"),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
