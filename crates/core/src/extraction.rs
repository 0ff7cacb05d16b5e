//! Recipient extraction types.
//!
//! The extraction itself happens outside the engine; these types describe
//! what is asked for and what comes back.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Extraction cap applied when configuration does not override it.
pub const DEFAULT_MAX_EXTRACTION_COUNT: usize = 1000;

/// Extraction size used when a request omits `max_count`.
pub const DEFAULT_EXTRACTION_COUNT: usize = 100;

/// Which relationship list of the target account to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    #[default]
    Followers,
    Following,
}

impl ExtractionKind {
    /// Key under which the list is returned to the caller.
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionKind::Followers => "followers",
            ExtractionKind::Following => "following",
        }
    }
}

impl std::fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered candidates returned by a recipient source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub kind: ExtractionKind,
    pub recipients: Vec<String>,
    pub requested_max: usize,
}

/// Validate the account whose followers/following are read.
///
/// A leading `@` and surrounding whitespace are dropped. What remains must
/// be a plain handle of ASCII letters, digits, `.` and `_`.
pub fn validate_target_username(username: &str) -> Result<&str, CoreError> {
    let name = username.trim().trim_start_matches('@');
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Target username is required".to_string(),
        ));
    }
    if !name.chars().all(is_handle_char) {
        return Err(CoreError::Validation(
            "Target username may only contain letters, digits, '.' and '_'".to_string(),
        ));
    }
    Ok(name)
}

fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// Clamp a requested extraction size to `1..=cap`.
pub fn clamp_max_count(requested: usize, cap: usize) -> usize {
    requested.clamp(1, cap.max(1))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn kind_deserializes_from_lowercase() {
        let kind: ExtractionKind = serde_json::from_str("\"following\"").unwrap();
        assert_eq!(kind, ExtractionKind::Following);
        assert_eq!(kind.as_str(), "following");
    }

    #[test]
    fn target_username_is_trimmed() {
        assert_eq!(validate_target_username("  @nasa ").unwrap(), "nasa");
    }

    #[test]
    fn blank_target_username_is_rejected() {
        assert_matches!(validate_target_username("  "), Err(CoreError::Validation(_)));
        assert_matches!(validate_target_username("@"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn target_username_with_inner_space_is_rejected() {
        assert_matches!(validate_target_username("a b"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn target_username_with_path_characters_is_rejected() {
        for name in ["x/../../admin", "a?limit=1", "a#b", "a%2Fb", "ni\u{00f1}o"] {
            assert_matches!(
                validate_target_username(name),
                Err(CoreError::Validation(_)),
                "{name} should be rejected"
            );
        }
        assert_eq!(validate_target_username("first.last_99").unwrap(), "first.last_99");
    }

    #[test]
    fn max_count_is_clamped() {
        assert_eq!(clamp_max_count(0, 1000), 1);
        assert_eq!(clamp_max_count(250, 1000), 250);
        assert_eq!(clamp_max_count(5000, 1000), 1000);
    }
}
