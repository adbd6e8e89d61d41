//! Head name validation.
//!
//! A head lives at `h/<name>` with the name occupying the entire key
//! suffix, so the rules come from the key namespace itself rather than any
//! richer naming scheme: a name must be non-empty, must not smuggle
//! whitespace or control characters into keys and log lines, and must keep
//! every `/`-separated segment non-empty, since `h//x` or a trailing `/`
//! would not survive the prefix-scan round trip unchanged.

use crate::error::{AddressError, AddressResult};

fn invalid(name: &str, reason: impl Into<String>) -> AddressError {
    AddressError::InvalidHeadName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a head name for embedding in a store key.
///
/// Nested names such as `release/v2` are allowed; the segments between
/// slashes may use any printable characters.
///
/// # Examples
///
/// ```
/// use cask_types::names::validate_head_name;
///
/// assert!(validate_head_name("main").is_ok());
/// assert!(validate_head_name("release/v2").is_ok());
/// assert!(validate_head_name("").is_err());
/// assert!(validate_head_name("a//b").is_err());
/// ```
pub fn validate_head_name(name: &str) -> AddressResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "head name is empty"));
    }
    if let Some(ch) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(
            name,
            format!("contains whitespace or control character {ch:?}"),
        ));
    }
    if name.split('/').any(str::is_empty) {
        return Err(invalid(name, "empty segment around '/'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_dotted_names_are_valid() {
        for name in ["main", "staging", "v1.0", "scratch-2026"] {
            assert!(validate_head_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn nested_names_are_valid() {
        assert!(validate_head_name("release/v2").is_ok());
        assert!(validate_head_name("user/alice/scratch").is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(validate_head_name("").is_err());
    }

    #[test]
    fn whitespace_cannot_reach_a_key() {
        assert!(validate_head_name("has space").is_err());
        assert!(validate_head_name("has\ttab").is_err());
        assert!(validate_head_name("two\nlines").is_err());
    }

    #[test]
    fn control_characters_cannot_reach_a_key() {
        assert!(validate_head_name("bell\u{7}").is_err());
        assert!(validate_head_name("nul\u{0}byte").is_err());
    }

    #[test]
    fn empty_segments_break_key_roundtrips() {
        assert!(validate_head_name("a//b").is_err());
        assert!(validate_head_name("/leading").is_err());
        assert!(validate_head_name("trailing/").is_err());
        assert!(validate_head_name("/").is_err());
    }

    #[test]
    fn rejection_reports_the_offending_name() {
        let err = validate_head_name("has space").unwrap_err();
        assert!(matches!(
            err,
            AddressError::InvalidHeadName { ref name, .. } if name == "has space"
        ));
    }
}
