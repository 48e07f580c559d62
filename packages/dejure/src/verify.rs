//! Integrity checks for annotated text.
//!
//! The service only ever wraps existing text in links to dejure.org. A
//! response is accepted when it is at least as long as the original and,
//! with all dejure.org links replaced by their inner text, identical to
//! the original with the same links stripped.

use std::borrow::Cow;

use regex::Regex;
use std::sync::LazyLock;

use crate::error::IntegrityError;

/// `<a href="http(s)://dejure.org/...">inner</a>`, case-insensitive.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DEJURE_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a href="https?://dejure\.org/[^>]*>([^<]*)</a>"#).expect("valid regex")
});

/// Replace every dejure.org link with its inner text.
///
/// # Examples
/// ```
/// use regelrecht_dejure::verify::strip_dejure_links;
///
/// let linked = r#"<a href="https://dejure.org/gesetze/BGB/433.html">§ 433 BGB</a> regelt den Kauf."#;
/// assert_eq!(strip_dejure_links(linked), "§ 433 BGB regelt den Kauf.");
/// ```
pub fn strip_dejure_links(text: &str) -> Cow<'_, str> {
    DEJURE_LINK_PATTERN.replace_all(text, "$1")
}

/// Check that `candidate` is `original` plus dejure.org links only.
///
/// Lengths are compared in bytes before any content is inspected.
pub fn verify(original: &str, candidate: &str) -> Result<(), IntegrityError> {
    if candidate.len() < original.len() {
        return Err(IntegrityError::Truncated {
            original: original.len(),
            candidate: candidate.len(),
        });
    }

    if strip_dejure_links(original) != strip_dejure_links(candidate) {
        return Err(IntegrityError::ContentMismatch);
    }

    Ok(())
}

/// Boolean form of [`verify`].
pub fn is_valid(original: &str, candidate: &str) -> bool {
    verify(original, candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ORIGINAL: &str = "§ 433 BGB regelt den Kauf.";

    #[test]
    fn test_wide_link_accepted() {
        let candidate = r#"<a href="https://dejure.org/gesetze/BGB/433.html" title="§ 433 BGB: Vertragstypische Pflichten beim Kaufvertrag">§ 433 BGB</a> regelt den Kauf."#;
        assert_eq!(verify(ORIGINAL, candidate), Ok(()));
    }

    #[test]
    fn test_narrow_link_accepted() {
        let candidate =
            r#"§ <a href="https://dejure.org/gesetze/BGB/433.html" class="djo">433</a> BGB regelt den Kauf."#;
        assert!(is_valid(ORIGINAL, candidate));
    }

    #[test]
    fn test_identical_text_accepted() {
        assert!(is_valid(ORIGINAL, ORIGINAL));
    }

    #[test]
    fn test_http_and_uppercase_accepted() {
        let candidate = r#"<A HREF="http://dejure.org/gesetze/BGB/433.html">§ 433 BGB</A> regelt den Kauf."#;
        assert!(is_valid(ORIGINAL, candidate));
    }

    #[test]
    fn test_truncated_rejected() {
        assert_eq!(
            verify(ORIGINAL, "§ 433 BGB"),
            Err(IntegrityError::Truncated {
                original: ORIGINAL.len(),
                candidate: "§ 433 BGB".len(),
            })
        );
    }

    #[test]
    fn test_rewritten_text_rejected() {
        let candidate = r#"<a href="https://dejure.org/gesetze/BGB/433.html">§ 433 BGB</a> regelt den Tausch."#;
        assert_eq!(verify(ORIGINAL, candidate), Err(IntegrityError::ContentMismatch));
    }

    #[test]
    fn test_foreign_link_rejected() {
        let candidate = r#"<a href="https://evil.example/433">§ 433 BGB</a> regelt den Kauf."#;
        assert_eq!(verify(ORIGINAL, candidate), Err(IntegrityError::ContentMismatch));
    }

    #[test]
    fn test_lookalike_domain_rejected() {
        let candidate = r#"<a href="https://dejureXorg/433">§ 433 BGB</a> regelt den Kauf."#;
        assert!(!is_valid(ORIGINAL, candidate));
    }

    #[test]
    fn test_existing_links_in_original() {
        let original = r#"Vgl. <a href="https://dejure.org/gesetze/GG/12.html">Art. 12 GG</a> und § 433 BGB."#;
        let candidate = r#"Vgl. <a href="https://dejure.org/gesetze/GG/12.html">Art. 12 GG</a> und <a href="https://dejure.org/gesetze/BGB/433.html">§ 433 BGB</a>."#;
        assert!(is_valid(original, candidate));
    }

    #[test]
    fn test_strip_keeps_other_markup() {
        let text = r#"<div>This is a <strong>simple</strong> text with <a href="https://dejure.org/x">§ 1 BGB</a>.</div>"#;
        assert_eq!(
            strip_dejure_links(text),
            "<div>This is a <strong>simple</strong> text with § 1 BGB.</div>"
        );
    }
}
