//! Cheap pre-check for linkable citations.
//!
//! Texts without a section marker (`§`, `&sect;`) or `Art.` followed by a
//! norm number and a word never reach the cache or the network.

use regex::Regex;
use std::sync::LazyLock;

/// Marker, optional whitespace, numeral, optional lowercase letter,
/// whitespace and a word (e.g. `§ 433 BGB`, `Art. 12a GG`).
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CITATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:§|&sect;|Art\.)\s*[0-9]+\s*[a-z]?\s\w+").expect("valid regex")
});

/// Whether `text` contains at least one citation the service could link.
///
/// # Examples
/// ```
/// use regelrecht_dejure::detect::has_citation;
///
/// assert!(has_citation("Siehe § 433 BGB."));
/// assert!(!has_citation("Kein Verweis auf Normen."));
/// ```
pub fn has_citation(text: &str) -> bool {
    CITATION_PATTERN.is_match(text)
}
