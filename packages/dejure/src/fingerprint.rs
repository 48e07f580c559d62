//! Content-addressed cache keys.

use std::fmt;

use sha2::{Digest, Sha256};

/// Cache key derived from a text: its byte length followed by the
/// hex-encoded SHA-256 digest of its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of `text`.
    ///
    /// # Examples
    /// ```
    /// use regelrecht_dejure::fingerprint::Fingerprint;
    ///
    /// let fp = Fingerprint::of("§ 433 BGB");
    /// assert!(fp.as_str().starts_with("10"));
    /// assert_eq!(fp, Fingerprint::of("§ 433 BGB"));
    /// ```
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(format!("{}{}", text.len(), hex::encode(digest)))
    }

    /// The key as stored in a cache.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // SHA-256 of the empty string
        assert_eq!(
            Fingerprint::of("").as_str(),
            "0e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_deterministic() {
        let text = "§ 433 BGB regelt den Kauf.";
        assert_eq!(Fingerprint::of(text), Fingerprint::of(text));
    }

    #[test]
    fn test_single_character_change() {
        let a = Fingerprint::of("§ 433 BGB regelt den Kauf.");
        let b = Fingerprint::of("§ 434 BGB regelt den Kauf.");
        let c = Fingerprint::of("§ 433 BGB regelt den Kauf!");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_length_prefix_uses_bytes() {
        // "§" is two bytes in UTF-8
        let fp = Fingerprint::of("§");
        assert!(fp.as_str().starts_with('2'));
        assert_eq!(fp.as_str().len(), 1 + 64);
    }
}
