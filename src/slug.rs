//! URL slug creation

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[^a-z0-9]+").expect("slug pattern is valid"))
}

/// Turn arbitrary text into a lowercase, dash-separated slug
///
/// Every run of characters outside `[a-z0-9]` (after lowercasing) becomes a
/// single `-`; leading and trailing dashes are trimmed. Non-ASCII letters are
/// dropped, not transliterated.
///
/// # Examples
/// ```
/// assert_eq!(toolbox::slugify("Now is the time for all GOOD+=").unwrap(), "now-is-the-time-for-all-good");
/// ```
pub fn slugify(text: &str) -> Result<String> {
    if text.is_empty() {
        return Err(Error::EmptyInput);
    }

    let lowered = text.to_lowercase();
    let slug = separator_pattern()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();

    if slug.is_empty() {
        return Err(Error::EmptyResult);
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        let cases = [
            ("valid string", "now is the time", "now-is-the-time"),
            (
                "complex string",
                "Now is the time for all GOOD+=",
                "now-is-the-time-for-all-good",
            ),
            ("japanese and roman", "helloハローワールド", "hello"),
            ("digits kept", "Rust 2021 Edition!", "rust-2021-edition"),
            ("leading junk", "--__hello__--", "hello"),
            ("interior run", "a&&&b", "a-b"),
        ];

        for (name, input, expected) in cases {
            assert_eq!(slugify(input).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(slugify(""), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_nothing_survives() {
        assert!(matches!(slugify("ハローワールド"), Err(Error::EmptyResult)));
        assert!(matches!(slugify("+=!?"), Err(Error::EmptyResult)));
        assert!(matches!(slugify("   "), Err(Error::EmptyResult)));
    }

    #[test]
    fn test_unicode_digits_are_not_kept() {
        // Arabic-Indic digits are digits to Unicode but not to the slug alphabet
        assert_eq!(slugify("abc٣").unwrap(), "abc");
    }
}
