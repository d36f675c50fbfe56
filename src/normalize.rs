//! Default text normalizer.

use regex::Regex;

use crate::error::Result;

/// `normalize_text` lower-cases `text` and collapses every whitespace run into a single space.
///
/// Punctuation is left attached to its token, so `"Mat."` becomes `"mat."`.
///
/// # Errors
///
/// Returns error if an invalid expression is given to `regex::Regex::new`.
///
/// # Example
///
/// ```
/// use noisy_spell::normalize_text;
///
/// fn main() -> Result<(), anyhow::Error> {
///     assert_eq!(normalize_text("  A  Dat\tsat.\n")?, "a dat sat.");
///     Ok(())
/// }
/// ```
pub fn normalize_text(text: &str) -> Result<String> {
    let lowered = text.to_lowercase();
    let collapsed = Regex::new(r"\s+")?.replace_all(lowered.trim(), " ");
    Ok(collapsed.into_owned())
}

/// `tokens` splits normalized text on single spaces.
#[must_use]
pub fn tokens(text: &str) -> Vec<&str> {
    text.split(' ').filter(|token| !token.is_empty()).collect()
}

/// `is_correctable` reports whether a token is purely alphabetic and thus eligible for correction.
#[must_use]
pub fn is_correctable(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_text("His  VOLLEY\nacress").unwrap(), "his volley acress");
        assert_eq!(normalize_text("").unwrap(), "");
        assert_eq!(normalize_text(" \t ").unwrap(), "");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("a dat sat."), vec!["a", "dat", "sat."]);
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_is_correctable() {
        assert!(is_correctable("dat"));
        assert!(!is_correctable("mat."));
        assert!(!is_correctable("42"));
        assert!(!is_correctable(""));
    }
}
