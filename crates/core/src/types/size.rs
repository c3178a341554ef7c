//! Size variant selector.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// The input is empty or whitespace.
    #[error("size cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("size must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A size label such as `"M"` or `"42"`.
///
/// Together with the product ID it forms the identity key of a cart line
/// item. Comparison is exact after trimming surrounding whitespace, so `"M"`
/// and `"m"` are different sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Size(String);

impl Size {
    /// Maximum size label length in characters.
    pub const MAX_LENGTH: usize = 32;

    /// Parse and validate a size label.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError`] if the label is blank or too long.
    pub fn parse(s: &str) -> Result<Self, SizeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SizeError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(SizeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Size {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Size {
    type Error = SizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.0
    }
}

impl AsRef<str> for Size {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(Size::parse(" M ").unwrap().as_str(), "M");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Size::parse(""), Err(SizeError::Empty));
        assert_eq!(Size::parse("   "), Err(SizeError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        assert!(matches!(
            Size::parse(&"X".repeat(33)),
            Err(SizeError::TooLong { max: 32 })
        ));
    }

    #[test]
    fn test_case_sensitive() {
        assert_ne!(Size::parse("M").unwrap(), Size::parse("m").unwrap());
    }
}
