//! ISO-3166 alpha-2 country codes.

use core::fmt;
use core::str;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountryCodeError {
    /// The input is not exactly two characters.
    #[error("country code must be exactly 2 letters, got {0:?}")]
    WrongLength(String),
    /// The input contains non-alphabetic characters.
    #[error("country code must contain only letters, got {0:?}")]
    NotAlphabetic(String),
}

/// An ISO-3166 alpha-2 country code, normalized to uppercase.
///
/// Parsing is strict: exactly two ASCII letters, any case. Anything else is
/// rejected as invalid input rather than silently matching nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Parse a country code, trimming whitespace and normalizing to uppercase.
    ///
    /// # Errors
    ///
    /// Returns [`CountryCodeError`] if the input is not exactly two ASCII
    /// letters.
    pub fn parse(input: &str) -> Result<Self, CountryCodeError> {
        let trimmed = input.trim();
        let mut bytes = trimmed.bytes();
        let (Some(a), Some(b), None) = (bytes.next(), bytes.next(), bytes.next()) else {
            return Err(CountryCodeError::WrongLength(trimmed.to_owned()));
        };
        if !a.is_ascii_alphabetic() || !b.is_ascii_alphabetic() {
            return Err(CountryCodeError::NotAlphabetic(trimmed.to_owned()));
        }
        Ok(Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
    }

    /// The two-letter uppercase code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Invariant: bytes are ASCII uppercase letters.
        str::from_utf8(&self.0).unwrap_or("")
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.as_str().to_owned()
    }
}
