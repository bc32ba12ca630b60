//! Mobile phone number type.
//!
//! The M-PESA gateway expects numbers in international format without a
//! leading `+` (e.g. `254712345678`). [`Msisdn::parse`] normalizes common
//! local spellings into that format.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Kenyan country calling code, substituted for a leading `0`.
const COUNTRY_CODE: &str = "254";

/// Errors that can occur when parsing an [`Msisdn`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MsisdnError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains a non-digit character after normalization.
    #[error("phone number must contain only digits")]
    NonNumeric,
    /// The normalized number has an implausible length.
    #[error("phone number has invalid length {len}")]
    BadLength {
        /// Length of the normalized digit string.
        len: usize,
    },
}

/// A mobile subscriber number in international format.
///
/// ## Normalization
///
/// - A leading `+` is stripped: `+254712345678` becomes `254712345678`.
/// - A leading `0` is replaced with the country code: `0712345678` becomes
///   `254712345678`.
/// - Anything else is taken as already international.
///
/// ## Examples
///
/// ```
/// use soko_core::Msisdn;
///
/// assert_eq!(Msisdn::parse("0712345678").unwrap().as_str(), "254712345678");
/// assert_eq!(Msisdn::parse("+254712345678").unwrap().as_str(), "254712345678");
/// assert!(Msisdn::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Msisdn(String);

impl Msisdn {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains non-digit
    /// characters, or has an implausible length once normalized.
    pub fn parse(s: &str) -> Result<Self, MsisdnError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MsisdnError::Empty);
        }

        let digits = if let Some(rest) = s.strip_prefix('+') {
            rest.to_owned()
        } else if let Some(rest) = s.strip_prefix('0') {
            format!("{COUNTRY_CODE}{rest}")
        } else {
            s.to_owned()
        };

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MsisdnError::NonNumeric);
        }

        let len = digits.len();
        if !(9..=15).contains(&len) {
            return Err(MsisdnError::BadLength { len });
        }

        Ok(Self(digits))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Msisdn` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Msisdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Msisdn {
    type Err = MsisdnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Msisdn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
