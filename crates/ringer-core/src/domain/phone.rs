//! Phone numbers in international format (`+` + country code + subscriber digits).
//!
//! Validation happens once, at construction. Everything downstream (requests,
//! outcomes, backends) takes a `PhoneNumber` and never re-checks the string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest number we accept, counting country code digits.
pub const MIN_DIGITS: usize = 7;

/// E.164 upper bound.
pub const MAX_DIGITS: usize = 15;

/// Why a string was rejected as a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneNumberError {
    #[error("phone number is empty")]
    Empty,

    #[error("phone number must start with '+'")]
    MissingPlus,

    #[error("phone number contains non-digit character {0:?}")]
    NonDigit(char),

    #[error("country code cannot start with 0")]
    LeadingZero,

    #[error("phone number has {0} digits, at least 7 required")]
    TooShort(usize),

    #[error("phone number has {0} digits, at most 15 allowed")]
    TooLong(usize),
}

/// A validated international phone number, e.g. `+15551234567`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, PhoneNumberError> {
        if raw.is_empty() {
            return Err(PhoneNumberError::Empty);
        }
        let Some(digits) = raw.strip_prefix('+') else {
            return Err(PhoneNumberError::MissingPlus);
        };
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit()) {
            return Err(PhoneNumberError::NonDigit(bad));
        }
        if digits.starts_with('0') {
            return Err(PhoneNumberError::LeadingZero);
        }
        match digits.len() {
            n if n < MIN_DIGITS => Err(PhoneNumberError::TooShort(n)),
            n if n > MAX_DIGITS => Err(PhoneNumberError::TooLong(n)),
            _ => Ok(Self(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits after the leading `+`.
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }
}

impl FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
