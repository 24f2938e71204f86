//! Kenyan M-Pesa phone number validation and normalization.
//!
//! The canonical form is twelve digits: the country code `254` followed by a
//! nine-digit subscriber number. Input arrives from a form field, so parsing
//! first strips every non-digit character (`+254 712-345-678` and
//! `254712345678` are the same number) and then accepts three shapes:
//!
//! - `254XXXXXXXXX`: already canonical
//! - `07XXXXXXXX`: local form with the leading trunk zero
//! - `7XXXXXXXX`: bare subscriber number
//!
//! Everything else is rejected. Validation is syntactic only; no carrier or
//! registry lookup happens here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kenyan country calling code.
const COUNTRY_CODE: &str = "254";

/// Canonical length: country code plus nine subscriber digits.
const CANONICAL_LEN: usize = 12;

/// Returned when an input cannot be normalized to a Kenyan mobile number.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("not a valid Kenyan mobile number: {input:?}")]
pub struct PhoneError {
    /// The rejected input, as typed.
    pub input: String,
}

/// A validated Kenyan mobile number in canonical `254XXXXXXXXX` form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a user-supplied phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] when the input does not normalize to a Kenyan
    /// mobile number.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();

        let canonical = if digits.len() == CANONICAL_LEN && digits.starts_with(COUNTRY_CODE) {
            digits
        } else if digits.len() == 10 && digits.starts_with("07") {
            format!("{COUNTRY_CODE}{}", &digits[1..])
        } else if digits.len() == 9 && digits.starts_with('7') {
            format!("{COUNTRY_CODE}{digits}")
        } else {
            return Err(PhoneError {
                input: input.to_owned(),
            });
        };

        Ok(Self(canonical))
    }

    /// Whether `input` normalizes to a valid number.
    #[must_use]
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    /// The canonical twelve-digit form, e.g. `254712345678`.
    #[must_use]
    pub fn as_digits(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    /// Formats for display with the international prefix, e.g.
    /// `+254712345678`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+{}", self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}
