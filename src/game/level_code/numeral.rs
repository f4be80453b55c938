/// Positional numerals over a custom alphabet.
///
/// Zero encodes as the alphabet's first character and the empty string
/// decodes to zero. The alphabets are part of the level code formats and must
/// not change.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumeralError {
    #[error("'{0}' is not a digit of this numeral alphabet")]
    InvalidDigit(char),
    #[error("'{0}' does not fit in 64 bits")]
    Overflow(String),
}

#[derive(Clone, Copy, Debug)]
pub struct NumeralCodec {
    alphabet: &'static [u8],
}

/// 74 digits used by V3 for sizes and cell values.
pub const V3: NumeralCodec = NumeralCodec::new(b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!$%&+-.=?^{}");

/// 85 digits used by the J1 text variant.
pub const J1: NumeralCodec =
    NumeralCodec::new(b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ,.-_+*#'!\"$%&/()=?[]|{}");

/// Base64 alphabet read as 64 digits; J1 binary writes its sizes with it.
pub const BASE64_DIGITS: NumeralCodec =
    NumeralCodec::new(b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/");

impl NumeralCodec {
    pub const fn new(alphabet: &'static [u8]) -> Self {
        Self { alphabet }
    }

    #[inline]
    pub fn base(&self) -> u64 {
        self.alphabet.len() as u64
    }

    /// Value of a single digit.
    pub fn digit(&self, c: char) -> Result<u64, NumeralError> {
        self.alphabet
            .iter()
            .position(|&b| b as char == c)
            .map(|i| i as u64)
            .ok_or(NumeralError::InvalidDigit(c))
    }

    /// Character for a single digit value (`value < base`).
    #[inline]
    pub fn char_for(&self, value: u64) -> char {
        self.alphabet[value as usize] as char
    }

    pub fn encode(&self, mut value: u64) -> String {
        if value == 0 {
            return self.char_for(0).to_string();
        }
        let base = self.base();
        let mut digits = Vec::new();
        while value > 0 {
            digits.push(self.char_for(value % base));
            value /= base;
        }
        digits.iter().rev().collect()
    }

    pub fn decode(&self, text: &str) -> Result<u64, NumeralError> {
        let base = self.base();
        text.chars().try_fold(0u64, |acc, c| {
            let digit = self.digit(c)?;
            acc.checked_mul(base)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| NumeralError::Overflow(text.to_string()))
        })
    }
}
