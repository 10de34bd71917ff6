//! Token amounts in atomic units.
//!
//! Amounts travel as decimal digit strings end to end. Upstream values can
//! exceed `u128` (an unlimited allowance is `2^256 - 1`), so the client never
//! parses them into a machine integer and never rounds them. Conversion to
//! and from human-readable amounts is a caller concern; [`parse_units`] and
//! [`format_units`] do it exactly using a token's `decimals`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Non-negative integer amount in a token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AtomicAmount(String);

impl AtomicAmount {
    /// Parses a decimal digit string, kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParameters`] if the string is empty or
    /// contains anything other than ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClientError::InvalidParameters(format!(
                "amount {raw:?} must be a non-negative integer string"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Parses an amount that must be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidParameters`] if the string is not a
    /// digit string or is zero.
    pub fn parse_positive(raw: &str) -> Result<Self, ClientError> {
        let amount = Self::parse(raw)?;
        if amount.is_zero() {
            return Err(ClientError::InvalidParameters(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(amount)
    }

    /// Returns `true` if every digit is `0`.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    /// Returns the digit string exactly as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant(&self) -> &str {
        let stripped = self.0.trim_start_matches('0');
        if stripped.is_empty() { "0" } else { stripped }
    }
}

impl Ord for AtomicAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

impl PartialOrd for AtomicAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AtomicAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AtomicAmount {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AtomicAmount> for String {
    fn from(amount: AtomicAmount) -> Self {
        amount.0
    }
}

/// Converts a human decimal amount (e.g. `"1.5"`) into atomic units.
///
/// # Errors
///
/// Returns [`ClientError::InvalidParameters`] if the input is not a plain
/// decimal number or has more fractional digits than `decimals`.
pub fn parse_units(human: &str, decimals: u8) -> Result<AtomicAmount, ClientError> {
    let human = human.trim();
    let (whole, frac) = human.split_once('.').unwrap_or((human, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(ClientError::InvalidParameters(format!(
            "amount {human:?} is not a decimal number"
        )));
    }
    let scale = usize::from(decimals);
    let frac = frac.trim_end_matches('0');
    if frac.len() > scale {
        return Err(ClientError::InvalidParameters(format!(
            "amount {human:?} has more than {decimals} fractional digits"
        )));
    }

    let mut atomic = String::with_capacity(whole.len() + scale);
    atomic.push_str(whole);
    atomic.push_str(frac);
    atomic.extend(std::iter::repeat_n('0', scale - frac.len()));
    let trimmed = atomic.trim_start_matches('0');
    AtomicAmount::parse(if trimmed.is_empty() { "0" } else { trimmed })
}

/// Formats an atomic amount as a human decimal string without trailing zeros.
#[must_use]
pub fn format_units(amount: &AtomicAmount, decimals: u8) -> String {
    let digits = amount.significant();
    let scale = usize::from(decimals);
    if scale == 0 {
        return digits.to_string();
    }
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale - digits.len() + 1))
    } else {
        digits.to_string()
    };
    let (whole, frac) = padded.split_at(padded.len() - scale);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}
