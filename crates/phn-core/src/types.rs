use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{ADDRESS_PREFIX, AMOUNT_DECIMALS, MICRO_PER_PHN};
use crate::error::PhnError;

pub type Height = u64;
pub type Timestamp = i64;

/// Fixed-point PHN amount stored as micro-PHN (1 PHN = 10^8 micro-PHN).
///
/// All arithmetic is exact integer arithmetic; the canonical decimal string
/// form (`"100.00000000"`) exists only at the encoding boundary (see
/// [`crate::encoding`]), matching SPEC_FULL.md §12.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_micro(micro: u64) -> Self {
        Amount(micro)
    }

    pub fn micro(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Parse the canonical fixed-precision decimal string (`"100.00000000"`).
    pub fn parse_canonical(s: &str) -> Result<Amount, PhnError> {
        let (int_part, frac_part) = s
            .split_once('.')
            .ok_or_else(|| PhnError::Other(format!("amount missing decimal point: {s}")))?;
        if frac_part.len() != AMOUNT_DECIMALS as usize {
            return Err(PhnError::Other(format!(
                "amount must have exactly {AMOUNT_DECIMALS} fractional digits: {s}"
            )));
        }
        let int_value: u64 = int_part
            .parse()
            .map_err(|_| PhnError::Other(format!("invalid amount integer part: {s}")))?;
        let frac_value: u64 = frac_part
            .parse()
            .map_err(|_| PhnError::Other(format!("invalid amount fractional part: {s}")))?;
        int_value
            .checked_mul(MICRO_PER_PHN)
            .and_then(|whole| whole.checked_add(frac_value))
            .map(Amount)
            .ok_or_else(|| PhnError::Other(format!("amount overflow: {s}")))
    }

    /// Render the canonical fixed-precision decimal string.
    pub fn to_canonical(self) -> String {
        format!(
            "{}.{:0width$}",
            self.0 / MICRO_PER_PHN,
            self.0 % MICRO_PER_PHN,
            width = AMOUNT_DECIMALS as usize
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::String(s) => {
                Amount::parse_canonical(&s).map_err(|e| D::Error::custom(e.to_string()))
            }
            serde_json::Value::Number(n) => {
                let f = n.as_f64().ok_or_else(|| D::Error::custom("amount not a number"))?;
                let micro = (f * MICRO_PER_PHN as f64).round() as u64;
                Ok(Amount(micro))
            }
            other => Err(D::Error::custom(format!("invalid amount value: {other}"))),
        }
    }
}

/// A canonical PHN address: `"PHN"` followed by the first 40 hex characters
/// of SHA-256 of the owning public key's raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `s` has the shape of a derived address (prefix + 40 hex chars).
    pub fn looks_like_address(s: &str) -> bool {
        s.len() == ADDRESS_PREFIX.len() + 40
            && s.starts_with(ADDRESS_PREFIX)
            && s[ADDRESS_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction id: 64 lowercase hex characters (a SHA-256 digest).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    /// `spec.md` §4.4 step 5: exactly 64 lowercase hex characters.
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
