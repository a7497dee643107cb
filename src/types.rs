//! Primitive types shared across the engine

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seconds since the Unix epoch, as supplied by the host
pub type Timestamp = u64;

/// Reserve asset amount (6 implied decimals)
pub type ReserveAmount = u128;

/// Pool token amount (18 implied decimals)
pub type TokenAmount = u128;

/// 32-byte account identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    /// Deterministic address from a human-readable label
    ///
    /// The label's bytes are left-aligned and zero-padded; anything past 32
    /// bytes is dropped. Used for test accounts and config files.
    pub fn from_label(label: &str) -> Self {
        let mut bytes = [0u8; 32];
        for (dst, src) in bytes.iter_mut().zip(label.as_bytes()) {
            *dst = *src;
        }
        Address(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Printable labels read better in test failures than 64 hex digits
        let trimmed: Vec<u8> = self.0.iter().copied().take_while(|b| *b != 0).collect();
        let rest_zero = self.0[trimmed.len()..].iter().all(|b| *b == 0);
        match core::str::from_utf8(&trimmed) {
            Ok(label) if rest_zero && !label.is_empty() && label.chars().all(|c| c.is_ascii_graphic()) => {
                write!(f, "Address({})", label)
            }
            _ => write!(f, "Address({})", self),
        }
    }
}

/// Error parsing an [`Address`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("empty address")]
    Empty,
    #[error("invalid hex address: {0}")]
    InvalidHex(String),
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// `0x` followed by 64 hex digits, or any other non-empty label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddressParseError::Empty);
        }
        let Some(hex) = s.strip_prefix("0x") else {
            return Ok(Address::from_label(s));
        };
        if hex.len() != 64 {
            return Err(AddressParseError::InvalidHex(s.to_string()));
        }

        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
                .map_err(|_| AddressParseError::InvalidHex(s.to_string()))?;
        }
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
