//! Decimal amount parsing and formatting
//!
//! Config files and command lines carry human amounts ("10000", "0.01");
//! the engine works in fixed-point integers (6 decimals for reserve, 18 for
//! tokens).

use curvepool::{RESERVE_UNIT, TOKEN_UNIT};

pub const RESERVE_DECIMALS: u32 = 6;
pub const TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount '{0}'")]
    Invalid(String),
    #[error("'{input}' has more than {decimals} decimal places")]
    TooPrecise { input: String, decimals: u32 },
    #[error("amount '{0}' is too large")]
    Overflow(String),
}

/// Parse a non-negative decimal into an integer with `decimals` implied places
pub fn parse_fixed(input: &str, decimals: u32) -> Result<u128, UnitError> {
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(UnitError::Empty);
    }

    let (whole, frac) = match cleaned.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitError::Invalid(input.to_string()));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(UnitError::Invalid(input.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitError::TooPrecise {
            input: input.to_string(),
            decimals,
        });
    }

    let overflow = || UnitError::Overflow(input.to_string());
    let scale = 10u128.pow(decimals);
    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_value: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(overflow)
}

/// Format with trailing fractional zeros trimmed
pub fn format_fixed(value: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

pub fn parse_reserve(input: &str) -> Result<u128, UnitError> {
    parse_fixed(input, RESERVE_DECIMALS)
}

pub fn parse_tokens(input: &str) -> Result<u128, UnitError> {
    parse_fixed(input, TOKEN_DECIMALS)
}

pub fn format_reserve(value: u128) -> String {
    format_fixed(value, RESERVE_DECIMALS)
}

pub fn format_tokens(value: u128) -> String {
    format_fixed(value, TOKEN_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reserve() {
        assert_eq!(parse_reserve("10000").unwrap(), 10_000 * RESERVE_UNIT);
        assert_eq!(parse_reserve("0.01").unwrap(), 10_000);
        assert_eq!(parse_reserve("25_000.5").unwrap(), 25_000_500_000);
        assert_eq!(parse_reserve(".5").unwrap(), 500_000);
        assert_eq!(parse_tokens("1").unwrap(), TOKEN_UNIT);
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(parse_reserve(""), Err(UnitError::Empty));
        assert!(matches!(parse_reserve("-1"), Err(UnitError::Invalid(_))));
        assert!(matches!(parse_reserve("1.2.3"), Err(UnitError::Invalid(_))));
        assert!(matches!(parse_reserve("."), Err(UnitError::Invalid(_))));
        assert!(matches!(parse_reserve("0.0000001"), Err(UnitError::TooPrecise { .. })));
        assert!(matches!(
            parse_tokens("999999999999999999999999"),
            Err(UnitError::Overflow(_))
        ));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_reserve(9_970 * RESERVE_UNIT), "9970");
        assert_eq!(format_reserve(10_000), "0.01");
        assert_eq!(format_tokens(997_000 * TOKEN_UNIT), "997000");
        assert_eq!(format_tokens(1), "0.000000000000000001");
    }
}
