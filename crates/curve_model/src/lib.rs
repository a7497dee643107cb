//! Curve Model - Pure two-phase pricing math (flat price, then CRR curve)
//!
//! This crate contains everything about pricing that does not need state:
//! fixed-point `pow`/`ln`/`exp`, the constant-reserve-ratio bonding curve
//! formulas, and the two-phase pricer that routes a trade through the flat
//! bootstrap price, the curve, or both.
//!
//! The `curvepool` engine and the Kani proofs import these functions
//! directly; the stateful crate never re-implements any of this math.

#![no_std]
#![forbid(unsafe_code)]

pub mod fixed;
pub mod curve;
pub mod pricer;

pub use curve::{calculate_buy, calculate_sell, calculate_spot_price};
pub use fixed::{exp, ln, mul_div, pow, UNIT};
pub use pricer::{
    flat_reserve_for, flat_tokens_for, split_fee, BuyQuote, Phase, PricingState, Route, SellQuote,
};

/// Token amounts carry 18 implied decimals (1 whole token = 1e18)
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Reserve amounts carry 6 implied decimals (1 whole reserve unit = 1e6)
pub const RESERVE_UNIT: u128 = 1_000_000;

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u128 = 10_000;

/// Parts-per-million scale for the reserve ratio
pub const PPM_SCALE: u128 = 1_000_000;

/// Lowest accepted reserve ratio (5%)
pub const MIN_CRR_PPM: u32 = 50_000;

/// Highest accepted reserve ratio (50%)
pub const MAX_CRR_PPM: u32 = 500_000;

/// Error types for pricing math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    /// Natural log of zero is undefined
    LnOfZero,
    /// Arithmetic overflow (never silently wrapped or clamped)
    Overflow,
    /// Division by zero
    DivisionByZero,
    /// Curve needs a non-zero supply and reserve; route through flat price
    UndefinedBasis,
    /// Reserve ratio outside [MIN_CRR_PPM, MAX_CRR_PPM]
    InvalidCrr,
    /// Sell amount exceeds the circulating supply
    SellExceedsSupply,
    /// Quoted reserve output exceeds the accounted reserve
    InsufficientReserve,
}

impl core::fmt::Display for CurveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CurveError::LnOfZero => write!(f, "ln(0) is undefined"),
            CurveError::Overflow => write!(f, "arithmetic overflow"),
            CurveError::DivisionByZero => write!(f, "division by zero"),
            CurveError::UndefinedBasis => {
                write!(f, "bonding curve requires non-zero supply and reserve")
            }
            CurveError::InvalidCrr => write!(f, "reserve ratio out of bounds"),
            CurveError::SellExceedsSupply => write!(f, "sell amount exceeds supply"),
            CurveError::InsufficientReserve => write!(f, "insufficient reserve for sell"),
        }
    }
}

/// Check a reserve ratio against the accepted bounds
#[inline]
pub fn validate_crr(crr_ppm: u32) -> Result<(), CurveError> {
    if (MIN_CRR_PPM..=MAX_CRR_PPM).contains(&crr_ppm) {
        Ok(())
    } else {
        Err(CurveError::InvalidCrr)
    }
}
