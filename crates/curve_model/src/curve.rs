//! Constant-reserve-ratio bonding curve (Bancor-style)
//!
//! - Buy:   T = S × ((1 + E/R)^w − 1)
//! - Sell:  F = R × (1 − (1 − T/S)^(1/w))
//! - Spot:  P = R / (w × S)
//!
//! where `w = crr_ppm / 1_000_000`, `R` is the reserve (6 decimals), `S` the
//! token supply (18 decimals), `E` reserve in and `T` tokens.
//!
//! Reserve ratios `E/R` are dimensionless because both sides share the
//! 6-decimal encoding, and token amounts are already 1e18 fixed-point, so
//! the curve needs no extra rescaling beyond the spot price. Every result
//! is floored: dust loss favors the pool.

use crate::fixed::{mul_div, pow, UNIT};
use crate::{validate_crr, CurveError, PPM_SCALE, TOKEN_UNIT};

/// `w` as a fixed-point fraction
#[inline]
fn weight(crr_ppm: u32) -> u128 {
    crr_ppm as u128 * (UNIT / PPM_SCALE)
}

/// Tokens minted for `reserve_in` deposited against `(reserve_balance, supply)`
///
/// # Errors
/// * `UndefinedBasis` if `supply == 0` or `reserve_balance == 0`; the curve
///   has no basis there and the caller must price with the flat phase
/// * `InvalidCrr` if `crr_ppm` is out of bounds
pub fn calculate_buy(
    reserve_in: u128,
    reserve_balance: u128,
    supply: u128,
    crr_ppm: u32,
) -> Result<u128, CurveError> {
    validate_crr(crr_ppm)?;
    if supply == 0 || reserve_balance == 0 {
        return Err(CurveError::UndefinedBasis);
    }
    if reserve_in == 0 {
        return Ok(0);
    }

    // (1 + E/R)
    let growth = mul_div(reserve_in, UNIT, reserve_balance)?;
    let base = UNIT.checked_add(growth).ok_or(CurveError::Overflow)?;

    // pow may land half an ulp high; drop one so the pool never overmints
    let factor = pow(base, weight(crr_ppm))?.saturating_sub(1);
    mul_div(supply, factor.saturating_sub(UNIT), UNIT)
}

/// Reserve released for burning `tokens_in` against `(reserve_balance, supply)`
///
/// Returns 0 when `supply == 0` or `tokens_in > supply`: nothing can be
/// sold that does not exist. Rejecting such a trade is the pricer's job.
pub fn calculate_sell(
    reserve_balance: u128,
    supply: u128,
    tokens_in: u128,
    crr_ppm: u32,
) -> Result<u128, CurveError> {
    validate_crr(crr_ppm)?;
    if supply == 0 || tokens_in > supply || tokens_in == 0 {
        return Ok(0);
    }
    if tokens_in == supply {
        return Ok(reserve_balance);
    }

    // (1 - T/S)
    let burned = mul_div(tokens_in, UNIT, supply)?;
    let base = UNIT - burned;

    // 1/w
    let inverse_weight = mul_div(UNIT, PPM_SCALE, crr_ppm as u128)?;
    // pow may land one ulp low; round the retained share up
    let remaining = pow(base, inverse_weight)?.saturating_add(1).min(UNIT);

    mul_div(reserve_balance, UNIT - remaining, UNIT)
}

/// Marginal price in reserve units (6 decimals) per whole token
///
/// `None` is the "undefined" sentinel for an empty supply.
pub fn calculate_spot_price(
    reserve_balance: u128,
    supply: u128,
    crr_ppm: u32,
) -> Result<Option<u128>, CurveError> {
    validate_crr(crr_ppm)?;
    if supply == 0 {
        return Ok(None);
    }

    // R × 1e18 × 1e6 / (crr_ppm × S)
    let denominator = supply
        .checked_mul(crr_ppm as u128)
        .ok_or(CurveError::Overflow)?;
    mul_div(reserve_balance, TOKEN_UNIT * PPM_SCALE, denominator).map(Some)
}
