//! Fixed-point primitives on a 1e18 scale
//!
//! `UNIT` represents 1.0. Unsigned values (`u128`) are used for magnitudes
//! that cannot go negative (bases, exp results); signed values (`i128`) for
//! logarithms and deviations. Every operation is checked: an overflow is
//! reported as `CurveError::Overflow`, never wrapped.

use crate::CurveError;

uint::construct_uint! {
    /// 256-bit intermediate for full-width products
    struct U256(4);
}

/// Fixed-point one (1e18)
pub const UNIT: u128 = 1_000_000_000_000_000_000;

const UNIT_I: i128 = UNIT as i128;

/// ln(3) scaled by UNIT
pub const LN_3: i128 = 1_098_612_288_668_109_691;

/// sqrt(3) scaled by UNIT; upper edge of the ln series window
const SQRT_3: u128 = 1_732_050_807_568_877_293;

/// 1/sqrt(3) scaled by UNIT; lower edge of the ln series window
const INV_SQRT_3: u128 = 577_350_269_189_625_764;

/// |base - UNIT| at or below this uses the binomial expansion in `pow`,
/// for exponents of at most `UNIT`
pub const BINOMIAL_WINDOW: u128 = UNIT / 100;

/// exp() halves its argument until it is at most this
const EXP_REDUCTION_BOUND: u128 = UNIT / 8;

/// Largest |x| accepted by exp(); e^42 * 1e18 still fits in u128
pub const MAX_EXP_INPUT: i128 = 42 * UNIT_I;

// z ≤ 0.268 in the reduced window, so z^49 is below one ulp
const LN_SERIES_TERMS: i128 = 24;
const EXP_TAYLOR_TERMS: u128 = 10;

/// floor(a * b / c) with a 256-bit intermediate
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, CurveError> {
    if c == 0 {
        return Err(CurveError::DivisionByZero);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / c);
    }

    let quotient = U256::from(a) * U256::from(b) / U256::from(c);
    if quotient > U256::from(u128::MAX) {
        return Err(CurveError::Overflow);
    }
    Ok(quotient.as_u128())
}

/// Fixed-point product, rounded toward zero
#[inline]
pub fn mul(a: u128, b: u128) -> Result<u128, CurveError> {
    mul_div(a, b, UNIT)
}

/// Fixed-point quotient, rounded toward zero
#[inline]
pub fn div(a: u128, b: u128) -> Result<u128, CurveError> {
    mul_div(a, UNIT, b)
}

/// Signed fixed-point product, rounded toward zero
pub fn mul_signed(a: i128, b: i128) -> Result<i128, CurveError> {
    let magnitude = mul(a.unsigned_abs(), b.unsigned_abs())?;
    let magnitude = i128::try_from(magnitude).map_err(|_| CurveError::Overflow)?;
    if (a < 0) != (b < 0) {
        Ok(-magnitude)
    } else {
        Ok(magnitude)
    }
}

/// base^exponent for fixed-point base and exponent
///
/// # Special cases
/// - `exponent == 0` → `UNIT`
/// - `base == 0` → `0`
/// - `base == UNIT` → `UNIT`
///
/// Bases within `BINOMIAL_WINDOW` of `UNIT` raised to an exponent of at
/// most `UNIT` use a 4th-order binomial expansion on the signed deviation.
/// Everything else goes through `exp(exponent * ln(base))`. Larger
/// exponents leave the binomial path because its truncation error grows
/// with `C(exponent, 5)`.
pub fn pow(base: u128, exponent: u128) -> Result<u128, CurveError> {
    if exponent == 0 {
        return Ok(UNIT);
    }
    if base == 0 {
        return Ok(0);
    }
    if base == UNIT {
        return Ok(UNIT);
    }

    let exponent = i128::try_from(exponent).map_err(|_| CurveError::Overflow)?;

    if exponent <= UNIT_I && base.abs_diff(UNIT) <= BINOMIAL_WINDOW {
        // Both sides of the window are tiny, so the cast cannot truncate
        let deviation = base as i128 - UNIT_I;
        return binomial(deviation, exponent);
    }

    let log = ln(base)?;
    exp(mul_signed(log, exponent)?)
}

/// (1 + d)^e ≈ 1 + e·d + C(e,2)·d² + C(e,3)·d³ + C(e,4)·d⁴
///
/// For 0 < e < 1 and d > 0 the terms alternate starting positive, so the
/// first dropped term (d⁵) is positive and the sum never overshoots.
fn binomial(deviation: i128, exponent: i128) -> Result<u128, CurveError> {
    let c1 = exponent;
    let c2 = mul_signed(c1, exponent - UNIT_I)? / 2;
    let c3 = mul_signed(c2, exponent - 2 * UNIT_I)? / 3;
    let c4 = mul_signed(c3, exponent - 3 * UNIT_I)? / 4;

    let d2 = mul_signed(deviation, deviation)?;
    let d3 = mul_signed(d2, deviation)?;
    let d4 = mul_signed(d3, deviation)?;

    let t1 = mul_signed(c1, deviation)?;
    let t2 = mul_signed(c2, d2)?;
    let t3 = mul_signed(c3, d3)?;
    let t4 = mul_signed(c4, d4)?;

    let result = UNIT_I
        .checked_add(t1)
        .and_then(|r| r.checked_add(t2))
        .and_then(|r| r.checked_add(t3))
        .and_then(|r| r.checked_add(t4))
        .ok_or(CurveError::Overflow)?;

    Ok(if result > 0 { result as u128 } else { 0 })
}

/// Natural logarithm of a fixed-point value
///
/// Range-reduces by factors of 3 into [1/√3, √3], evaluates
/// `2·atanh(z) = 2·Σ z^(2i+1)/(2i+1)` with `z = (x-1)/(x+1)`, and adds
/// back `k·ln(3)`.
pub fn ln(x: u128) -> Result<i128, CurveError> {
    if x == 0 {
        return Err(CurveError::LnOfZero);
    }

    let mut scaled = x;
    let mut k: i128 = 0;
    while scaled > SQRT_3 {
        scaled /= 3;
        k += 1;
    }
    while scaled < INV_SQRT_3 {
        scaled *= 3;
        k -= 1;
    }

    // scaled is within [0.57, 1.74] * UNIT here
    let scaled = scaled as i128;
    let z = (scaled - UNIT_I) * UNIT_I / (scaled + UNIT_I);
    let z2 = z * z / UNIT_I;

    let mut term = z;
    let mut series = z;
    for i in 1..LN_SERIES_TERMS {
        term = term * z2 / UNIT_I;
        if term == 0 {
            break;
        }
        series += term / (2 * i + 1);
    }

    (2 * series)
        .checked_add(k.checked_mul(LN_3).ok_or(CurveError::Overflow)?)
        .ok_or(CurveError::Overflow)
}

/// e^x for a signed fixed-point exponent
///
/// Negative inputs return the reciprocal of `exp(|x|)`. Inputs below
/// `-MAX_EXP_INPUT` are under one ulp and return 0; inputs above
/// `MAX_EXP_INPUT` overflow.
pub fn exp(x: i128) -> Result<u128, CurveError> {
    if x == 0 {
        return Ok(UNIT);
    }
    if x < 0 {
        if x < -MAX_EXP_INPUT {
            return Ok(0);
        }
        let positive = exp_positive(x.unsigned_abs())?;
        return mul_div(UNIT, UNIT, positive);
    }
    if x > MAX_EXP_INPUT {
        return Err(CurveError::Overflow);
    }
    exp_positive(x as u128)
}

fn exp_positive(x: u128) -> Result<u128, CurveError> {
    let mut reduced = x;
    let mut halvings = 0u32;
    while reduced > EXP_REDUCTION_BOUND {
        reduced /= 2;
        halvings += 1;
    }

    let mut term = UNIT;
    let mut sum = UNIT;
    for i in 1..=EXP_TAYLOR_TERMS {
        term = mul_div(term, reduced, UNIT * i)?;
        if term == 0 {
            break;
        }
        sum = sum.checked_add(term).ok_or(CurveError::Overflow)?;
    }

    for _ in 0..halvings {
        sum = mul(sum, sum)?;
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    const E: u128 = 2_718_281_828_459_045_235;

    fn assert_close(actual: u128, expected: u128, tolerance: u128) {
        assert!(
            actual.abs_diff(expected) <= tolerance,
            "expected {} ± {}, got {}",
            expected,
            tolerance,
            actual
        );
    }

    #[test]
    fn test_mul_div_wide_product() {
        // 1e30 * 1e30 overflows u128 but the quotient fits
        let a = 1_000_000_000_000_000_000_000_000_000_000u128;
        assert_eq!(mul_div(a, a, a).unwrap(), a);
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX).unwrap(), u128::MAX);
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(CurveError::Overflow));
        assert_eq!(mul_div(1, 1, 0), Err(CurveError::DivisionByZero));
    }

    #[test]
    fn test_mul_signed_rounds_toward_zero() {
        assert_eq!(mul_signed(-3 * UNIT_I, UNIT_I / 2).unwrap(), -3 * UNIT_I / 2);
        assert_eq!(mul_signed(-1, -1).unwrap(), 0);
        assert_eq!(mul_signed(-UNIT_I, -UNIT_I).unwrap(), UNIT_I);
    }

    #[test]
    fn test_ln_of_zero_is_domain_error() {
        assert_eq!(ln(0), Err(CurveError::LnOfZero));
    }

    #[test]
    fn test_ln_known_values() {
        assert_eq!(ln(UNIT).unwrap(), 0);
        assert!((ln(E).unwrap() - UNIT_I).abs() <= 1_000);
        assert!((ln(3 * UNIT).unwrap() - LN_3).abs() <= 1_000);
        assert!((ln(2 * UNIT).unwrap() - 693_147_180_559_945_309).abs() <= 1_000);
        assert!((ln(UNIT / 2).unwrap() + 693_147_180_559_945_309).abs() <= 1_000);
        // ln(1e6) = 13.815510557964274
        assert!((ln(1_000_000 * UNIT).unwrap() - 13_815_510_557_964_274_104).abs() <= 10_000);
    }

    #[test]
    fn test_ln_tiny_input() {
        // ln(1e-18) = -41.446531673892822
        let value = ln(1).unwrap();
        assert!((value + 41_446_531_673_892_822_312).abs() <= 100_000);
    }

    #[test]
    fn test_exp_known_values() {
        assert_eq!(exp(0).unwrap(), UNIT);
        assert_close(exp(UNIT_I).unwrap(), E, 1_000);
        // e^-1 = 0.367879441171442321
        assert_close(exp(-UNIT_I).unwrap(), 367_879_441_171_442_321, 1_000);
        // e^10 = 22026.465794806716517
        assert_close(exp(10 * UNIT_I).unwrap(), 22_026_465_794_806_716_516_957, 100_000_000);
    }

    #[test]
    fn test_exp_bounds() {
        assert_eq!(exp(MAX_EXP_INPUT + 1), Err(CurveError::Overflow));
        assert_eq!(exp(-MAX_EXP_INPUT - 1).unwrap(), 0);
        assert!(exp(MAX_EXP_INPUT).is_ok());
        assert!(exp(-MAX_EXP_INPUT).is_ok());
    }

    #[test]
    fn test_exp_ln_round_trip() {
        for x in [UNIT / 7, UNIT / 2, 2 * UNIT, 37 * UNIT / 10, 1_000 * UNIT] {
            let back = exp(ln(x).unwrap()).unwrap();
            // relative error below 1e-12
            assert_close(back, x, x / 1_000_000_000_000 + 1);
        }
    }

    #[test]
    fn test_pow_special_cases() {
        assert_eq!(pow(12345, 0).unwrap(), UNIT);
        assert_eq!(pow(0, UNIT / 2).unwrap(), 0);
        assert_eq!(pow(UNIT, 7 * UNIT).unwrap(), UNIT);
    }

    #[test]
    fn test_pow_log_path() {
        // 4^0.5 = 2
        assert_close(pow(4 * UNIT, UNIT / 2).unwrap(), 2 * UNIT, 1_000_000);
        // 0.5^2 = 0.25
        assert_close(pow(UNIT / 2, 2 * UNIT).unwrap(), UNIT / 4, 1_000_000);
        // 2^10 = 1024
        assert_close(pow(2 * UNIT, 10 * UNIT).unwrap(), 1_024 * UNIT, 1_000_000_000);
    }

    #[test]
    fn test_pow_binomial_window() {
        // Buy-side exponents: the sum stops before a positive d⁵ term, so
        // the result sits just under the true value
        // 1.005^0.1 = 1.000498878549636097...
        let tenth = pow(UNIT + UNIT / 200, UNIT / 10).unwrap();
        assert_close(tenth, 1_000_498_878_549_636_097, 100_000);
        assert!(tenth <= 1_000_498_878_549_636_097);
        // 1.01^0.5 = 1.004987562112089027...
        let root = pow(UNIT + BINOMIAL_WINDOW, UNIT / 2).unwrap();
        assert_close(root, 1_004_987_562_112_089_027, 10_000_000);
        assert!(root <= 1_004_987_562_112_089_027);
    }

    #[test]
    fn test_pow_large_exponent_near_one() {
        // 0.99^20 = 0.817906937597230870...
        assert_close(pow(UNIT - BINOMIAL_WINDOW, 20 * UNIT).unwrap(), 817_906_937_597_230_870, 1_000);
        // 0.995^10 = 0.951110130465771892...
        assert_close(pow(UNIT - UNIT / 200, 10 * UNIT).unwrap(), 951_110_130_465_771_892, 1_000);
    }

    #[test]
    fn test_pow_sell_exponents_never_undershoot() {
        // (1 - T/S)^(1/w) must not come out below the true value, or a
        // seller is paid more than the curve allows. Exact values from a
        // 50-digit reference.
        let cases: [(u128, u128, u128); 5] = [
            (UNIT - BINOMIAL_WINDOW, 20 * UNIT, 817_906_937_597_230_870),
            (UNIT - UNIT / 200, 10 * UNIT, 951_110_130_465_771_892),
            (UNIT - UNIT / 1_000, 20 * UNIT, 980_188_864_829_534_682),
            (UNIT / 2, 2 * UNIT, 250_000_000_000_000_000),
            (9 * UNIT / 10, 20 * UNIT, 121_576_654_590_569_288),
        ];
        for (base, exponent, exact) in cases {
            let value = pow(base, exponent).unwrap();
            // exact is floored, so one ulp below it is still at the true value
            assert!(value + 1 >= exact, "{}^{}: {} < {}", base, exponent, value, exact);
            assert_close(value, exact, 1_000);
        }
    }

    #[test]
    fn test_pow_continuity_across_window_edge() {
        let inside = pow(UNIT + BINOMIAL_WINDOW, UNIT / 2).unwrap();
        let outside = pow(UNIT + BINOMIAL_WINDOW + 1, UNIT / 2).unwrap();
        assert_close(inside, outside, 1_000_000_000);
    }
}
