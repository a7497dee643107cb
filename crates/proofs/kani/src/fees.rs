//! Fee split proofs
//!
//! The fee is carved out of the gross amount and rounded down, so the
//! split never creates or destroys reserve.

use curve_model::{split_fee, BPS_SCALE};

const MAX_FEE_BPS: u16 = 1_000;

/// net + fee == amount, and the fee never exceeds the configured rate
#[kani::proof]
fn fee_split_conserves_amount() {
    let amount: u128 = kani::any();
    let fee_bps: u16 = kani::any();

    kani::assume(amount < 1u128 << 100);
    kani::assume(fee_bps <= MAX_FEE_BPS);

    let (net, fee) = split_fee(amount, fee_bps).unwrap();

    assert!(net + fee == amount, "fee split must conserve the amount");
    assert!(fee * BPS_SCALE <= amount * fee_bps as u128, "fee rounds down");
    assert!(fee <= amount / 10, "fee capped at 10%");
}

/// A higher fee rate never leaves the trader with more
#[kani::proof]
fn fee_monotonic_in_rate() {
    let amount: u128 = kani::any();
    let low: u16 = kani::any();
    let high: u16 = kani::any();

    kani::assume(amount < 1u128 << 100);
    kani::assume(low <= high && high <= MAX_FEE_BPS);

    let (net_low, _) = split_fee(amount, low).unwrap();
    let (net_high, _) = split_fee(amount, high).unwrap();

    assert!(net_high <= net_low);
}

/// Zero fee is the identity
#[kani::proof]
fn zero_fee_is_identity() {
    let amount: u128 = kani::any();
    assert!(split_fee(amount, 0).unwrap() == (amount, 0));
}
