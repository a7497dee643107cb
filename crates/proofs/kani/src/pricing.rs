//! Flat-phase pricing proofs
//!
//! Curve math goes through `exp`/`ln` loops that are too deep for bounded
//! model checking; these proofs cover the flat paths and sell guards, and
//! the curve itself is exercised by the proptest suite.

use curve_model::{PricingState, Route, RESERVE_UNIT, TOKEN_UNIT};

const THRESHOLD: u128 = 25_000 * RESERVE_UNIT;

fn flat_state(reserve_balance: u128, supply: u128, price: u128, fee_bps: u16) -> PricingState {
    PricingState {
        reserve_balance,
        supply,
        graduated: false,
        flat_curve_threshold: THRESHOLD,
        flat_curve_price: price,
        crr_ppm: 100_000,
        trade_fee_bps: fee_bps,
    }
}

/// Below the threshold the buy quote does not depend on supply
#[kani::proof]
#[kani::unwind(4)]
fn flat_buy_independent_of_supply() {
    let reserve: u128 = kani::any();
    let reserve_in: u128 = kani::any();
    let price: u128 = kani::any();
    let fee_bps: u16 = kani::any();
    let supply_a: u128 = kani::any();
    let supply_b: u128 = kani::any();

    kani::assume(reserve < THRESHOLD);
    kani::assume(reserve_in > 0 && reserve_in <= THRESHOLD - reserve);
    kani::assume(price > 0 && price <= 1_000 * RESERVE_UNIT);
    kani::assume(fee_bps <= 1_000);

    let a = flat_state(reserve, supply_a, price, fee_bps).quote_buy(reserve_in).unwrap();
    let b = flat_state(reserve, supply_b, price, fee_bps).quote_buy(reserve_in).unwrap();

    assert!(a.tokens_out == b.tokens_out);
    assert!(a.route == Route::Flat);
    assert!(a.tokens_out == a.net_reserve_in * TOKEN_UNIT / price);
}

/// A flat-phase sell never releases more than the accounted reserve
#[kani::proof]
#[kani::unwind(4)]
fn flat_sell_bounded_by_reserve() {
    let reserve: u128 = kani::any();
    let supply: u128 = kani::any();
    let tokens_in: u128 = kani::any();
    let price: u128 = kani::any();

    kani::assume(reserve < THRESHOLD);
    kani::assume(supply < 1u128 << 96);
    kani::assume(price > 0 && price <= 1_000 * RESERVE_UNIT);

    if let Ok(quote) = flat_state(reserve, supply, price, 30).quote_sell(tokens_in) {
        assert!(quote.gross_reserve_out <= reserve);
        assert!(quote.reserve_out + quote.fee == quote.gross_reserve_out);
        assert!(quote.tokens_in <= supply);
    }
}

/// Selling more than the supply is always rejected
#[kani::proof]
fn sell_above_supply_rejected() {
    let supply: u128 = kani::any();
    let tokens_in: u128 = kani::any();
    kani::assume(tokens_in > supply);

    let mut state = flat_state(kani::any(), supply, kani::any(), 0);
    state.graduated = kani::any();

    assert!(state.quote_sell(tokens_in).is_err());
}
