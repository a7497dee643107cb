//! Phase routing proofs

use curve_model::{Phase, PricingState};

fn any_state() -> PricingState {
    PricingState {
        reserve_balance: kani::any(),
        supply: kani::any(),
        graduated: kani::any(),
        flat_curve_threshold: kani::any(),
        flat_curve_price: kani::any(),
        crr_ppm: kani::any(),
        trade_fee_bps: kani::any(),
    }
}

/// A graduated pool is on the curve whatever its reserve
#[kani::proof]
fn graduated_pool_never_flat() {
    let mut state = any_state();
    state.graduated = true;

    assert!(state.current_phase() == Phase::BondingCurve);
}

/// Before graduation the reserve level alone decides the phase
#[kani::proof]
fn phase_follows_reserve_before_graduation() {
    let mut state = any_state();
    state.graduated = false;

    let phase = state.current_phase();
    if state.reserve_balance < state.flat_curve_threshold {
        assert!(phase == Phase::FlatPrice);
    } else {
        assert!(phase == Phase::BondingCurve);
    }
}

/// Adding reserve can only move a pool toward the curve
#[kani::proof]
fn more_reserve_never_reverts_phase() {
    let state = any_state();
    let extra: u128 = kani::any();
    kani::assume(state.reserve_balance.checked_add(extra).is_some());

    let richer = PricingState {
        reserve_balance: state.reserve_balance + extra,
        ..state
    };

    if state.current_phase() == Phase::BondingCurve {
        assert!(richer.current_phase() == Phase::BondingCurve);
    }
}
