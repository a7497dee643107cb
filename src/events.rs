//! Pool events
//!
//! Every committed state change appends one or more events. Failed
//! operations emit nothing.

use curve_model::Phase;
use serde::Serialize;

use crate::types::{Address, ReserveAmount, Timestamp, TokenAmount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolEvent {
    Buy {
        buyer: Address,
        recipient: Address,
        /// Gross reserve paid, fee included
        reserve_in: ReserveAmount,
        fee: ReserveAmount,
        tokens_out: TokenAmount,
        /// Accounted reserve after the trade
        reserve_balance: ReserveAmount,
        timestamp: Timestamp,
    },

    Sell {
        seller: Address,
        recipient: Address,
        tokens_in: TokenAmount,
        /// Reserve paid to the recipient, fee excluded
        reserve_out: ReserveAmount,
        fee: ReserveAmount,
        reserve_balance: ReserveAmount,
        timestamp: Timestamp,
    },

    /// Emitted once, on graduation
    PhaseTransition {
        from: Phase,
        to: Phase,
        reserve_balance: ReserveAmount,
        timestamp: Timestamp,
    },

    FeesDeposited {
        from: Address,
        amount: ReserveAmount,
        reserve_balance: ReserveAmount,
        timestamp: Timestamp,
    },

    TreasuryWithdrawn {
        to: Address,
        amount: ReserveAmount,
        timestamp: Timestamp,
    },

    Paused,

    Unpaused,

    ParametersUpdated {
        parameter: &'static str,
        old_value: u64,
        new_value: u64,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::Buy { .. } => "buy",
            PoolEvent::Sell { .. } => "sell",
            PoolEvent::PhaseTransition { .. } => "phase_transition",
            PoolEvent::FeesDeposited { .. } => "fees_deposited",
            PoolEvent::TreasuryWithdrawn { .. } => "treasury_withdrawn",
            PoolEvent::Paused => "paused",
            PoolEvent::Unpaused => "unpaused",
            PoolEvent::ParametersUpdated { .. } => "parameters_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let event = PoolEvent::PhaseTransition {
            from: Phase::FlatPrice,
            to: Phase::BondingCurve,
            reserve_balance: 25_000_000_000,
            timestamp: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_transition");
        assert_eq!(json["to"], "BondingCurve");
        assert_eq!(event.name(), "phase_transition");
    }
}
