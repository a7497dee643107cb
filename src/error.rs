//! Pool error taxonomy
//!
//! Every rejection has its own variant so callers can tell a paused pool
//! from a slippage miss or an oversized trade.

use curve_model::CurveError;

use crate::interfaces::{BurnError, ExternalCallError, MintError, TransferError};
use crate::types::Timestamp;

/// Bad input, rejected before any state is touched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("amount must be non-zero")]
    ZeroAmount,
    #[error("address must be non-zero")]
    ZeroAddress,
    #[error("deadline {deadline} has passed (now {now})")]
    DeadlineExpired { deadline: Timestamp, now: Timestamp },
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: u128 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("pool is paused")]
    Paused,

    #[error("sells disabled until {until} (now {now})")]
    SellsDisabled { until: Timestamp, now: Timestamp },

    #[error("slippage exceeded: quoted {quoted}, minimum {minimum}")]
    SlippageExceeded { quoted: u128, minimum: u128 },

    #[error("trade produces zero output")]
    ZeroOutput,

    #[error("trade size {amount} exceeds limit {limit}")]
    TradeSizeExceeded { amount: u128, limit: u128 },

    #[error("requested {requested} but only {available} surplus is withdrawable")]
    SurplusExceeded { requested: u128, available: u128 },

    #[error("pool is busy with another operation")]
    Reentrant,

    #[error("pricing failed: {0}")]
    Domain(CurveError),

    #[error(transparent)]
    ExternalCallFailed(#[from] ExternalCallError),
}

impl From<CurveError> for PoolError {
    fn from(err: CurveError) -> Self {
        PoolError::Domain(err)
    }
}

impl From<MintError> for PoolError {
    fn from(err: MintError) -> Self {
        PoolError::ExternalCallFailed(err.into())
    }
}

impl From<BurnError> for PoolError {
    fn from(err: BurnError) -> Self {
        PoolError::ExternalCallFailed(err.into())
    }
}

impl From<TransferError> for PoolError {
    fn from(err: TransferError) -> Self {
        PoolError::ExternalCallFailed(err.into())
    }
}

pub type Result<T> = core::result::Result<T, PoolError>;
