//! Two-phase reserve pool engine
//!
//! A single token is priced against a reserve asset in two phases:
//! 1. **Flat price**: every buy gets the same fixed price until the
//!    accounted reserve reaches the graduation threshold
//! 2. **Bonding curve**: a constant-reserve-ratio curve prices every trade
//!    from then on; graduation is one-way
//!
//! Pure pricing math lives in the `curve_model` crate. This crate adds the
//! stateful part: reserve accounting, fees, guards, events and the calls out
//! to the token's mint authority and the reserve asset.

#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod interfaces;
pub mod ledger;
pub mod lock;
pub mod pool;
pub mod types;

pub use curve_model::{
    BuyQuote, CurveError, Phase, PricingState, Route, SellQuote, RESERVE_UNIT, TOKEN_UNIT,
};
pub use error::{PoolError, Result, ValidationError};
pub use events::PoolEvent;
pub use interfaces::{
    BurnError, ExternalCallError, MintAuthority, MintError, ReserveAsset, TransferError,
};
pub use ledger::{InMemoryReserve, InMemoryToken};
pub use lock::{LockGuard, TradeLock};
pub use pool::{
    BuyReceipt, BuyRequest, PoolInfo, PoolParams, PoolSnapshot, PoolState, SellReceipt,
    SellRequest, TradeImpact, TradeInfo, DEFAULT_MAX_TRADE_BPS,
};
pub use types::{Address, ReserveAmount, Timestamp, TokenAmount};
