//! Collaborators the pool calls out to
//!
//! Token issuance and reserve custody live outside the engine. Both are
//! injected as traits so the pool can be driven by in-memory ledgers in
//! tests and by real asset adapters elsewhere. Every call is fallible and a
//! failure aborts the whole operation.
//!
//! The pool brackets the calls of one operation with `checkpoint` and either
//! `commit` or `rollback`. Adapters running inside a host transaction that
//! reverts on error can keep the no-op defaults.

use crate::types::{Address, ReserveAmount, TokenAmount};

/// Issuance authority for the pool token
///
/// One instance is bound to one token, so the asset is implicit.
pub trait MintAuthority {
    /// Circulating supply (18 decimals)
    fn total_supply(&self) -> TokenAmount;

    fn mint(&mut self, recipient: Address, amount: TokenAmount) -> Result<(), MintError>;

    /// Burn `amount` from `account`'s balance
    fn burn(&mut self, account: Address, amount: TokenAmount) -> Result<(), BurnError>;

    /// Start recording changes
    fn checkpoint(&mut self) {}

    /// Keep every change since `checkpoint`
    fn commit(&mut self) {}

    /// Undo every change since `checkpoint`
    fn rollback(&mut self) {}
}

/// Reserve asset custody
///
/// `transfer` always sends from the pool's custody account.
pub trait ReserveAsset {
    fn balance_of(&self, account: Address) -> ReserveAmount;

    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        amount: ReserveAmount,
    ) -> Result<(), TransferError>;

    fn transfer(&mut self, to: Address, amount: ReserveAmount) -> Result<(), TransferError>;

    fn checkpoint(&mut self) {}

    fn commit(&mut self) {}

    fn rollback(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MintError {
    #[error("mint rejected by authority: {0}")]
    Rejected(String),
    #[error("token supply overflow")]
    SupplyOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BurnError {
    #[error("burn rejected by authority: {0}")]
    Rejected(String),
    #[error("{account} holds {balance} tokens, burn needs {requested}")]
    InsufficientBalance {
        account: Address,
        balance: TokenAmount,
        requested: TokenAmount,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("transfer rejected: {0}")]
    Rejected(String),
    #[error("{account} holds {balance}, transfer needs {requested}")]
    InsufficientBalance {
        account: Address,
        balance: ReserveAmount,
        requested: ReserveAmount,
    },
    #[error("balance overflow for {0}")]
    Overflow(Address),
}

/// Any collaborator failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternalCallError {
    #[error("mint failed: {0}")]
    Mint(#[from] MintError),
    #[error("burn failed: {0}")]
    Burn(#[from] BurnError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}
