//! In-memory collaborators
//!
//! Plain balance maps implementing [`MintAuthority`] and [`ReserveAsset`].
//! They back the test suites and the CLI simulator, and can be told to fail
//! specific calls so the pool's abort paths can be exercised. A checkpoint
//! keeps a copy of the balances until the pool commits or rolls back.

use std::collections::BTreeMap;

use crate::interfaces::{BurnError, MintAuthority, MintError, ReserveAsset, TransferError};
use crate::types::{Address, ReserveAmount, TokenAmount};

/// Pool token ledger
#[derive(Debug, Clone, Default)]
pub struct InMemoryToken {
    balances: BTreeMap<Address, TokenAmount>,
    total_supply: TokenAmount,
    journal: Option<(BTreeMap<Address, TokenAmount>, TokenAmount)>,
    fail_mint: bool,
    fail_burn: bool,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `account` with pre-existing tokens (e.g. a pool resumed mid-life)
    pub fn with_balance(mut self, account: Address, amount: TokenAmount) -> Self {
        *self.balances.entry(account).or_default() += amount;
        self.total_supply += amount;
        self
    }

    pub fn balance_of(&self, account: Address) -> TokenAmount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &TokenAmount)> {
        self.balances.iter().filter(|(_, amount)| **amount > 0)
    }

    /// Make every subsequent `mint` fail until reset
    pub fn set_fail_mint(&mut self, fail: bool) {
        self.fail_mint = fail;
    }

    /// Make every subsequent `burn` fail until reset
    pub fn set_fail_burn(&mut self, fail: bool) {
        self.fail_burn = fail;
    }
}

impl MintAuthority for InMemoryToken {
    fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    fn mint(&mut self, recipient: Address, amount: TokenAmount) -> Result<(), MintError> {
        if self.fail_mint {
            return Err(MintError::Rejected("mint disabled".into()));
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(MintError::SupplyOverflow)?;
        let balance = self.balances.entry(recipient).or_default();
        *balance = balance.checked_add(amount).ok_or(MintError::SupplyOverflow)?;
        self.total_supply = supply;
        Ok(())
    }

    fn burn(&mut self, account: Address, amount: TokenAmount) -> Result<(), BurnError> {
        if self.fail_burn {
            return Err(BurnError::Rejected("burn disabled".into()));
        }
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(BurnError::InsufficientBalance {
                account,
                balance,
                requested: amount,
            });
        }
        self.balances.insert(account, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.journal = Some((self.balances.clone(), self.total_supply));
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        if let Some((balances, total_supply)) = self.journal.take() {
            self.balances = balances;
            self.total_supply = total_supply;
        }
    }
}

/// Reserve asset ledger with a fixed custody account for `transfer`
#[derive(Debug, Clone)]
pub struct InMemoryReserve {
    custodian: Address,
    balances: BTreeMap<Address, ReserveAmount>,
    journal: Option<BTreeMap<Address, ReserveAmount>>,
    fail_transfer_from: bool,
    fail_transfers_to: Option<Address>,
}

impl InMemoryReserve {
    /// `custodian` is the pool account that `transfer` debits
    pub fn new(custodian: Address) -> Self {
        Self {
            custodian,
            balances: BTreeMap::new(),
            journal: None,
            fail_transfer_from: false,
            fail_transfers_to: None,
        }
    }

    pub fn custodian(&self) -> Address {
        self.custodian
    }

    /// Mint reserve out of thin air into `account`
    pub fn fund(&mut self, account: Address, amount: ReserveAmount) {
        *self.balances.entry(account).or_default() += amount;
    }

    /// Send reserve straight to the custodian, bypassing the pool's accounting
    pub fn donate(&mut self, amount: ReserveAmount) {
        self.fund(self.custodian, amount);
    }

    pub fn balances(&self) -> impl Iterator<Item = (&Address, &ReserveAmount)> {
        self.balances.iter()
    }

    pub fn set_fail_transfer_from(&mut self, fail: bool) {
        self.fail_transfer_from = fail;
    }

    /// Fail every `transfer` whose recipient is `to` (`None` to reset)
    pub fn set_fail_transfers_to(&mut self, to: Option<Address>) {
        self.fail_transfers_to = to;
    }

    fn move_funds(
        &mut self,
        from: Address,
        to: Address,
        amount: ReserveAmount,
    ) -> Result<(), TransferError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TransferError::InsufficientBalance {
                account: from,
                balance: from_balance,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow(to))?;
        self.balances.insert(from, from_balance - amount);
        self.balances.insert(to, to_balance);
        Ok(())
    }
}

impl ReserveAsset for InMemoryReserve {
    fn balance_of(&self, account: Address) -> ReserveAmount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        amount: ReserveAmount,
    ) -> Result<(), TransferError> {
        if self.fail_transfer_from {
            return Err(TransferError::Rejected("transfer_from disabled".into()));
        }
        self.move_funds(from, to, amount)
    }

    fn transfer(&mut self, to: Address, amount: ReserveAmount) -> Result<(), TransferError> {
        if self.fail_transfers_to == Some(to) {
            return Err(TransferError::Rejected(format!("transfers to {} disabled", to)));
        }
        self.move_funds(self.custodian, to, amount)
    }

    fn checkpoint(&mut self) {
        self.journal = Some(self.balances.clone());
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        if let Some(balances) = self.journal.take() {
            self.balances = balances;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_burn_track_supply() {
        let alice = Address::from_label("alice");
        let mut token = InMemoryToken::new();
        token.mint(alice, 500).unwrap();
        token.burn(alice, 200).unwrap();
        assert_eq!(token.total_supply(), 300);
        assert_eq!(token.balance_of(alice), 300);
        assert_eq!(
            token.burn(alice, 301),
            Err(BurnError::InsufficientBalance { account: alice, balance: 300, requested: 301 })
        );
    }

    #[test]
    fn test_failure_injection() {
        let alice = Address::from_label("alice");
        let mut token = InMemoryToken::new();
        token.set_fail_mint(true);
        assert!(token.mint(alice, 1).is_err());
        assert_eq!(token.total_supply(), 0);

        let pool = Address::from_label("pool");
        let mut reserve = InMemoryReserve::new(pool);
        reserve.fund(alice, 100);
        reserve.set_fail_transfer_from(true);
        assert!(reserve.transfer_from(alice, pool, 10).is_err());
        assert_eq!(reserve.balance_of(alice), 100);
    }

    #[test]
    fn test_rollback_restores_checkpoint() {
        let alice = Address::from_label("alice");
        let pool = Address::from_label("pool");

        let mut token = InMemoryToken::new().with_balance(alice, 100);
        token.checkpoint();
        token.burn(alice, 40).unwrap();
        token.mint(pool, 5).unwrap();
        token.rollback();
        assert_eq!(token.total_supply(), 100);
        assert_eq!(token.balance_of(alice), 100);
        assert_eq!(token.balance_of(pool), 0);

        let mut reserve = InMemoryReserve::new(pool);
        reserve.fund(alice, 100);
        reserve.checkpoint();
        reserve.transfer_from(alice, pool, 60).unwrap();
        reserve.commit();
        // Nothing to undo after a commit
        reserve.rollback();
        assert_eq!(reserve.balance_of(pool), 60);
        assert_eq!(reserve.balance_of(alice), 40);
    }

    #[test]
    fn test_transfer_debits_custodian() {
        let pool = Address::from_label("pool");
        let bob = Address::from_label("bob");
        let mut reserve = InMemoryReserve::new(pool);
        reserve.donate(50);
        reserve.transfer(bob, 20).unwrap();
        assert_eq!(reserve.balance_of(pool), 30);
        assert_eq!(reserve.balance_of(bob), 20);
        assert!(matches!(
            reserve.transfer(bob, 31),
            Err(TransferError::InsufficientBalance { .. })
        ));

        reserve.set_fail_transfers_to(Some(bob));
        assert!(reserve.transfer(bob, 1).is_err());
    }
}
