//! Pool state machine
//!
//! `PoolState` owns the accounted reserve, the governance parameters and the
//! sticky pricing phase. Pricing is delegated to `curve_model`; token
//! issuance and reserve custody go through the injected collaborators.
//!
//! Every mutating operation follows the same shape:
//! 1. take the reentrancy lock
//! 2. validate everything that can be validated up front
//! 3. compute the new state without writing it
//! 4. make the collaborator calls (pull before distribute) between a
//!    collaborator checkpoint and its commit
//! 5. commit state and append events
//!
//! A failure in steps 2–4 leaves the pool exactly as it was. A failed call
//! in step 4 also rolls both collaborators back to the checkpoint.

use curve_model::{mul_div, BuyQuote, Phase, PricingState, Route, SellQuote, BPS_SCALE};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result, ValidationError};
use crate::events::PoolEvent;
use crate::interfaces::{MintAuthority, ReserveAsset};
use crate::lock::TradeLock;
use crate::types::{Address, ReserveAmount, Timestamp, TokenAmount};

// ============================================================================
// Parameters
// ============================================================================

/// Highest trade fee (10%)
pub const MAX_TRADE_FEE_BPS: u16 = 1_000;

/// Highest trade-size guard (50% of reserve per trade)
pub const MAX_TRADE_BPS_LIMIT: u16 = 5_000;

pub const DEFAULT_MAX_TRADE_BPS: u16 = 2_000;

fn default_max_trade_bps() -> u16 {
    DEFAULT_MAX_TRADE_BPS
}

/// Construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    /// Custody account holding the reserve
    pub address: Address,
    /// Fee collector
    pub treasury: Address,
    pub trade_fee_bps: u16,
    pub crr_ppm: u32,
    #[serde(default = "default_max_trade_bps")]
    pub max_trade_bps: u16,
    /// Sells are rejected while `now < buy_only_until`
    #[serde(default)]
    pub buy_only_until: Timestamp,
    pub flat_curve_threshold: ReserveAmount,
    /// Reserve units (6 decimals) per whole token
    pub flat_curve_price: ReserveAmount,
}

fn invalid(name: &'static str, value: impl Into<u128>) -> PoolError {
    ValidationError::InvalidParameter {
        name,
        value: value.into(),
    }
    .into()
}

fn check_trade_fee(bps: u16) -> Result<()> {
    if bps > MAX_TRADE_FEE_BPS {
        return Err(invalid("trade_fee_bps", bps));
    }
    Ok(())
}

fn check_crr(crr_ppm: u32) -> Result<()> {
    curve_model::validate_crr(crr_ppm).map_err(|_| invalid("crr_ppm", crr_ppm))
}

fn check_max_trade(bps: u16) -> Result<()> {
    if bps == 0 || bps > MAX_TRADE_BPS_LIMIT {
        return Err(invalid("max_trade_bps", bps));
    }
    Ok(())
}

fn check_address(address: Address) -> Result<()> {
    if address.is_zero() {
        return Err(ValidationError::ZeroAddress.into());
    }
    Ok(())
}

fn check_amount(amount: u128) -> Result<()> {
    if amount == 0 {
        return Err(ValidationError::ZeroAmount.into());
    }
    Ok(())
}

fn check_deadline(deadline: Timestamp, now: Timestamp) -> Result<()> {
    if now > deadline {
        return Err(ValidationError::DeadlineExpired { deadline, now }.into());
    }
    Ok(())
}

/// Run one operation's collaborator calls as a unit: all of them stick or
/// none do
fn settle<M, R, F>(token: &mut M, reserve: &mut R, calls: F) -> Result<()>
where
    M: MintAuthority + ?Sized,
    R: ReserveAsset + ?Sized,
    F: FnOnce(&mut M, &mut R) -> Result<()>,
{
    token.checkpoint();
    reserve.checkpoint();
    match calls(token, reserve) {
        Ok(()) => {
            token.commit();
            reserve.commit();
            Ok(())
        }
        Err(e) => {
            token.rollback();
            reserve.rollback();
            Err(e)
        }
    }
}

impl PoolParams {
    pub fn validate(&self) -> Result<()> {
        check_address(self.address)?;
        check_address(self.treasury)?;
        check_trade_fee(self.trade_fee_bps)?;
        check_crr(self.crr_ppm)?;
        check_max_trade(self.max_trade_bps)?;
        if self.flat_curve_threshold == 0 {
            return Err(invalid("flat_curve_threshold", 0u8));
        }
        if self.flat_curve_price == 0 {
            return Err(invalid("flat_curve_price", 0u8));
        }
        Ok(())
    }
}

// ============================================================================
// Requests, receipts and views
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyRequest {
    /// Gross reserve paid, fee included
    pub reserve_in: ReserveAmount,
    pub min_tokens_out: TokenAmount,
    pub recipient: Address,
    pub deadline: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellRequest {
    pub tokens_in: TokenAmount,
    /// Minimum reserve received after fee
    pub min_reserve_out: ReserveAmount,
    pub recipient: Address,
    pub deadline: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuyReceipt {
    pub tokens_out: TokenAmount,
    pub reserve_in: ReserveAmount,
    pub fee: ReserveAmount,
    pub route: Route,
    pub reserve_balance: ReserveAmount,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SellReceipt {
    pub reserve_out: ReserveAmount,
    pub tokens_in: TokenAmount,
    pub fee: ReserveAmount,
    pub route: Route,
    pub reserve_balance: ReserveAmount,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    pub reserve_balance: ReserveAmount,
    pub supply: TokenAmount,
    /// Spot price in reserve units per whole token
    pub price: ReserveAmount,
    pub crr_ppm: u32,
    pub trade_fee_bps: u16,
    pub max_trade_bps: u16,
    pub flat_curve_threshold: ReserveAmount,
    pub flat_curve_price: ReserveAmount,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TradeInfo {
    pub sells_enabled: bool,
    pub buy_only_until: Timestamp,
    pub paused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TradeImpact {
    /// Tokens for a buy, net reserve for a sell
    pub amount_out: u128,
    pub price_impact_bps: u128,
    pub new_spot_price: ReserveAmount,
}

/// Everything the pool itself owns, for before/after comparisons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub reserve_balance: ReserveAmount,
    pub trade_fee_bps: u16,
    pub crr_ppm: u32,
    pub max_trade_bps: u16,
    pub buy_only_until: Timestamp,
    pub phase: Phase,
    pub paused: bool,
    pub events: Vec<PoolEvent>,
}

// ============================================================================
// Pool State
// ============================================================================

#[derive(Debug)]
pub struct PoolState {
    address: Address,
    treasury: Address,

    /// Accounted reserve; custody balance may exceed it (surplus)
    reserve_balance: ReserveAmount,

    trade_fee_bps: u16,
    crr_ppm: u32,
    max_trade_bps: u16,
    buy_only_until: Timestamp,

    flat_curve_threshold: ReserveAmount,
    flat_curve_price: ReserveAmount,

    /// Sticky: once `BondingCurve`, never reset
    phase: Phase,
    paused: bool,

    lock: TradeLock,
    events: Vec<PoolEvent>,
}

impl PoolState {
    pub fn new(params: PoolParams) -> Result<Self> {
        Self::restore(params, 0, Phase::FlatPrice)
    }

    /// Rebuild a pool that already holds reserve
    ///
    /// A reserve at or above the threshold forces `BondingCurve`.
    pub fn restore(params: PoolParams, reserve_balance: ReserveAmount, phase: Phase) -> Result<Self> {
        params.validate()?;
        let phase = if reserve_balance >= params.flat_curve_threshold {
            Phase::BondingCurve
        } else {
            phase
        };

        Ok(Self {
            address: params.address,
            treasury: params.treasury,
            reserve_balance,
            trade_fee_bps: params.trade_fee_bps,
            crr_ppm: params.crr_ppm,
            max_trade_bps: params.max_trade_bps,
            buy_only_until: params.buy_only_until,
            flat_curve_threshold: params.flat_curve_threshold,
            flat_curve_price: params.flat_curve_price,
            phase,
            paused: false,
            lock: TradeLock::new(),
            events: Vec::new(),
        })
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    pub fn reserve_balance(&self) -> ReserveAmount {
        self.reserve_balance
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_graduated(&self) -> bool {
        self.phase.is_curve()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn trade_fee_bps(&self) -> u16 {
        self.trade_fee_bps
    }

    pub fn crr_ppm(&self) -> u32 {
        self.crr_ppm
    }

    pub fn max_trade_bps(&self) -> u16 {
        self.max_trade_bps
    }

    pub fn buy_only_until(&self) -> Timestamp {
        self.buy_only_until
    }

    pub fn flat_curve_threshold(&self) -> ReserveAmount {
        self.flat_curve_threshold
    }

    pub fn flat_curve_price(&self) -> ReserveAmount {
        self.flat_curve_price
    }

    /// Handle onto this pool's reentrancy lock
    pub fn lock_handle(&self) -> TradeLock {
        self.lock.clone()
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            reserve_balance: self.reserve_balance,
            trade_fee_bps: self.trade_fee_bps,
            crr_ppm: self.crr_ppm,
            max_trade_bps: self.max_trade_bps,
            buy_only_until: self.buy_only_until,
            phase: self.phase,
            paused: self.paused,
            events: self.events.clone(),
        }
    }

    /// Pricing inputs at the given supply
    pub fn pricing(&self, supply: TokenAmount) -> PricingState {
        PricingState {
            reserve_balance: self.reserve_balance,
            supply,
            graduated: self.has_graduated(),
            flat_curve_threshold: self.flat_curve_threshold,
            flat_curve_price: self.flat_curve_price,
            crr_ppm: self.crr_ppm,
            trade_fee_bps: self.trade_fee_bps,
        }
    }

    // ========================================
    // Guards
    // ========================================

    fn ensure_active(&self) -> Result<()> {
        if self.paused {
            return Err(PoolError::Paused);
        }
        Ok(())
    }

    /// Largest reserve amount a single trade may move
    pub fn trade_size_limit(&self) -> Result<ReserveAmount> {
        Ok(mul_div(
            self.reserve_balance,
            self.max_trade_bps as u128,
            BPS_SCALE,
        )?)
    }

    fn check_trade_size(&self, amount: ReserveAmount) -> Result<()> {
        let limit = self.trade_size_limit()?;
        if amount > limit {
            return Err(PoolError::TradeSizeExceeded { amount, limit });
        }
        Ok(())
    }

    /// Phase the pool would be in with `reserve_balance` accounted
    fn phase_at(&self, reserve_balance: ReserveAmount) -> Phase {
        if self.phase.is_curve() || reserve_balance >= self.flat_curve_threshold {
            Phase::BondingCurve
        } else {
            Phase::FlatPrice
        }
    }

    /// Write the new reserve and graduate if it reached the threshold
    fn commit_reserve(&mut self, reserve_balance: ReserveAmount, now: Timestamp) {
        self.reserve_balance = reserve_balance;
        let next = self.phase_at(reserve_balance);
        if next != self.phase {
            info!(
                "pool {} graduated to {} at reserve {}",
                self.address, next, reserve_balance
            );
            self.events.push(PoolEvent::PhaseTransition {
                from: self.phase,
                to: next,
                reserve_balance,
                timestamp: now,
            });
            self.phase = next;
        }
    }

    // ============================================================================
    // Trading
    // ============================================================================

    /// Buy tokens with reserve
    ///
    /// The trade-size guard applies only once the pool is on the curve;
    /// flat-phase buys are unlimited so bootstrap liquidity can form.
    pub fn buy<M, R>(
        &mut self,
        token: &mut M,
        reserve: &mut R,
        caller: Address,
        request: BuyRequest,
        now: Timestamp,
    ) -> Result<BuyReceipt>
    where
        M: MintAuthority + ?Sized,
        R: ReserveAsset + ?Sized,
    {
        let result = self.try_buy(token, reserve, caller, request, now);
        if let Err(e) = &result {
            warn!("buy of {} by {} rejected: {}", request.reserve_in, caller, e);
        }
        result
    }

    fn try_buy<M, R>(
        &mut self,
        token: &mut M,
        reserve: &mut R,
        caller: Address,
        request: BuyRequest,
        now: Timestamp,
    ) -> Result<BuyReceipt>
    where
        M: MintAuthority + ?Sized,
        R: ReserveAsset + ?Sized,
    {
        let _guard = self.lock.acquire()?;

        self.ensure_active()?;
        check_amount(request.reserve_in)?;
        check_deadline(request.deadline, now)?;
        check_address(caller)?;
        check_address(request.recipient)?;

        let phase_before = self.phase;
        if phase_before.is_curve() {
            self.check_trade_size(request.reserve_in)?;
        }

        let quote = self.pricing(token.total_supply()).quote_buy(request.reserve_in)?;
        debug!("buy quote {:?}", quote);
        if quote.tokens_out < request.min_tokens_out {
            return Err(PoolError::SlippageExceeded {
                quoted: quote.tokens_out,
                minimum: request.min_tokens_out,
            });
        }
        if quote.tokens_out == 0 {
            return Err(PoolError::ZeroOutput);
        }

        let new_reserve = self
            .reserve_balance
            .checked_add(quote.net_reserve_in)
            .ok_or(curve_model::CurveError::Overflow)?;

        let (pool, treasury) = (self.address, self.treasury);
        settle(token, reserve, |token, reserve| {
            // Pull, then distribute
            reserve.transfer_from(caller, pool, quote.reserve_in)?;
            if quote.fee > 0 {
                reserve.transfer(treasury, quote.fee)?;
            }
            token.mint(request.recipient, quote.tokens_out)?;
            Ok(())
        })?;

        self.events.push(PoolEvent::Buy {
            buyer: caller,
            recipient: request.recipient,
            reserve_in: quote.reserve_in,
            fee: quote.fee,
            tokens_out: quote.tokens_out,
            reserve_balance: new_reserve,
            timestamp: now,
        });
        self.commit_reserve(new_reserve, now);

        info!(
            "buy: {} paid {} (fee {}) for {} tokens via {:?}, reserve {}",
            caller, quote.reserve_in, quote.fee, quote.tokens_out, quote.route, new_reserve
        );

        Ok(BuyReceipt {
            tokens_out: quote.tokens_out,
            reserve_in: quote.reserve_in,
            fee: quote.fee,
            route: quote.route,
            reserve_balance: self.reserve_balance,
            phase: self.phase,
        })
    }

    /// Sell tokens back for reserve
    ///
    /// Tokens are burned before any reserve leaves custody. The trade-size
    /// guard applies in both phases.
    pub fn sell<M, R>(
        &mut self,
        token: &mut M,
        reserve: &mut R,
        caller: Address,
        request: SellRequest,
        now: Timestamp,
    ) -> Result<SellReceipt>
    where
        M: MintAuthority + ?Sized,
        R: ReserveAsset + ?Sized,
    {
        let result = self.try_sell(token, reserve, caller, request, now);
        if let Err(e) = &result {
            warn!("sell of {} by {} rejected: {}", request.tokens_in, caller, e);
        }
        result
    }

    fn try_sell<M, R>(
        &mut self,
        token: &mut M,
        reserve: &mut R,
        caller: Address,
        request: SellRequest,
        now: Timestamp,
    ) -> Result<SellReceipt>
    where
        M: MintAuthority + ?Sized,
        R: ReserveAsset + ?Sized,
    {
        let _guard = self.lock.acquire()?;

        self.ensure_active()?;
        check_amount(request.tokens_in)?;
        check_deadline(request.deadline, now)?;
        check_address(caller)?;
        check_address(request.recipient)?;
        if now < self.buy_only_until {
            return Err(PoolError::SellsDisabled {
                until: self.buy_only_until,
                now,
            });
        }

        let quote = self.pricing(token.total_supply()).quote_sell(request.tokens_in)?;
        debug!("sell quote {:?}", quote);
        self.check_trade_size(quote.gross_reserve_out)?;
        if quote.reserve_out < request.min_reserve_out {
            return Err(PoolError::SlippageExceeded {
                quoted: quote.reserve_out,
                minimum: request.min_reserve_out,
            });
        }
        if quote.reserve_out == 0 {
            return Err(PoolError::ZeroOutput);
        }

        let new_reserve = self
            .reserve_balance
            .checked_sub(quote.gross_reserve_out)
            .ok_or(curve_model::CurveError::InsufficientReserve)?;

        let treasury = self.treasury;
        settle(token, reserve, |token, reserve| {
            token.burn(caller, quote.tokens_in)?;
            reserve.transfer(request.recipient, quote.reserve_out)?;
            if quote.fee > 0 {
                reserve.transfer(treasury, quote.fee)?;
            }
            Ok(())
        })?;

        self.events.push(PoolEvent::Sell {
            seller: caller,
            recipient: request.recipient,
            tokens_in: quote.tokens_in,
            reserve_out: quote.reserve_out,
            fee: quote.fee,
            reserve_balance: new_reserve,
            timestamp: now,
        });
        self.commit_reserve(new_reserve, now);

        info!(
            "sell: {} burned {} tokens for {} (fee {}) via {:?}, reserve {}",
            caller, quote.tokens_in, quote.reserve_out, quote.fee, quote.route, new_reserve
        );

        Ok(SellReceipt {
            reserve_out: quote.reserve_out,
            tokens_in: quote.tokens_in,
            fee: quote.fee,
            route: quote.route,
            reserve_balance: self.reserve_balance,
            phase: self.phase,
        })
    }

    // ============================================================================
    // Reserve management
    // ============================================================================

    /// Add revenue to the reserve without issuing tokens (raises the floor price)
    pub fn deposit_fees<R>(
        &mut self,
        reserve: &mut R,
        caller: Address,
        amount: ReserveAmount,
        now: Timestamp,
    ) -> Result<()>
    where
        R: ReserveAsset + ?Sized,
    {
        let _guard = self.lock.acquire()?;

        self.ensure_active()?;
        check_amount(amount)?;
        check_address(caller)?;

        let new_reserve = self
            .reserve_balance
            .checked_add(amount)
            .ok_or(curve_model::CurveError::Overflow)?;

        reserve.transfer_from(caller, self.address, amount)?;

        self.events.push(PoolEvent::FeesDeposited {
            from: caller,
            amount,
            reserve_balance: new_reserve,
            timestamp: now,
        });
        self.commit_reserve(new_reserve, now);

        info!("fees deposited: {} from {}, reserve {}", amount, caller, new_reserve);
        Ok(())
    }

    /// Custody balance above the accounted reserve
    pub fn surplus<R>(&self, reserve: &R) -> ReserveAmount
    where
        R: ReserveAsset + ?Sized,
    {
        reserve
            .balance_of(self.address)
            .saturating_sub(self.reserve_balance)
    }

    /// Withdraw surplus to `to`; the accounted reserve is never touched
    pub fn withdraw_treasury<R>(
        &mut self,
        reserve: &mut R,
        to: Address,
        amount: ReserveAmount,
        now: Timestamp,
    ) -> Result<()>
    where
        R: ReserveAsset + ?Sized,
    {
        let _guard = self.lock.acquire()?;

        check_amount(amount)?;
        check_address(to)?;

        let available = self.surplus(reserve);
        if amount > available {
            warn!("treasury withdrawal of {} exceeds surplus {}", amount, available);
            return Err(PoolError::SurplusExceeded {
                requested: amount,
                available,
            });
        }

        reserve.transfer(to, amount)?;

        self.events.push(PoolEvent::TreasuryWithdrawn {
            to,
            amount,
            timestamp: now,
        });
        info!("treasury withdrew {} to {}", amount, to);
        Ok(())
    }

    // ============================================================================
    // Administration
    // ============================================================================

    /// No-op if already paused
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.events.push(PoolEvent::Paused);
            info!("pool {} paused", self.address);
        }
    }

    pub fn unpause(&mut self) {
        if self.paused {
            self.paused = false;
            self.events.push(PoolEvent::Unpaused);
            info!("pool {} unpaused", self.address);
        }
    }

    fn record_update(&mut self, parameter: &'static str, old_value: u64, new_value: u64) {
        info!("{} updated: {} -> {}", parameter, old_value, new_value);
        self.events.push(PoolEvent::ParametersUpdated {
            parameter,
            old_value,
            new_value,
        });
    }

    pub fn set_trade_fee_bps(&mut self, bps: u16) -> Result<()> {
        let _guard = self.lock.acquire()?;
        check_trade_fee(bps)?;
        let old = std::mem::replace(&mut self.trade_fee_bps, bps);
        self.record_update("trade_fee_bps", old.into(), bps.into());
        Ok(())
    }

    pub fn set_crr_ppm(&mut self, crr_ppm: u32) -> Result<()> {
        let _guard = self.lock.acquire()?;
        check_crr(crr_ppm)?;
        let old = std::mem::replace(&mut self.crr_ppm, crr_ppm);
        self.record_update("crr_ppm", old.into(), crr_ppm.into());
        Ok(())
    }

    pub fn set_max_trade_bps(&mut self, bps: u16) -> Result<()> {
        let _guard = self.lock.acquire()?;
        check_max_trade(bps)?;
        let old = std::mem::replace(&mut self.max_trade_bps, bps);
        self.record_update("max_trade_bps", old.into(), bps.into());
        Ok(())
    }

    pub fn set_buy_only_until(&mut self, until: Timestamp) -> Result<()> {
        let _guard = self.lock.acquire()?;
        let old = std::mem::replace(&mut self.buy_only_until, until);
        self.record_update("buy_only_until", old, until);
        Ok(())
    }

    // ============================================================================
    // Views
    // ============================================================================

    pub fn pool_info<M>(&self, token: &M) -> Result<PoolInfo>
    where
        M: MintAuthority + ?Sized,
    {
        let pricing = self.pricing(token.total_supply());
        Ok(PoolInfo {
            reserve_balance: self.reserve_balance,
            supply: pricing.supply,
            price: pricing.spot_price()?,
            crr_ppm: self.crr_ppm,
            trade_fee_bps: self.trade_fee_bps,
            max_trade_bps: self.max_trade_bps,
            flat_curve_threshold: self.flat_curve_threshold,
            flat_curve_price: self.flat_curve_price,
            phase: self.phase,
        })
    }

    pub fn trade_info(&self, now: Timestamp) -> TradeInfo {
        TradeInfo {
            sells_enabled: !self.paused && now >= self.buy_only_until,
            buy_only_until: self.buy_only_until,
            paused: self.paused,
        }
    }

    /// Same quote `buy` would execute against, without guards
    pub fn quote_buy<M>(&self, token: &M, reserve_in: ReserveAmount) -> Result<BuyQuote>
    where
        M: MintAuthority + ?Sized,
    {
        Ok(self.pricing(token.total_supply()).quote_buy(reserve_in)?)
    }

    pub fn quote_sell<M>(&self, token: &M, tokens_in: TokenAmount) -> Result<SellQuote>
    where
        M: MintAuthority + ?Sized,
    {
        Ok(self.pricing(token.total_supply()).quote_sell(tokens_in)?)
    }

    pub fn calculate_buy_impact<M>(&self, token: &M, reserve_in: ReserveAmount) -> Result<TradeImpact>
    where
        M: MintAuthority + ?Sized,
    {
        let before = self.pricing(token.total_supply());
        let quote = before.quote_buy(reserve_in)?;

        let reserve_after = before
            .reserve_balance
            .checked_add(quote.net_reserve_in)
            .ok_or(curve_model::CurveError::Overflow)?;
        let after = PricingState {
            reserve_balance: reserve_after,
            supply: before
                .supply
                .checked_add(quote.tokens_out)
                .ok_or(curve_model::CurveError::Overflow)?,
            graduated: self.phase_at(reserve_after).is_curve(),
            ..before
        };

        impact(&before, &after, quote.tokens_out)
    }

    pub fn calculate_sell_impact<M>(&self, token: &M, tokens_in: TokenAmount) -> Result<TradeImpact>
    where
        M: MintAuthority + ?Sized,
    {
        let before = self.pricing(token.total_supply());
        let quote = before.quote_sell(tokens_in)?;

        let after = PricingState {
            reserve_balance: before.reserve_balance - quote.gross_reserve_out,
            supply: before.supply - tokens_in,
            ..before
        };

        impact(&before, &after, quote.reserve_out)
    }
}

fn impact(before: &PricingState, after: &PricingState, amount_out: u128) -> Result<TradeImpact> {
    let old_price = before.spot_price()?;
    let new_price = after.spot_price()?;
    let price_impact_bps = if old_price == 0 {
        0
    } else {
        mul_div(old_price.abs_diff(new_price), BPS_SCALE, old_price)?
    };

    Ok(TradeImpact {
        amount_out,
        price_impact_bps,
        new_spot_price: new_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InMemoryReserve, InMemoryToken};
    use curve_model::RESERVE_UNIT;

    fn params() -> PoolParams {
        PoolParams {
            address: Address::from_label("pool"),
            treasury: Address::from_label("treasury"),
            trade_fee_bps: 30,
            crr_ppm: 100_000,
            max_trade_bps: DEFAULT_MAX_TRADE_BPS,
            buy_only_until: 0,
            flat_curve_threshold: 25_000 * RESERVE_UNIT,
            flat_curve_price: 10_000,
        }
    }

    #[test]
    fn test_new_validates_bounds() {
        let bad = [
            PoolParams { trade_fee_bps: 1_001, ..params() },
            PoolParams { crr_ppm: 49_999, ..params() },
            PoolParams { crr_ppm: 500_001, ..params() },
            PoolParams { max_trade_bps: 0, ..params() },
            PoolParams { max_trade_bps: 5_001, ..params() },
            PoolParams { flat_curve_threshold: 0, ..params() },
            PoolParams { flat_curve_price: 0, ..params() },
        ];
        for p in bad {
            assert!(
                matches!(
                    PoolState::new(p.clone()),
                    Err(PoolError::Validation(ValidationError::InvalidParameter { .. }))
                ),
                "{:?}",
                p
            );
        }

        let zero_treasury = PoolParams { treasury: Address::ZERO, ..params() };
        assert_eq!(
            PoolState::new(zero_treasury).unwrap_err(),
            PoolError::Validation(ValidationError::ZeroAddress)
        );
        assert!(PoolState::new(params()).is_ok());
    }

    #[test]
    fn test_params_default_max_trade() {
        let json = r#"{
            "address": "pool",
            "treasury": "treasury",
            "trade_fee_bps": 30,
            "crr_ppm": 100000,
            "flat_curve_threshold": 25000000000,
            "flat_curve_price": 10000
        }"#;
        let parsed: PoolParams = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, params());
    }

    #[test]
    fn test_restore_above_threshold_is_graduated() {
        let pool = PoolState::restore(params(), 30_000 * RESERVE_UNIT, Phase::FlatPrice).unwrap();
        assert!(pool.has_graduated());
        let pool = PoolState::restore(params(), RESERVE_UNIT, Phase::BondingCurve).unwrap();
        assert!(pool.has_graduated());
    }

    #[test]
    fn test_setters_bounded_and_recorded() {
        let mut pool = PoolState::new(params()).unwrap();
        pool.set_trade_fee_bps(100).unwrap();
        assert!(pool.set_trade_fee_bps(1_001).is_err());
        assert!(pool.set_crr_ppm(10).is_err());
        pool.set_max_trade_bps(5_000).unwrap();
        pool.set_buy_only_until(99).unwrap();

        assert_eq!(pool.trade_fee_bps(), 100);
        assert_eq!(pool.max_trade_bps(), 5_000);
        assert_eq!(pool.buy_only_until(), 99);
        assert_eq!(pool.events().len(), 3);
        assert_eq!(
            pool.events()[0],
            PoolEvent::ParametersUpdated { parameter: "trade_fee_bps", old_value: 30, new_value: 100 }
        );
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut pool = PoolState::new(params()).unwrap();
        pool.pause();
        pool.pause();
        assert!(pool.is_paused());
        pool.unpause();
        pool.unpause();
        assert_eq!(pool.drain_events(), vec![PoolEvent::Paused, PoolEvent::Unpaused]);
        assert!(pool.events().is_empty());
    }

    #[test]
    fn test_deposit_fees_graduates() {
        let pool_addr = Address::from_label("pool");
        let payer = Address::from_label("payer");
        let mut pool = PoolState::restore(params(), 24_000 * RESERVE_UNIT, Phase::FlatPrice).unwrap();
        let mut reserve = InMemoryReserve::new(pool_addr);
        reserve.fund(payer, 2_000 * RESERVE_UNIT);

        pool.deposit_fees(&mut reserve, payer, 1_000 * RESERVE_UNIT, 5).unwrap();
        assert_eq!(pool.reserve_balance(), 25_000 * RESERVE_UNIT);
        assert!(pool.has_graduated());
        assert_eq!(reserve.balance_of(pool_addr), 1_000 * RESERVE_UNIT);
        assert!(matches!(pool.events().last(), Some(PoolEvent::PhaseTransition { .. })));
    }

    #[test]
    fn test_buy_impact_matches_execution() {
        let alice = Address::from_label("alice");
        let mut pool = PoolState::new(params()).unwrap();
        let mut token = InMemoryToken::new();
        let mut reserve = InMemoryReserve::new(pool.address());
        reserve.fund(alice, 1_000_000 * RESERVE_UNIT);

        let impact = pool.calculate_buy_impact(&token, 30_000 * RESERVE_UNIT).unwrap();
        let request = BuyRequest {
            reserve_in: 30_000 * RESERVE_UNIT,
            min_tokens_out: impact.amount_out,
            recipient: alice,
            deadline: 10,
        };
        let receipt = pool.buy(&mut token, &mut reserve, alice, request, 1).unwrap();
        assert_eq!(receipt.tokens_out, impact.amount_out);
        assert_eq!(pool.pool_info(&token).unwrap().price, impact.new_spot_price);
        assert!(impact.price_impact_bps > 0);
        assert_eq!(token.total_supply(), receipt.tokens_out);
    }
}
