//! Two-phase pricer: flat bootstrap price, then the CRR curve
//!
//! Routing for a buy of `net` reserve (after fee):
//! - graduated, or reserve already at/above the threshold → curve
//! - `reserve + net ≤ threshold` → flat
//! - otherwise hybrid: the part up to the threshold is priced flat, the
//!   remainder on the curve starting from `(threshold, supply + flat_tokens)`
//!
//! The hybrid ordering (flat first, curve second on the post-flat supply)
//! is a protocol rule. Reversing it changes the result.

use crate::curve::{calculate_buy, calculate_sell, calculate_spot_price};
use crate::fixed::mul_div;
use crate::{CurveError, BPS_SCALE, TOKEN_UNIT};

/// Pricing phase. Once `BondingCurve`, a pool never returns to `FlatPrice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    FlatPrice,
    BondingCurve,
}

impl Phase {
    pub fn is_curve(self) -> bool {
        matches!(self, Phase::BondingCurve)
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Phase::FlatPrice => write!(f, "flat-price"),
            Phase::BondingCurve => write!(f, "bonding-curve"),
        }
    }
}

/// Which pricing path a quote went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Route {
    Flat,
    Curve,
    /// Straddles the threshold; portions are net reserve amounts
    Hybrid { flat_portion: u128, curve_portion: u128 },
}

/// Buy quote breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuyQuote {
    /// Tokens minted to the buyer (18 decimals)
    pub tokens_out: u128,
    /// Gross reserve paid by the buyer
    pub reserve_in: u128,
    /// Fee forwarded to the treasury
    pub fee: u128,
    /// Reserve credited to the pool (`reserve_in - fee`)
    pub net_reserve_in: u128,
    /// Tokens priced at the flat price
    pub flat_tokens: u128,
    /// Tokens priced on the curve
    pub curve_tokens: u128,
    pub route: Route,
}

/// Sell quote breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SellQuote {
    /// Reserve paid to the seller, after fee
    pub reserve_out: u128,
    /// Reserve released from the pool's accounting
    pub gross_reserve_out: u128,
    /// Fee forwarded to the treasury
    pub fee: u128,
    /// Tokens burned
    pub tokens_in: u128,
    pub route: Route,
}

/// Read-only snapshot of everything pricing depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricingState {
    /// Accounted reserve (6 decimals)
    pub reserve_balance: u128,
    /// Circulating token supply (18 decimals)
    pub supply: u128,
    /// Sticky graduation flag
    pub graduated: bool,
    /// Reserve level at which the pool leaves the flat phase
    pub flat_curve_threshold: u128,
    /// Reserve units (6 decimals) per whole token
    pub flat_curve_price: u128,
    pub crr_ppm: u32,
    pub trade_fee_bps: u16,
}

/// Split a gross amount into `(net, fee)`, fee rounded down
pub fn split_fee(amount: u128, fee_bps: u16) -> Result<(u128, u128), CurveError> {
    let fee = mul_div(amount, fee_bps as u128, BPS_SCALE)?;
    Ok((amount - fee, fee))
}

/// Tokens bought with `reserve` at the flat price
pub fn flat_tokens_for(reserve: u128, price: u128) -> Result<u128, CurveError> {
    mul_div(reserve, TOKEN_UNIT, price)
}

/// Reserve released for `tokens` at the flat price
pub fn flat_reserve_for(tokens: u128, price: u128) -> Result<u128, CurveError> {
    mul_div(tokens, price, TOKEN_UNIT)
}

impl PricingState {
    /// `BondingCurve` once graduated; before that the reserve level decides
    pub fn current_phase(&self) -> Phase {
        if self.graduated || self.reserve_balance >= self.flat_curve_threshold {
            Phase::BondingCurve
        } else {
            Phase::FlatPrice
        }
    }

    pub fn quote_buy(&self, reserve_in: u128) -> Result<BuyQuote, CurveError> {
        let (net, fee) = split_fee(reserve_in, self.trade_fee_bps)?;

        let (flat_tokens, curve_tokens, route) = if self.current_phase().is_curve() {
            match self.curve_buy(net, self.reserve_balance, self.supply)? {
                Some(tokens) => (0, tokens, Route::Curve),
                None => (flat_tokens_for(net, self.flat_curve_price)?, 0, Route::Flat),
            }
        } else {
            let future_reserve = self
                .reserve_balance
                .checked_add(net)
                .ok_or(CurveError::Overflow)?;

            if future_reserve <= self.flat_curve_threshold {
                (flat_tokens_for(net, self.flat_curve_price)?, 0, Route::Flat)
            } else {
                let flat_portion = self.flat_curve_threshold - self.reserve_balance;
                let curve_portion = net - flat_portion;
                let flat_tokens = flat_tokens_for(flat_portion, self.flat_curve_price)?;

                let basis_supply = self
                    .supply
                    .checked_add(flat_tokens)
                    .ok_or(CurveError::Overflow)?;
                let curve_tokens = match self.curve_buy(
                    curve_portion,
                    self.flat_curve_threshold,
                    basis_supply,
                )? {
                    Some(tokens) => tokens,
                    None => flat_tokens_for(curve_portion, self.flat_curve_price)?,
                };
                (
                    flat_tokens,
                    curve_tokens,
                    Route::Hybrid {
                        flat_portion,
                        curve_portion,
                    },
                )
            }
        };

        let tokens_out = flat_tokens
            .checked_add(curve_tokens)
            .ok_or(CurveError::Overflow)?;

        Ok(BuyQuote {
            tokens_out,
            reserve_in,
            fee,
            net_reserve_in: net,
            flat_tokens,
            curve_tokens,
            route,
        })
    }

    pub fn quote_sell(&self, tokens_in: u128) -> Result<SellQuote, CurveError> {
        if tokens_in > self.supply {
            return Err(CurveError::SellExceedsSupply);
        }

        let (gross, route) = match self.current_phase() {
            Phase::FlatPrice => {
                let gross = flat_reserve_for(tokens_in, self.flat_curve_price)?;
                if gross > self.reserve_balance {
                    return Err(CurveError::InsufficientReserve);
                }
                (gross, Route::Flat)
            }
            Phase::BondingCurve => (
                calculate_sell(self.reserve_balance, self.supply, tokens_in, self.crr_ppm)?,
                Route::Curve,
            ),
        };

        let (net, fee) = split_fee(gross, self.trade_fee_bps)?;
        Ok(SellQuote {
            reserve_out: net,
            gross_reserve_out: gross,
            fee,
            tokens_in,
            route,
        })
    }

    /// Marginal price in reserve units per whole token
    ///
    /// Falls back to the flat price while the curve has no supply basis.
    pub fn spot_price(&self) -> Result<u128, CurveError> {
        match self.current_phase() {
            Phase::FlatPrice => Ok(self.flat_curve_price),
            Phase::BondingCurve => Ok(
                calculate_spot_price(self.reserve_balance, self.supply, self.crr_ppm)?
                    .unwrap_or(self.flat_curve_price),
            ),
        }
    }

    /// Curve buy, or `None` when the basis is empty and the caller must price flat
    fn curve_buy(
        &self,
        amount: u128,
        reserve: u128,
        supply: u128,
    ) -> Result<Option<u128>, CurveError> {
        match calculate_buy(amount, reserve, supply, self.crr_ppm) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(CurveError::UndefinedBasis) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
