//! Pool configuration file
//!
//! ```toml
//! [pool]
//! trade_fee_bps = 30
//! crr_ppm = 100000
//! flat_curve_threshold = "25000"   # reserve units
//! flat_curve_price = "0.01"        # reserve units per token
//!
//! [state]                          # optional: resume a live pool
//! reserve_balance = "9970"
//! supply = "997000"
//!
//! [accounts]                       # starting reserve balances
//! alice = "50000"
//!
//! [[trades]]                       # simulator script
//! kind = "buy"
//! account = "alice"
//! amount = "10000"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use curvepool::{
    Address, InMemoryReserve, InMemoryToken, Phase, PoolParams, PoolState, Timestamp,
    DEFAULT_MAX_TRADE_BPS,
};
use serde::Deserialize;

use crate::units::{parse_reserve, parse_tokens};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub pool: PoolSection,
    #[serde(default)]
    pub state: StateSection,
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
    #[serde(default)]
    pub trades: Vec<TradeStep>,
}

fn default_pool_address() -> String {
    "pool".to_string()
}

fn default_treasury() -> String {
    "treasury".to_string()
}

fn default_holder() -> String {
    "genesis".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSection {
    #[serde(default = "default_pool_address")]
    pub address: String,
    #[serde(default = "default_treasury")]
    pub treasury: String,
    pub trade_fee_bps: u16,
    pub crr_ppm: u32,
    #[serde(default)]
    pub max_trade_bps: Option<u16>,
    #[serde(default)]
    pub buy_only_until: Option<Timestamp>,
    pub flat_curve_threshold: String,
    pub flat_curve_price: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSection {
    #[serde(default)]
    pub reserve_balance: Option<String>,
    #[serde(default)]
    pub supply: Option<String>,
    #[serde(default)]
    pub graduated: bool,
    /// Account credited with the pre-existing supply
    #[serde(default = "default_holder")]
    pub holder: String,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            reserve_balance: None,
            supply: None,
            graduated: false,
            holder: default_holder(),
        }
    }
}

/// One scripted simulator action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TradeStep {
    Buy {
        account: String,
        /// Reserve paid, fee included
        amount: String,
        #[serde(default)]
        min_out: Option<String>,
        #[serde(default)]
        at: Option<Timestamp>,
    },
    Sell {
        account: String,
        /// Tokens sold
        amount: String,
        #[serde(default)]
        min_out: Option<String>,
        #[serde(default)]
        at: Option<Timestamp>,
    },
    DepositFees {
        account: String,
        amount: String,
        #[serde(default)]
        at: Option<Timestamp>,
    },
    WithdrawTreasury {
        to: String,
        amount: String,
        #[serde(default)]
        at: Option<Timestamp>,
    },
    /// Reserve sent straight to the pool account (creates surplus)
    Donate { amount: String },
    Pause,
    Unpause,
}

/// A pool with its in-memory collaborators
pub struct Market {
    pub pool: PoolState,
    pub token: InMemoryToken,
    pub reserve: InMemoryReserve,
}

pub fn parse_address(label: &str) -> Result<Address> {
    label
        .parse()
        .with_context(|| format!("Invalid address: {}", label))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn pool_params(&self) -> Result<PoolParams> {
        let pool = &self.pool;
        Ok(PoolParams {
            address: parse_address(&pool.address)?,
            treasury: parse_address(&pool.treasury)?,
            trade_fee_bps: pool.trade_fee_bps,
            crr_ppm: pool.crr_ppm,
            max_trade_bps: pool.max_trade_bps.unwrap_or(DEFAULT_MAX_TRADE_BPS),
            buy_only_until: pool.buy_only_until.unwrap_or(0),
            flat_curve_threshold: parse_reserve(&pool.flat_curve_threshold)
                .context("pool.flat_curve_threshold")?,
            flat_curve_price: parse_reserve(&pool.flat_curve_price)
                .context("pool.flat_curve_price")?,
        })
    }

    /// Build the pool, resume `[state]` and fund `[accounts]`
    pub fn open_market(&self) -> Result<Market> {
        let params = self.pool_params()?;

        let reserve_balance = match &self.state.reserve_balance {
            Some(amount) => parse_reserve(amount).context("state.reserve_balance")?,
            None => 0,
        };
        let supply = match &self.state.supply {
            Some(amount) => parse_tokens(amount).context("state.supply")?,
            None => 0,
        };
        let phase = if self.state.graduated {
            Phase::BondingCurve
        } else {
            Phase::FlatPrice
        };

        let pool = PoolState::restore(params, reserve_balance, phase)
            .context("Invalid pool parameters")?;

        let mut token = InMemoryToken::new();
        if supply > 0 {
            token = token.with_balance(parse_address(&self.state.holder)?, supply);
        }

        let mut reserve = InMemoryReserve::new(pool.address());
        reserve.donate(reserve_balance);
        for (account, amount) in &self.accounts {
            let amount = parse_reserve(amount)
                .with_context(|| format!("accounts.{}", account))?;
            reserve.fund(parse_address(account)?, amount);
        }

        Ok(Market {
            pool,
            token,
            reserve,
        })
    }
}
