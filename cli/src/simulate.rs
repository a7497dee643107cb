//! Scripted trade simulation against in-memory collaborators

use anyhow::{Context, Result};
use colored::Colorize;
use curvepool::{BuyReceipt, BuyRequest, PoolEvent, PoolInfo, SellReceipt, SellRequest, Timestamp};
use serde::Serialize;

use crate::config::{parse_address, Market, TradeStep};
use crate::units::{format_reserve, format_tokens, parse_reserve, parse_tokens};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Bought(BuyReceipt),
    Sold(SellReceipt),
    Done,
    Rejected(String),
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub action: String,
    pub at: Timestamp,
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepReport>,
    pub events: Vec<PoolEvent>,
    pub final_state: PoolInfo,
}

fn describe(step: &TradeStep) -> String {
    match step {
        TradeStep::Buy { account, amount, .. } => format!("{} buys with {}", account, amount),
        TradeStep::Sell { account, amount, .. } => format!("{} sells {} tokens", account, amount),
        TradeStep::DepositFees { account, amount, .. } => {
            format!("{} deposits {} in fees", account, amount)
        }
        TradeStep::WithdrawTreasury { to, amount, .. } => {
            format!("treasury withdraws {} to {}", amount, to)
        }
        TradeStep::Donate { amount } => format!("{} donated to pool", amount),
        TradeStep::Pause => "pause".to_string(),
        TradeStep::Unpause => "unpause".to_string(),
    }
}

/// Run every step in order. Rejected steps are recorded, not fatal.
pub fn run(market: &mut Market, trades: &[TradeStep]) -> Result<SimulationReport> {
    let mut steps = Vec::with_capacity(trades.len());
    let mut clock: Timestamp = 0;

    for (index, step) in trades.iter().enumerate() {
        let at = match step {
            TradeStep::Buy { at, .. }
            | TradeStep::Sell { at, .. }
            | TradeStep::DepositFees { at, .. }
            | TradeStep::WithdrawTreasury { at, .. } => at.unwrap_or(clock),
            _ => clock,
        };
        clock = clock.max(at);

        let result = apply(market, step, at).with_context(|| format!("step {}", index + 1))?;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Rejected(e.to_string()),
        };

        steps.push(StepReport {
            step: index + 1,
            action: describe(step),
            at,
            outcome,
        });
    }

    Ok(SimulationReport {
        steps,
        events: market.pool.drain_events(),
        final_state: market.pool.pool_info(&market.token)?,
    })
}

/// Outer error: malformed step. Inner error: the pool said no.
fn apply(
    market: &mut Market,
    step: &TradeStep,
    at: Timestamp,
) -> Result<curvepool::Result<Outcome>> {
    let Market {
        pool,
        token,
        reserve,
    } = market;

    Ok(match step {
        TradeStep::Buy {
            account,
            amount,
            min_out,
            ..
        } => {
            let who = parse_address(account)?;
            let request = BuyRequest {
                reserve_in: parse_reserve(amount)?,
                min_tokens_out: min_out.as_deref().map(parse_tokens).transpose()?.unwrap_or(0),
                recipient: who,
                deadline: at,
            };
            pool.buy(token, reserve, who, request, at).map(Outcome::Bought)
        }
        TradeStep::Sell {
            account,
            amount,
            min_out,
            ..
        } => {
            let who = parse_address(account)?;
            let request = SellRequest {
                tokens_in: parse_tokens(amount)?,
                min_reserve_out: min_out.as_deref().map(parse_reserve).transpose()?.unwrap_or(0),
                recipient: who,
                deadline: at,
            };
            pool.sell(token, reserve, who, request, at).map(Outcome::Sold)
        }
        TradeStep::DepositFees { account, amount, .. } => {
            let who = parse_address(account)?;
            pool.deposit_fees(reserve, who, parse_reserve(amount)?, at)
                .map(|_| Outcome::Done)
        }
        TradeStep::WithdrawTreasury { to, amount, .. } => {
            let to = parse_address(to)?;
            pool.withdraw_treasury(reserve, to, parse_reserve(amount)?, at)
                .map(|_| Outcome::Done)
        }
        TradeStep::Donate { amount } => {
            reserve.donate(parse_reserve(amount)?);
            Ok(Outcome::Done)
        }
        TradeStep::Pause => {
            pool.pause();
            Ok(Outcome::Done)
        }
        TradeStep::Unpause => {
            pool.unpause();
            Ok(Outcome::Done)
        }
    })
}

pub fn print_report(report: &SimulationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}", "=== Simulation ===".bright_green().bold());
    for step in &report.steps {
        let prefix = format!("[{:>3}] t={:<6}", step.step, step.at).dimmed();
        match &step.outcome {
            Outcome::Bought(r) => println!(
                "{} {} -> {} tokens (fee {}, reserve {}, {})",
                prefix,
                step.action,
                format_tokens(r.tokens_out).bright_white(),
                format_reserve(r.fee),
                format_reserve(r.reserve_balance),
                r.phase
            ),
            Outcome::Sold(r) => println!(
                "{} {} -> {} reserve (fee {}, reserve {}, {})",
                prefix,
                step.action,
                format_reserve(r.reserve_out).bright_white(),
                format_reserve(r.fee),
                format_reserve(r.reserve_balance),
                r.phase
            ),
            Outcome::Done => println!("{} {} {}", prefix, step.action, "ok".green()),
            Outcome::Rejected(reason) => {
                println!("{} {} {} {}", prefix, step.action, "rejected:".red(), reason)
            }
        }
    }

    println!("\n{}", "=== Events ===".bright_green().bold());
    for event in &report.events {
        println!("  {}", event.name().bright_cyan());
    }

    let state = &report.final_state;
    println!("\n{}", "=== Final State ===".bright_green().bold());
    println!("{} {}", "Phase:".bright_cyan(), state.phase);
    println!("{} {}", "Reserve:".bright_cyan(), format_reserve(state.reserve_balance));
    println!("{} {}", "Supply:".bright_cyan(), format_tokens(state.supply));
    println!("{} {}", "Spot price:".bright_cyan(), format_reserve(state.price));
    Ok(())
}
