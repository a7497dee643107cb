//! Raw bonding curve math, no pool state involved

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use curve_model::{calculate_buy, calculate_sell, calculate_spot_price, CurveError};

use crate::units::{format_reserve, format_tokens, parse_reserve, parse_tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurvePoint {
    pub reserve_balance: u128,
    pub supply: u128,
    pub crr_ppm: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveReport {
    pub spot_price: Option<u128>,
    pub tokens_for_buy: Option<u128>,
    pub reserve_for_sell: Option<u128>,
}

fn math(e: CurveError) -> anyhow::Error {
    anyhow!("curve math failed: {}", e)
}

pub fn evaluate(point: CurvePoint, buy: Option<u128>, sell: Option<u128>) -> Result<CurveReport> {
    let spot_price =
        calculate_spot_price(point.reserve_balance, point.supply, point.crr_ppm).map_err(math)?;
    let tokens_for_buy = buy
        .map(|reserve_in| {
            calculate_buy(reserve_in, point.reserve_balance, point.supply, point.crr_ppm)
        })
        .transpose()
        .map_err(math)?;
    let reserve_for_sell = sell
        .map(|tokens_in| {
            calculate_sell(point.reserve_balance, point.supply, tokens_in, point.crr_ppm)
        })
        .transpose()
        .map_err(math)?;

    Ok(CurveReport {
        spot_price,
        tokens_for_buy,
        reserve_for_sell,
    })
}

pub fn run(
    reserve: &str,
    supply: &str,
    crr_ppm: u32,
    buy: Option<&str>,
    sell: Option<&str>,
) -> Result<()> {
    let point = CurvePoint {
        reserve_balance: parse_reserve(reserve).context("--reserve")?,
        supply: parse_tokens(supply).context("--supply")?,
        crr_ppm,
    };
    let buy = buy.map(parse_reserve).transpose().context("--buy")?;
    let sell = sell.map(parse_tokens).transpose().context("--sell")?;

    let report = evaluate(point, buy, sell)?;

    println!("{}", "=== Curve ===".bright_green().bold());
    println!("{} {}", "Reserve:".bright_cyan(), format_reserve(point.reserve_balance));
    println!("{} {}", "Supply:".bright_cyan(), format_tokens(point.supply));
    println!("{} {} ppm", "Reserve ratio:".bright_cyan(), point.crr_ppm);
    match report.spot_price {
        Some(price) => println!("{} {}", "Spot price:".bright_cyan(), format_reserve(price)),
        None => println!("{} {}", "Spot price:".bright_cyan(), "undefined (no supply)".yellow()),
    }

    if let (Some(reserve_in), Some(tokens)) = (buy, report.tokens_for_buy) {
        println!(
            "{} {} -> {} tokens",
            "Buy:".bright_cyan(),
            format_reserve(reserve_in),
            format_tokens(tokens)
        );
    }
    if let (Some(tokens_in), Some(out)) = (sell, report.reserve_for_sell) {
        println!(
            "{} {} tokens -> {}",
            "Sell:".bright_cyan(),
            format_tokens(tokens_in),
            format_reserve(out)
        );
    }
    Ok(())
}
