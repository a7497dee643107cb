//! Pool inspection and quotes

use anyhow::{Context, Result};
use colored::Colorize;
use curvepool::{Route, Timestamp};

use crate::config::Market;
use crate::units::{format_reserve, format_tokens, parse_reserve, parse_tokens};

pub fn show_info(market: &Market, now: Timestamp) -> Result<()> {
    let info = market
        .pool
        .pool_info(&market.token)
        .context("Failed to read pool info")?;
    let trade = market.pool.trade_info(now);

    println!("{}", "=== Pool ===".bright_green().bold());
    println!("{} {}", "Address:".bright_cyan(), market.pool.address());
    println!("{} {}", "Phase:".bright_cyan(), info.phase);
    println!("{} {}", "Reserve:".bright_cyan(), format_reserve(info.reserve_balance));
    println!("{} {}", "Supply:".bright_cyan(), format_tokens(info.supply));
    println!("{} {}", "Spot price:".bright_cyan(), format_reserve(info.price));
    println!(
        "{} {} at {}",
        "Flat phase:".bright_cyan(),
        format_reserve(info.flat_curve_price),
        format_reserve(info.flat_curve_threshold)
    );
    println!("{} {} ppm", "Reserve ratio:".bright_cyan(), info.crr_ppm);
    println!("{} {} bps", "Trade fee:".bright_cyan(), info.trade_fee_bps);
    println!(
        "{} {} bps ({} per trade)",
        "Max trade:".bright_cyan(),
        info.max_trade_bps,
        format_reserve(market.pool.trade_size_limit()?)
    );
    println!(
        "{} {}",
        "Surplus:".bright_cyan(),
        format_reserve(market.pool.surplus(&market.reserve))
    );

    println!("\n{}", "=== Trading ===".bright_green().bold());
    let status = if trade.paused {
        "paused".red()
    } else {
        "active".green()
    };
    println!("{} {}", "Status:".bright_cyan(), status);
    let sells = if trade.sells_enabled {
        "enabled".green()
    } else {
        format!("disabled until {}", trade.buy_only_until).yellow()
    };
    println!("{} {}", "Sells:".bright_cyan(), sells);
    Ok(())
}

fn describe_route(route: Route) -> String {
    match route {
        Route::Flat => "flat price".to_string(),
        Route::Curve => "bonding curve".to_string(),
        Route::Hybrid {
            flat_portion,
            curve_portion,
        } => format!(
            "hybrid ({} flat, {} curve)",
            format_reserve(flat_portion),
            format_reserve(curve_portion)
        ),
    }
}

pub fn quote_buy(market: &Market, amount: &str) -> Result<()> {
    let reserve_in = parse_reserve(amount).context("Invalid reserve amount")?;
    let quote = market.pool.quote_buy(&market.token, reserve_in)?;
    let impact = market.pool.calculate_buy_impact(&market.token, reserve_in)?;

    println!("{}", "=== Buy Quote ===".bright_green().bold());
    println!("{} {}", "Pay:".bright_cyan(), format_reserve(quote.reserve_in));
    println!("{} {}", "Fee:".bright_cyan(), format_reserve(quote.fee));
    println!("{} {}", "Receive:".bright_cyan(), format_tokens(quote.tokens_out));
    println!("{} {}", "Route:".bright_cyan(), describe_route(quote.route));
    println!("{} {} bps", "Price impact:".bright_cyan(), impact.price_impact_bps);
    println!("{} {}", "New spot price:".bright_cyan(), format_reserve(impact.new_spot_price));

    if market.pool.has_graduated() && reserve_in > market.pool.trade_size_limit()? {
        println!(
            "\n{}",
            "Exceeds the per-trade size limit; the pool would reject it".yellow()
        );
    }
    Ok(())
}

pub fn quote_sell(market: &Market, amount: &str) -> Result<()> {
    let tokens_in = parse_tokens(amount).context("Invalid token amount")?;
    let quote = market.pool.quote_sell(&market.token, tokens_in)?;
    let impact = market.pool.calculate_sell_impact(&market.token, tokens_in)?;

    println!("{}", "=== Sell Quote ===".bright_green().bold());
    println!("{} {}", "Sell:".bright_cyan(), format_tokens(quote.tokens_in));
    println!("{} {}", "Fee:".bright_cyan(), format_reserve(quote.fee));
    println!("{} {}", "Receive:".bright_cyan(), format_reserve(quote.reserve_out));
    println!("{} {}", "Route:".bright_cyan(), describe_route(quote.route));
    println!("{} {} bps", "Price impact:".bright_cyan(), impact.price_impact_bps);
    println!("{} {}", "New spot price:".bright_cyan(), format_reserve(impact.new_spot_price));

    if quote.gross_reserve_out > market.pool.trade_size_limit()? {
        println!(
            "\n{}",
            "Exceeds the per-trade size limit; the pool would reject it".yellow()
        );
    }
    Ok(())
}
