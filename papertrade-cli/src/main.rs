//! PaperTrade CLI — simulated trading against live Binance prices.
//!
//! Commands:
//! - `quote` — fetch latest prices and re-evaluate pending orders
//! - `candles` — OHLCV table with MA20 and Bollinger band columns
//! - `order buy|sell` — place a market, limit, stop-loss, or take-profit order
//! - `cancel` — cancel a pending order
//! - `orders` / `trades` — order book and trade history
//! - `status` — balance, positions, portfolio value, P&L, statistics
//! - `refresh` — fetch prices and process pending orders
//! - `export` — write trade history as CSV
//! - `reset` — discard all state and start over

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::CliConfig;
use papertrade_core::data::{BinanceProvider, DocumentStore, MarketDataProvider};
use papertrade_core::domain::{Order, OrderId, OrderStatus, OrderType, Side};
use papertrade_core::engine::{Simulator, DEFAULT_INITIAL_BALANCE};
use papertrade_core::indicators::{bollinger, BollingerBands};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "papertrade",
    about = "PaperTrade CLI — paper-trading simulator on live exchange prices"
)]
struct Cli {
    /// User id owning the simulator state.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Directory holding per-user state documents.
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Path to a papertrade.toml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch latest prices and re-evaluate pending orders.
    Quote {
        /// Symbols to quote (e.g., BTCUSDT ETHUSDT).
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Print recent OHLCV candles with MA20 and Bollinger bands.
    Candles {
        symbol: String,

        /// Candle interval: 1m, 5m, 15m, 1h, 4h, 1d.
        #[arg(long)]
        interval: Option<String>,

        /// Number of candles to fetch.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Place an order.
    Order {
        /// buy or sell.
        side: String,

        symbol: String,

        quantity: f64,

        /// Limit price: buy at or below, sell at or above.
        #[arg(long)]
        limit: Option<f64>,

        /// Stop-loss trigger price (fills when price falls to it).
        #[arg(long)]
        stop_loss: Option<f64>,

        /// Take-profit trigger price (fills when price rises to it).
        #[arg(long)]
        take_profit: Option<f64>,
    },
    /// Cancel a pending order by id.
    Cancel { order_id: u64 },
    /// List orders (pending only by default).
    Orders {
        /// Include executed, cancelled, and expired orders.
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// List completed trades.
    Trades,
    /// Show balance, positions, portfolio value, P&L, and statistics.
    Status,
    /// Fetch prices for symbols and process pending orders.
    Refresh {
        /// Symbols to refresh. Defaults to every symbol with open interest.
        symbols: Vec<String>,
    },
    /// Export trade history as CSV.
    Export {
        /// Output file path.
        #[arg(long, default_value = "trades.csv")]
        out: PathBuf,
    },
    /// Discard all state and start over with a fresh balance.
    Reset {
        /// Starting balance for the new simulator.
        #[arg(long)]
        balance: Option<f64>,

        /// Actually reset (without this flag, only previews what would be lost).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

/// Flag/file/default resolution for the global options.
struct AppContext {
    user: String,
    store: DocumentStore,
    interval: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = CliConfig::load(cli.config.as_deref())?;

    let user = cli
        .user
        .or(file_config.user)
        .unwrap_or_else(|| config::DEFAULT_USER.to_string());
    let store_dir = cli
        .store_dir
        .or(file_config.store_dir)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_STORE_DIR));
    let interval = file_config
        .interval
        .unwrap_or_else(|| config::DEFAULT_INTERVAL.to_string());

    let ctx = AppContext {
        user,
        store: DocumentStore::new(store_dir),
        interval,
    };

    match cli.command {
        Commands::Quote { symbols } => run_quote(&ctx, &symbols),
        Commands::Candles {
            symbol,
            interval,
            limit,
        } => run_candles(&ctx, &symbol, interval.as_deref(), limit),
        Commands::Order {
            side,
            symbol,
            quantity,
            limit,
            stop_loss,
            take_profit,
        } => run_order(&ctx, &side, &symbol, quantity, limit, stop_loss, take_profit),
        Commands::Cancel { order_id } => run_cancel(&ctx, order_id),
        Commands::Orders { all } => run_orders(&ctx, all),
        Commands::Trades => run_trades(&ctx),
        Commands::Status => run_status(&ctx),
        Commands::Refresh { symbols } => run_refresh(&ctx, &symbols),
        Commands::Export { out } => run_export(&ctx, &out),
        Commands::Reset { balance, confirm } => run_reset(&ctx, balance, confirm),
    }
}

/// Load the user's simulator, or a fresh one if they have no document yet.
fn load_simulator(ctx: &AppContext) -> Result<Simulator> {
    let snapshot = ctx
        .store
        .load(&ctx.user)
        .with_context(|| format!("failed to load state for user '{}'", ctx.user))?;
    Ok(match snapshot {
        Some(snapshot) => Simulator::from_snapshot(snapshot),
        None => Simulator::new(DEFAULT_INITIAL_BALANCE),
    })
}

fn save_simulator(ctx: &AppContext, sim: &Simulator) -> Result<()> {
    ctx.store
        .save(&ctx.user, &sim.snapshot())
        .with_context(|| format!("failed to save state for user '{}'", ctx.user))
}

/// Fetch latest prices for symbols; failures are reported, not fatal.
fn fetch_prices(provider: &BinanceProvider, symbols: &[String]) -> HashMap<String, f64> {
    let mut prices = HashMap::new();
    for symbol in symbols {
        let symbol = symbol.to_uppercase();
        match provider.latest_price(&symbol) {
            Ok(price) => {
                prices.insert(symbol, price);
            }
            Err(e) => eprintln!("Warning: could not fetch {symbol}: {e}"),
        }
    }
    prices
}

/// Run one processing pass and return every order that left Pending during
/// it, in creation order. Covers both fills and trigger-time cancellations
/// (e.g. insufficient balance), which the engine resolves but does not list
/// among the executed ids.
fn resolve_pending(sim: &mut Simulator, prices: &HashMap<String, f64>) -> Vec<OrderId> {
    let pending_before: Vec<OrderId> = sim.pending_orders().iter().map(|o| o.id).collect();
    sim.process_pending_orders(prices);
    pending_before
        .into_iter()
        .filter(|&id| sim.get_order(id).is_some_and(|o| !o.is_pending()))
        .collect()
}

/// Process pending orders against fetched prices and print what happened.
fn process_and_report(sim: &mut Simulator, prices: &HashMap<String, f64>) {
    for id in resolve_pending(sim, prices) {
        if let Some(order) = sim.get_order(id) {
            match &order.status {
                OrderStatus::Executed => println!(
                    "Executed order #{id}: {} {} {} @ {:.2}",
                    order.side,
                    order.quantity,
                    order.symbol,
                    order.executed_price.unwrap_or(0.0)
                ),
                OrderStatus::Cancelled { reason } => {
                    println!("Cancelled order #{id}: {reason}");
                }
                _ => {}
            }
        }
    }
}

fn run_quote(ctx: &AppContext, symbols: &[String]) -> Result<()> {
    let provider = BinanceProvider::new();
    let prices = fetch_prices(&provider, symbols);

    if prices.is_empty() {
        bail!("no prices could be fetched");
    }

    let mut rows: Vec<(&String, &f64)> = prices.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    for (symbol, price) in rows {
        println!("{symbol:<12} {price:>14.2}");
    }

    let mut sim = load_simulator(ctx)?;
    process_and_report(&mut sim, &prices);
    save_simulator(ctx, &sim)?;
    Ok(())
}

fn run_candles(ctx: &AppContext, symbol: &str, interval: Option<&str>, limit: usize) -> Result<()> {
    let interval = interval.unwrap_or(&ctx.interval);
    let provider = BinanceProvider::new();
    let candles = provider
        .fetch_candles(symbol, interval, limit)
        .with_context(|| format!("failed to fetch candles for {symbol}"))?;

    if candles.is_empty() {
        println!("No candles returned for {symbol}.");
        return Ok(());
    }

    let bands = BollingerBands::compute(
        &candles,
        bollinger::DEFAULT_PERIOD,
        bollinger::DEFAULT_MULTIPLIER,
    );

    println!("{} {} ({} candles)", symbol.to_uppercase(), interval, candles.len());
    println!(
        "{:<17} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Time", "Open", "High", "Low", "Close", "MA20", "BB Upper", "BB Lower"
    );
    for (i, candle) in candles.iter().enumerate() {
        println!(
            "{:<17} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12} {:>12} {:>12}",
            candle.open_time.format("%Y-%m-%d %H:%M"),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            format_band(bands.middle[i]),
            format_band(bands.upper[i]),
            format_band(bands.lower[i]),
        );
    }
    Ok(())
}

fn format_band(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{value:.2}")
    }
}

fn run_order(
    ctx: &AppContext,
    side: &str,
    symbol: &str,
    quantity: f64,
    limit: Option<f64>,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
) -> Result<()> {
    let side = match side.to_lowercase().as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        other => bail!("unknown side '{other}': expected buy or sell"),
    };

    let price_flags = limit.iter().chain(&stop_loss).chain(&take_profit).count();
    if price_flags > 1 {
        bail!("--limit, --stop-loss, and --take-profit are mutually exclusive");
    }

    let order_type = if let Some(limit_price) = limit {
        OrderType::Limit { limit_price }
    } else if let Some(trigger_price) = stop_loss {
        OrderType::StopLoss { trigger_price }
    } else if let Some(trigger_price) = take_profit {
        OrderType::TakeProfit { trigger_price }
    } else {
        OrderType::Market
    };

    let symbol = symbol.to_uppercase();

    // Market orders need the current price to fill against.
    let current_price = if order_type == OrderType::Market {
        let provider = BinanceProvider::new();
        Some(
            provider
                .latest_price(&symbol)
                .with_context(|| format!("failed to fetch current price for {symbol}"))?,
        )
    } else {
        None
    };

    let mut sim = load_simulator(ctx)?;
    let order = sim.create_order(&symbol, order_type, side, quantity, current_price)?;
    print_order_outcome(order);
    save_simulator(ctx, &sim)?;
    Ok(())
}

fn print_order_outcome(order: &Order) {
    match &order.status {
        OrderStatus::Executed => println!(
            "Order #{} executed: {} {} {} @ {:.2}",
            order.id,
            order.side,
            order.quantity,
            order.symbol,
            order.executed_price.unwrap_or(0.0)
        ),
        OrderStatus::Pending => {
            let trigger = order
                .limit_price()
                .or_else(|| order.trigger_price())
                .unwrap_or(0.0);
            println!(
                "Order #{} pending: {} {} {} {} @ {:.2}",
                order.id, order.order_type, order.side, order.quantity, order.symbol, trigger
            );
        }
        OrderStatus::Cancelled { reason } => {
            println!("Order #{} cancelled: {reason}", order.id);
        }
        OrderStatus::Expired => println!("Order #{} expired", order.id),
    }
}

fn run_cancel(ctx: &AppContext, order_id: u64) -> Result<()> {
    let mut sim = load_simulator(ctx)?;
    if sim.cancel_order(order_id.into()) {
        println!("Order #{order_id} cancelled.");
        save_simulator(ctx, &sim)?;
    } else {
        println!("Order #{order_id} not found or not pending.");
    }
    Ok(())
}

fn run_orders(ctx: &AppContext, all: bool) -> Result<()> {
    let sim = load_simulator(ctx)?;
    let orders: Vec<&Order> = if all {
        sim.orders().iter().collect()
    } else {
        sim.pending_orders()
    };

    if orders.is_empty() {
        println!("No {}orders.", if all { "" } else { "pending " });
        return Ok(());
    }

    println!(
        "{:<6} {:<10} {:<12} {:<5} {:>12} {:>12} {:<20}",
        "ID", "Symbol", "Type", "Side", "Quantity", "Price", "Status"
    );
    println!("{}", "-".repeat(82));
    for order in orders {
        let price = order
            .executed_price
            .or_else(|| order.limit_price())
            .or_else(|| order.trigger_price());
        println!(
            "{:<6} {:<10} {:<12} {:<5} {:>12} {:>12} {:<20}",
            order.id.to_string(),
            order.symbol,
            order.order_type.to_string(),
            order.side.to_string(),
            format!("{}", order.quantity),
            price.map_or("-".to_string(), |p| format!("{p:.2}")),
            format_status(&order.status),
        );
    }
    Ok(())
}

fn format_status(status: &OrderStatus) -> String {
    match status {
        OrderStatus::Pending => "PENDING".to_string(),
        OrderStatus::Executed => "EXECUTED".to_string(),
        OrderStatus::Cancelled { reason } => format!("CANCELLED ({reason})"),
        OrderStatus::Expired => "EXPIRED".to_string(),
    }
}

fn run_trades(ctx: &AppContext) -> Result<()> {
    let sim = load_simulator(ctx)?;
    if sim.trades().is_empty() {
        println!("No trades yet.");
        return Ok(());
    }

    println!(
        "{:<6} {:<10} {:>12} {:>12} {:>12} {:>12} {:>9} {:<17}",
        "ID", "Symbol", "Quantity", "Entry", "Exit", "P&L", "P&L %", "Executed"
    );
    println!("{}", "-".repeat(96));
    for trade in sim.trades() {
        println!(
            "{:<6} {:<10} {:>12} {:>12.2} {:>12.2} {:>12.2} {:>8.2}% {:<17}",
            trade.id.to_string(),
            trade.symbol,
            format!("{}", trade.quantity),
            trade.entry_price,
            trade.exit_price,
            trade.pnl,
            trade.pnl_pct,
            trade.executed_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

fn run_status(ctx: &AppContext) -> Result<()> {
    let sim = load_simulator(ctx)?;

    // Best-effort live prices for held symbols; positions without a quote
    // are valued at their average entry price.
    let symbols: Vec<String> = sim.positions().keys().cloned().collect();
    let provider = BinanceProvider::new();
    let prices = fetch_prices(&provider, &symbols);

    println!("=== PaperTrade Status ({}) ===", ctx.user);
    println!("Balance:         {:>14.2}", sim.balance());
    println!();

    if sim.positions().is_empty() {
        println!("No open positions.");
    } else {
        println!(
            "{:<10} {:>12} {:>12} {:>12} {:>14} {:>12}",
            "Symbol", "Quantity", "Avg Price", "Price", "Value", "Unreal P&L"
        );
        println!("{}", "-".repeat(76));
        let mut rows: Vec<_> = sim.positions().values().collect();
        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        for pos in rows {
            let price = prices.get(&pos.symbol).copied().unwrap_or(pos.avg_price);
            println!(
                "{:<10} {:>12} {:>12.2} {:>12.2} {:>14.2} {:>12.2}",
                pos.symbol,
                format!("{}", pos.quantity),
                pos.avg_price,
                price,
                pos.market_value(price),
                pos.unrealized_pnl(price),
            );
        }
    }
    println!();

    let portfolio = sim.portfolio_value(&prices);
    let (pnl_abs, pnl_pct) = sim.pnl(&prices);
    println!("Portfolio value: {:>14.2}", portfolio);
    println!("Total P&L:       {:>14.2} ({pnl_pct:+.2}%)", pnl_abs);
    println!();

    let stats = sim.statistics();
    println!("--- Trade Statistics ---");
    println!("Trades:          {}", stats.total_trades);
    println!(
        "Win/Loss:        {}/{} ({:.1}% win rate)",
        stats.winning_trades,
        stats.losing_trades,
        stats.win_rate
    );
    println!("Realized P&L:    {:>14.2}", stats.total_pnl);
    println!("Avg Win:         {:>14.2}", stats.avg_win);
    println!("Avg Loss:        {:>14.2}", stats.avg_loss);
    println!("Best Trade:      {:>14.2}", stats.best_trade);
    println!("Worst Trade:     {:>14.2}", stats.worst_trade);

    Ok(())
}

fn run_refresh(ctx: &AppContext, symbols: &[String]) -> Result<()> {
    let mut sim = load_simulator(ctx)?;

    // Default to every symbol with a position or a pending order.
    let symbols: Vec<String> = if symbols.is_empty() {
        let mut set: Vec<String> = sim.positions().keys().cloned().collect();
        for order in sim.pending_orders() {
            if !set.contains(&order.symbol) {
                set.push(order.symbol.clone());
            }
        }
        set.sort();
        set
    } else {
        symbols.to_vec()
    };

    if symbols.is_empty() {
        println!("Nothing to refresh: no positions or pending orders.");
        return Ok(());
    }

    let provider = BinanceProvider::new();
    let prices = fetch_prices(&provider, &symbols);

    let pending_before = sim.pending_orders().len();
    process_and_report(&mut sim, &prices);
    let pending_after = sim.pending_orders().len();

    println!(
        "Refreshed {} symbol(s); {} pending order(s) resolved, {} remain.",
        prices.len(),
        pending_before - pending_after,
        pending_after
    );
    save_simulator(ctx, &sim)?;
    Ok(())
}

fn run_export(ctx: &AppContext, out: &PathBuf) -> Result<()> {
    let sim = load_simulator(ctx)?;
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;

    writer.write_record([
        "trade_id",
        "symbol",
        "quantity",
        "entry_price",
        "exit_price",
        "pnl",
        "pnl_pct",
        "executed_at",
    ])?;
    for trade in sim.trades() {
        writer.write_record([
            trade.id.to_string(),
            trade.symbol.clone(),
            trade.quantity.to_string(),
            trade.entry_price.to_string(),
            trade.exit_price.to_string(),
            trade.pnl.to_string(),
            trade.pnl_pct.to_string(),
            trade.executed_at.to_rfc3339(),
        ])?;
    }
    writer.flush()?;

    println!("Exported {} trade(s) to {}", sim.trades().len(), out.display());
    Ok(())
}

fn run_reset(ctx: &AppContext, balance: Option<f64>, confirm: bool) -> Result<()> {
    let sim = load_simulator(ctx)?;
    let new_balance = balance.unwrap_or(DEFAULT_INITIAL_BALANCE);

    println!(
        "Reset would discard {} order(s), {} trade(s), {} position(s) for user '{}'.",
        sim.orders().len(),
        sim.trades().len(),
        sim.positions().len(),
        ctx.user
    );

    if !confirm {
        println!("Dry run — pass --confirm to actually reset.");
        return Ok(());
    }

    let fresh = Simulator::new(new_balance);
    save_simulator(ctx, &fresh)?;
    println!("Reset complete. New balance: {new_balance:.2}");
    Ok(())
}
