//! End-to-end simulator tests: full trading sessions driven through the
//! public API, persistence round trips through the document store, and
//! statistics over realized trades.

use papertrade_core::data::DocumentStore;
use papertrade_core::domain::{OrderStatus, OrderType, Side};
use papertrade_core::engine::{Simulator, TradeStatistics};
use std::collections::HashMap;
use tempfile::TempDir;

fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
}

// ── Full trading session ─────────────────────────────────────────────

#[test]
fn buy_hold_sell_session() {
    let mut sim = Simulator::new(10_000.0);

    // Buy 0.1 BTC at 40k
    sim.create_order("BTCUSDT", OrderType::Market, Side::Buy, 0.1, Some(40_000.0))
        .unwrap();
    assert_eq!(sim.balance(), 6_000.0);
    assert_eq!(sim.positions()["BTCUSDT"].avg_price, 40_000.0);

    // Mark to market at 45k: unrealized gain shows in the portfolio value
    let quotes = prices(&[("BTCUSDT", 45_000.0)]);
    assert_eq!(sim.portfolio_value(&quotes), 10_500.0);
    let (pnl_abs, pnl_pct) = sim.pnl(&quotes);
    assert_eq!(pnl_abs, 500.0);
    assert!((pnl_pct - 5.0).abs() < 1e-10);

    // Sell the whole position at 45k: gain realized
    sim.create_order("BTCUSDT", OrderType::Market, Side::Sell, 0.1, Some(45_000.0))
        .unwrap();
    assert_eq!(sim.balance(), 10_500.0);
    assert!(sim.positions().is_empty());

    let trade = &sim.trades()[0];
    assert_eq!(trade.pnl, 500.0);
    assert!((trade.pnl_pct - 12.5).abs() < 1e-10);
}

#[test]
fn bracket_style_session_with_stop_and_target() {
    let mut sim = Simulator::new(10_000.0);
    sim.create_order("ETHUSDT", OrderType::Market, Side::Buy, 2.0, Some(2_000.0))
        .unwrap();

    // Protective stop below, profit target above
    let stop_id = sim
        .create_order(
            "ETHUSDT",
            OrderType::StopLoss {
                trigger_price: 1_800.0,
            },
            Side::Sell,
            2.0,
            None,
        )
        .unwrap()
        .id;
    let target_id = sim
        .create_order(
            "ETHUSDT",
            OrderType::TakeProfit {
                trigger_price: 2_400.0,
            },
            Side::Sell,
            2.0,
            None,
        )
        .unwrap()
        .id;

    // Price drifts up but hits neither level
    assert!(sim
        .process_pending_orders(&prices(&[("ETHUSDT", 2_200.0)]))
        .is_empty());

    // Target hit: the take-profit fills at the current price
    let executed = sim.process_pending_orders(&prices(&[("ETHUSDT", 2_500.0)]));
    assert_eq!(executed, vec![target_id]);
    assert_eq!(sim.trades()[0].pnl, 1_000.0);

    // The stop is now orphaned; with the position gone it cancels when
    // the price later drops through its trigger.
    let executed = sim.process_pending_orders(&prices(&[("ETHUSDT", 1_700.0)]));
    assert!(executed.is_empty());
    let stop = sim.get_order(stop_id).unwrap();
    assert!(stop.cancel_reason().unwrap().contains("no open position"));
}

#[test]
fn multi_symbol_portfolio() {
    let mut sim = Simulator::new(20_000.0);
    sim.create_order("BTCUSDT", OrderType::Market, Side::Buy, 0.2, Some(40_000.0))
        .unwrap();
    sim.create_order("ETHUSDT", OrderType::Market, Side::Buy, 3.0, Some(2_000.0))
        .unwrap();

    assert_eq!(sim.balance(), 6_000.0);
    assert_eq!(sim.positions().len(), 2);

    // One symbol quoted, the other valued at entry
    let quotes = prices(&[("BTCUSDT", 50_000.0)]);
    // 6000 cash + 0.2 * 50000 + 3 * 2000
    assert_eq!(sim.portfolio_value(&quotes), 22_000.0);
}

// ── Order lifecycle through the public API ───────────────────────────

#[test]
fn limit_buy_lifecycle() {
    let mut sim = Simulator::new(10_000.0);
    let id = sim
        .create_order(
            "ETHUSDT",
            OrderType::Limit {
                limit_price: 2_000.0,
            },
            Side::Buy,
            1.0,
            None,
        )
        .unwrap()
        .id;
    assert!(sim.get_order(id).unwrap().is_pending());

    // Price above the limit: no fill
    assert!(sim
        .process_pending_orders(&prices(&[("ETHUSDT", 2_500.0)]))
        .is_empty());
    assert!(sim.get_order(id).unwrap().is_pending());

    // Price crosses below: fills at the market price, not the limit
    let executed = sim.process_pending_orders(&prices(&[("ETHUSDT", 1_900.0)]));
    assert_eq!(executed, vec![id]);
    assert_eq!(sim.get_order(id).unwrap().executed_price, Some(1_900.0));
    assert_eq!(sim.positions()["ETHUSDT"].avg_price, 1_900.0);
}

#[test]
fn cancel_is_rejected_after_execution() {
    let mut sim = Simulator::new(10_000.0);
    let id = sim
        .create_order("BTCUSDT", OrderType::Market, Side::Buy, 0.1, Some(40_000.0))
        .unwrap()
        .id;

    assert!(!sim.cancel_order(id));
    assert_eq!(sim.get_order(id).unwrap().status, OrderStatus::Executed);
    // Balance reflects the executed buy, not a rollback
    assert_eq!(sim.balance(), 6_000.0);
}

// ── Persistence round trip ───────────────────────────────────────────

#[test]
fn session_survives_store_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());

    let mut sim = Simulator::new(10_000.0);
    sim.create_order("BTCUSDT", OrderType::Market, Side::Buy, 0.1, Some(40_000.0))
        .unwrap();
    let pending_id = sim
        .create_order(
            "BTCUSDT",
            OrderType::TakeProfit {
                trigger_price: 50_000.0,
            },
            Side::Sell,
            0.1,
            None,
        )
        .unwrap()
        .id;

    store.save("trader", &sim.snapshot()).unwrap();

    // New process: load, continue the session
    let snapshot = store.load("trader").unwrap().unwrap();
    let mut restored = Simulator::from_snapshot(snapshot);
    assert_eq!(restored.balance(), 6_000.0);
    assert_eq!(restored.pending_orders().len(), 1);

    // The restored pending order still triggers
    let executed = restored.process_pending_orders(&prices(&[("BTCUSDT", 51_000.0)]));
    assert_eq!(executed, vec![pending_id]);
    assert_eq!(restored.balance(), 11_100.0);

    // Saving again replaces the old document
    store.save("trader", &restored.snapshot()).unwrap();
    let reloaded = store.load("trader").unwrap().unwrap();
    assert_eq!(reloaded.trades.len(), 1);
}

#[test]
fn order_ids_stay_unique_across_restores() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());

    let mut sim = Simulator::new(10_000.0);
    for _ in 0..3 {
        sim.create_order("BTCUSDT", OrderType::Market, Side::Buy, 0.01, Some(40_000.0))
            .unwrap();
    }
    store.save("trader", &sim.snapshot()).unwrap();

    let mut restored = Simulator::from_snapshot(store.load("trader").unwrap().unwrap());
    let new_id = restored
        .create_order("BTCUSDT", OrderType::Market, Side::Buy, 0.01, Some(40_000.0))
        .unwrap()
        .id;

    let mut seen: Vec<u64> = restored.orders().iter().map(|o| o.id.0).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), restored.orders().len());
    assert_eq!(new_id.0, 4);
}

// ── Statistics ───────────────────────────────────────────────────────

#[test]
fn statistics_over_a_mixed_session() {
    let mut sim = Simulator::new(100_000.0);

    // Winner: +500
    sim.create_order("BTCUSDT", OrderType::Market, Side::Buy, 0.1, Some(40_000.0))
        .unwrap();
    sim.create_order("BTCUSDT", OrderType::Market, Side::Sell, 0.1, Some(45_000.0))
        .unwrap();

    // Loser: -300
    sim.create_order("ETHUSDT", OrderType::Market, Side::Buy, 1.0, Some(2_000.0))
        .unwrap();
    sim.create_order("ETHUSDT", OrderType::Market, Side::Sell, 1.0, Some(1_700.0))
        .unwrap();

    // Winner: +100
    sim.create_order("SOLUSDT", OrderType::Market, Side::Buy, 10.0, Some(100.0))
        .unwrap();
    sim.create_order("SOLUSDT", OrderType::Market, Side::Sell, 10.0, Some(110.0))
        .unwrap();

    let stats = sim.statistics();
    assert_eq!(stats.total_trades, 3);
    assert_eq!(stats.winning_trades, 2);
    assert_eq!(stats.losing_trades, 1);
    assert!((stats.win_rate - 200.0 / 3.0).abs() < 1e-10);
    assert_eq!(stats.total_pnl, 300.0);
    assert_eq!(stats.avg_win, 300.0);
    assert_eq!(stats.avg_loss, -300.0);
    assert_eq!(stats.best_trade, 500.0);
    assert_eq!(stats.worst_trade, -300.0);
}

#[test]
fn statistics_empty_when_no_trades() {
    let sim = Simulator::new(10_000.0);
    assert_eq!(sim.statistics(), TradeStatistics::default());
}
