//! Trade statistics — pure functions over the trade history.
//!
//! No side effects and no dependency on the simulator: trade list in,
//! aggregate numbers out. An empty history yields an all-zero result.

use crate::domain::Trade;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over a trade history.
///
/// Winning means pnl strictly greater than zero, losing strictly less;
/// break-even trades count toward the total only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// winning / total × 100.
    pub win_rate: f64,
    pub total_pnl: f64,
    /// Mean pnl over winning trades (0.0 if none).
    pub avg_win: f64,
    /// Mean pnl over losing trades (0.0 if none).
    pub avg_loss: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
}

impl TradeStatistics {
    pub fn from_trades(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let winners: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).collect();
        let losers: Vec<f64> = trades.iter().filter(|t| t.is_loser()).map(|t| t.pnl).collect();

        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let best_trade = trades.iter().map(|t| t.pnl).fold(f64::NEG_INFINITY, f64::max);
        let worst_trade = trades.iter().map(|t| t.pnl).fold(f64::INFINITY, f64::min);

        Self {
            total_trades: trades.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate: winners.len() as f64 / trades.len() as f64 * 100.0,
            total_pnl,
            avg_win: mean(&winners),
            avg_loss: mean(&losers),
            best_trade,
            worst_trade,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeId;
    use chrono::Utc;

    fn trade(id: u64, pnl: f64) -> Trade {
        Trade {
            id: TradeId(id),
            symbol: "BTCUSDT".into(),
            quantity: 0.1,
            entry_price: 40_000.0,
            exit_price: 40_000.0 + pnl / 0.1,
            pnl,
            pnl_pct: pnl / 4_000.0 * 100.0,
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_is_all_zero() {
        let stats = TradeStatistics::from_trades(&[]);
        assert_eq!(stats, TradeStatistics::default());
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.best_trade, 0.0);
        assert_eq!(stats.worst_trade, 0.0);
    }

    #[test]
    fn mixed_history() {
        let trades = vec![
            trade(1, 500.0),
            trade(2, -200.0),
            trade(3, 300.0),
            trade(4, -100.0),
        ];
        let stats = TradeStatistics::from_trades(&trades);

        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 2);
        assert!((stats.win_rate - 50.0).abs() < 1e-10);
        assert!((stats.total_pnl - 500.0).abs() < 1e-10);
        assert!((stats.avg_win - 400.0).abs() < 1e-10);
        assert!((stats.avg_loss - (-150.0)).abs() < 1e-10);
        assert_eq!(stats.best_trade, 500.0);
        assert_eq!(stats.worst_trade, -200.0);
    }

    #[test]
    fn break_even_trades_count_toward_total_only() {
        let trades = vec![trade(1, 0.0), trade(2, 100.0)];
        let stats = TradeStatistics::from_trades(&trades);

        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 0);
        assert!((stats.win_rate - 50.0).abs() < 1e-10);
        assert_eq!(stats.avg_loss, 0.0);
        assert_eq!(stats.worst_trade, 0.0);
    }

    #[test]
    fn all_losers() {
        let trades = vec![trade(1, -50.0), trade(2, -150.0)];
        let stats = TradeStatistics::from_trades(&trades);

        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.avg_win, 0.0);
        assert!((stats.avg_loss - (-100.0)).abs() < 1e-10);
        assert_eq!(stats.best_trade, -50.0);
        assert_eq!(stats.worst_trade, -150.0);
    }
}
