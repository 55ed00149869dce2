//! Trade — an immutable realized-P&L record created on every sell fill.

use super::ids::TradeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A realized trade: some quantity sold out of a position.
///
/// Append-only history; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub symbol: String,
    /// Quantity sold.
    pub quantity: f64,
    /// Position's average price at fill time (basis for the sold lot).
    pub entry_price: f64,
    /// Execution price of the sell.
    pub exit_price: f64,
    /// quantity × (exit − entry).
    pub pnl: f64,
    /// pnl relative to the cost basis of the sold quantity, in percent.
    pub pnl_pct: f64,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }
}
