//! Simulator state machine — cash balance, positions, order book, trade history.
//!
//! The simulator is the aggregate root. It manages:
//! - Order creation and validation (invalid orders are rejected before they exist)
//! - Immediate execution of market orders against a supplied reference price
//! - Trigger evaluation for limit / stop-loss / take-profit orders
//! - Cash and position accounting (all-or-nothing per execution attempt)
//! - Append-only order and trade history
//!
//! The simulator does NOT fetch prices or persist itself — the host pulls
//! quotes and snapshots around calls into the engine. There is no I/O and no
//! suspension point inside any operation; embed behind a mutex per user if
//! the host is concurrent.

use crate::domain::{Order, OrderId, OrderStatus, OrderType, Position, Side, Trade, TradeId};
use crate::engine::stats::TradeStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Starting cash when none is specified (USDT).
pub const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;

/// Errors from order creation. These reject the request before any order
/// object enters the history.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("quantity must be positive (got {0})")]
    InvalidQuantity(f64),

    #[error("price must be positive (got {0})")]
    InvalidPrice(f64),

    #[error("market orders require a current price")]
    MissingCurrentPrice,
}

/// Why an execution attempt failed. Rendered into the order's cancellation
/// reason; never escapes as a Rust error.
#[derive(Debug, Error)]
enum ExecutionFailure {
    #[error("insufficient balance: needed ${needed:.2}, available ${available:.2}")]
    InsufficientBalance { needed: f64, available: f64 },

    #[error("no open position for {symbol}")]
    NoPosition { symbol: String },

    #[error("insufficient position quantity: available {available}, requested {requested}")]
    InsufficientQuantity { available: f64, requested: f64 },
}

/// Full-state snapshot for the persistence boundary.
///
/// Whole-document replace-or-insert keyed by user id; partial updates are
/// not supported. Id counters are re-derived from the max ids on restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorSnapshot {
    pub initial_balance: f64,
    pub balance: f64,
    pub positions: HashMap<String, Position>,
    pub orders: Vec<Order>,
    pub trades: Vec<Trade>,
    pub updated_at: DateTime<Utc>,
}

/// Paper-trading simulator: one cash balance, one position per symbol,
/// append-only order and trade history.
#[derive(Debug, Clone)]
pub struct Simulator {
    initial_balance: f64,
    balance: f64,
    positions: HashMap<String, Position>,
    orders: Vec<Order>,
    trades: Vec<Trade>,
    next_order_id: u64,
    next_trade_id: u64,
    updated_at: DateTime<Utc>,
}

impl Simulator {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            positions: HashMap::new(),
            orders: Vec::new(),
            trades: Vec::new(),
            next_order_id: 1,
            next_trade_id: 1,
            updated_at: Utc::now(),
        }
    }

    // ── Public API ─────────────────────────────────────────────────────

    /// Create a new order.
    ///
    /// Market orders execute immediately against `current_price` (required
    /// for them, ignored for the rest). An execution failure does not remove
    /// the order: it stays in history as Cancelled with the failure reason.
    /// All other order types stay Pending until a call to
    /// [`process_pending_orders`](Self::process_pending_orders) triggers them.
    pub fn create_order(
        &mut self,
        symbol: impl Into<String>,
        order_type: OrderType,
        side: Side,
        quantity: f64,
        current_price: Option<f64>,
    ) -> Result<&Order, SimulatorError> {
        if !(quantity > 0.0) {
            return Err(SimulatorError::InvalidQuantity(quantity));
        }
        match order_type {
            OrderType::Limit { limit_price } if !(limit_price > 0.0) => {
                return Err(SimulatorError::InvalidPrice(limit_price));
            }
            OrderType::StopLoss { trigger_price } | OrderType::TakeProfit { trigger_price }
                if !(trigger_price > 0.0) =>
            {
                return Err(SimulatorError::InvalidPrice(trigger_price));
            }
            _ => {}
        }

        let execution_price = match order_type {
            OrderType::Market => match current_price {
                Some(price) if price > 0.0 => Some(price),
                Some(price) => return Err(SimulatorError::InvalidPrice(price)),
                None => return Err(SimulatorError::MissingCurrentPrice),
            },
            _ => None,
        };

        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;

        let order = Order {
            id,
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            executed_at: None,
            executed_price: None,
        };
        self.orders.push(order);
        let index = self.orders.len() - 1;

        // Market orders never stay Pending: execute or cancel right here.
        if let Some(price) = execution_price {
            if let Err(failure) = self.execute(index, price) {
                self.cancel_at(index, failure.to_string());
            }
        }

        self.updated_at = Utc::now();
        Ok(&self.orders[index])
    }

    /// Evaluate every pending order against the supplied prices, executing
    /// those whose trigger condition is met. Returns the ids of orders that
    /// executed.
    ///
    /// Orders whose symbol has no current price are skipped and stay
    /// Pending. A triggered order that fails execution is cancelled with the
    /// failure reason — it is never left Pending after its trigger fired.
    /// Re-running with unchanged prices is a no-op for already-resolved
    /// orders.
    pub fn process_pending_orders(&mut self, current_prices: &HashMap<String, f64>) -> Vec<OrderId> {
        let mut executed = Vec::new();

        for index in 0..self.orders.len() {
            let order = &self.orders[index];
            if !order.is_pending() {
                continue;
            }
            let Some(&price) = current_prices.get(&order.symbol) else {
                continue;
            };

            let should_execute = match order.order_type {
                OrderType::Market => false, // market orders never reach Pending
                OrderType::Limit { limit_price } => match order.side {
                    Side::Buy => price <= limit_price,
                    Side::Sell => price >= limit_price,
                },
                OrderType::StopLoss { trigger_price } => price <= trigger_price,
                OrderType::TakeProfit { trigger_price } => price >= trigger_price,
            };

            if !should_execute {
                continue;
            }

            match self.execute(index, price) {
                Ok(()) => executed.push(self.orders[index].id),
                Err(failure) => self.cancel_at(index, failure.to_string()),
            }
        }

        if !executed.is_empty() {
            self.updated_at = Utc::now();
        }
        executed
    }

    /// Cancel a pending order. Returns false (without mutating anything) if
    /// the id is unknown or the order is no longer Pending.
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        let Some(index) = self.orders.iter().position(|o| o.id == id) else {
            return false;
        };
        if !self.orders[index].is_pending() {
            return false;
        }
        self.cancel_at(index, "cancelled by user".to_string());
        self.updated_at = Utc::now();
        true
    }

    /// Total portfolio value: cash plus every position marked to market.
    ///
    /// Positions without a current price are valued at their average entry
    /// price — treated as unchanged, not excluded.
    pub fn portfolio_value(&self, current_prices: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .map(|(symbol, pos)| {
                let price = current_prices.get(symbol).copied().unwrap_or(pos.avg_price);
                pos.market_value(price)
            })
            .sum();
        self.balance + position_value
    }

    /// (absolute, percentage) P&L against the initial balance.
    /// The percentage is 0.0 when the initial balance is zero.
    pub fn pnl(&self, current_prices: &HashMap<String, f64>) -> (f64, f64) {
        let absolute = self.portfolio_value(current_prices) - self.initial_balance;
        let percentage = if self.initial_balance == 0.0 {
            0.0
        } else {
            absolute / self.initial_balance * 100.0
        };
        (absolute, percentage)
    }

    /// Statistics over the trade history.
    pub fn statistics(&self) -> TradeStatistics {
        TradeStatistics::from_trades(&self.trades)
    }

    /// Discard all state and start over with the same initial balance.
    pub fn reset(&mut self) {
        *self = Simulator::new(self.initial_balance);
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn pending_orders(&self) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.is_pending()).collect()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ── Persistence boundary ───────────────────────────────────────────

    pub fn snapshot(&self) -> SimulatorSnapshot {
        SimulatorSnapshot {
            initial_balance: self.initial_balance,
            balance: self.balance,
            positions: self.positions.clone(),
            orders: self.orders.clone(),
            trades: self.trades.clone(),
            updated_at: self.updated_at,
        }
    }

    pub fn from_snapshot(snapshot: SimulatorSnapshot) -> Self {
        let next_order_id = snapshot.orders.iter().map(|o| o.id.0).max().unwrap_or(0) + 1;
        let next_trade_id = snapshot.trades.iter().map(|t| t.id.0).max().unwrap_or(0) + 1;
        Self {
            initial_balance: snapshot.initial_balance,
            balance: snapshot.balance,
            positions: snapshot.positions,
            orders: snapshot.orders,
            trades: snapshot.trades,
            next_order_id,
            next_trade_id,
            updated_at: snapshot.updated_at,
        }
    }

    // ── Internal helpers ───────────────────────────────────────────────

    /// Execute the order at `index` at `price`.
    ///
    /// All-or-nothing: every precondition is checked before the first field
    /// is written, so a failure leaves balance, positions, and history
    /// untouched.
    fn execute(&mut self, index: usize, price: f64) -> Result<(), ExecutionFailure> {
        let (symbol, side, quantity) = {
            let order = &self.orders[index];
            (order.symbol.clone(), order.side, order.quantity)
        };

        match side {
            Side::Buy => {
                let cost = quantity * price;
                if cost > self.balance {
                    return Err(ExecutionFailure::InsufficientBalance {
                        needed: cost,
                        available: self.balance,
                    });
                }

                self.balance -= cost;
                let position = self
                    .positions
                    .entry(symbol.clone())
                    .or_insert_with(|| Position {
                        symbol,
                        quantity: 0.0,
                        avg_price: 0.0,
                        invested: 0.0,
                    });
                position.invested += cost;
                position.quantity += quantity;
                position.avg_price = position.invested / position.quantity;
            }
            Side::Sell => {
                let position = self
                    .positions
                    .get_mut(&symbol)
                    .ok_or_else(|| ExecutionFailure::NoPosition {
                        symbol: symbol.clone(),
                    })?;
                if quantity > position.quantity {
                    return Err(ExecutionFailure::InsufficientQuantity {
                        available: position.quantity,
                        requested: quantity,
                    });
                }

                let proceeds = quantity * price;
                let entry_price = position.avg_price;
                let cost_basis = quantity * entry_price;
                let pnl = proceeds - cost_basis;

                self.balance += proceeds;
                position.quantity -= quantity;
                position.invested -= cost_basis;
                if position.quantity == 0.0 {
                    self.positions.remove(&symbol);
                }

                let pnl_pct = if cost_basis == 0.0 {
                    0.0
                } else {
                    pnl / cost_basis * 100.0
                };
                let trade = Trade {
                    id: TradeId(self.next_trade_id),
                    symbol,
                    quantity,
                    entry_price,
                    exit_price: price,
                    pnl,
                    pnl_pct,
                    executed_at: Utc::now(),
                };
                self.next_trade_id += 1;
                self.trades.push(trade);
            }
        }

        let now = Utc::now();
        let order = &mut self.orders[index];
        order.status = OrderStatus::Executed;
        order.executed_at = Some(now);
        order.executed_price = Some(price);
        Ok(())
    }

    fn cancel_at(&mut self, index: usize, reason: String) {
        self.orders[index].status = OrderStatus::Cancelled { reason };
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_BALANCE)
    }
}
