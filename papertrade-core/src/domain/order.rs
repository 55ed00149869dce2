//! Order types and the order lifecycle state machine.

use super::ids::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order direction (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// What kind of order and its price parameters.
///
/// Price parameters live inside the variants: a limit order always has a
/// limit price, a stop-loss/take-profit always has a trigger price, and a
/// market order carries none. Invalid combinations cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Fill immediately at the current market price.
    Market,
    /// Buy at limit price or below; sell at limit price or above.
    Limit { limit_price: f64 },
    /// Triggers when price falls to the trigger level, then fills at market.
    StopLoss { trigger_price: f64 },
    /// Triggers when price rises to the trigger level, then fills at market.
    TakeProfit { trigger_price: f64 },
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit { .. } => write!(f, "LIMIT"),
            OrderType::StopLoss { .. } => write!(f, "STOP_LOSS"),
            OrderType::TakeProfit { .. } => write!(f, "TAKE_PROFIT"),
        }
    }
}

/// Order lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for a trigger condition (or, transiently, for immediate fill).
    Pending,
    /// Filled at `executed_price`.
    Executed,
    /// Cancelled with a reason (insufficient balance, user cancel, etc).
    Cancelled { reason: String },
    /// Expired without executing.
    Expired,
}

impl OrderStatus {
    /// Whether this is a terminal state.
    pub fn is_final(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

/// A single order in the simulator's history.
///
/// Owned exclusively by the simulator. Immutable once the status leaves
/// Pending, except for the terminal fields set during that transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Set when the order executes.
    pub executed_at: Option<DateTime<Utc>>,
    /// Price the order actually filled at.
    pub executed_price: Option<f64>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_executed(&self) -> bool {
        self.status == OrderStatus::Executed
    }

    /// Limit price, if this is a limit order.
    pub fn limit_price(&self) -> Option<f64> {
        match self.order_type {
            OrderType::Limit { limit_price } => Some(limit_price),
            _ => None,
        }
    }

    /// Trigger price, if this is a stop-loss or take-profit order.
    pub fn trigger_price(&self) -> Option<f64> {
        match self.order_type {
            OrderType::StopLoss { trigger_price } | OrderType::TakeProfit { trigger_price } => {
                Some(trigger_price)
            }
            _ => None,
        }
    }

    /// Cancellation reason, if cancelled.
    pub fn cancel_reason(&self) -> Option<&str> {
        match &self.status {
            OrderStatus::Cancelled { reason } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order(order_type: OrderType) -> Order {
        Order {
            id: OrderId(1),
            symbol: "BTCUSDT".into(),
            side: Side::Buy,
            order_type,
            quantity: 0.5,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            executed_at: None,
            executed_price: None,
        }
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn price_accessors_match_order_type() {
        let limit = sample_order(OrderType::Limit { limit_price: 40000.0 });
        assert_eq!(limit.limit_price(), Some(40000.0));
        assert_eq!(limit.trigger_price(), None);

        let stop = sample_order(OrderType::StopLoss { trigger_price: 35000.0 });
        assert_eq!(stop.trigger_price(), Some(35000.0));
        assert_eq!(stop.limit_price(), None);

        let market = sample_order(OrderType::Market);
        assert_eq!(market.limit_price(), None);
        assert_eq!(market.trigger_price(), None);
    }

    #[test]
    fn status_finality() {
        assert!(!OrderStatus::Pending.is_final());
        assert!(OrderStatus::Executed.is_final());
        assert!(OrderStatus::Cancelled { reason: "x".into() }.is_final());
        assert!(OrderStatus::Expired.is_final());
    }

    #[test]
    fn order_serialization_roundtrip() {
        let order = sample_order(OrderType::TakeProfit { trigger_price: 50000.0 });
        let json = serde_json::to_string(&order).unwrap();
        let deser: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order.id, deser.id);
        assert_eq!(order.symbol, deser.symbol);
        assert_eq!(order.order_type, deser.order_type);
        assert_eq!(order.status, deser.status);
    }
}
