//! Domain types for PaperTrade

pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use ids::{OrderId, TradeId};
pub use order::{Order, OrderStatus, OrderType, Side};
pub use position::Position;
pub use trade::Trade;
