//! Market data and persistence: quote provider trait, the Binance klines
//! client, and the per-user JSON document store.

pub mod binance;
pub mod provider;
pub mod store;

pub use binance::BinanceProvider;
pub use provider::{Candle, DataError, MarketDataProvider};
pub use store::{DocumentStore, StoreError, StoreMeta};
