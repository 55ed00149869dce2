//! PaperTrade Core — paper-trading engine, domain types, market data, persistence.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (orders, positions, trades)
//! - The simulator state machine: cash ledger, order lifecycle, conditional triggers
//! - Trade statistics derived from execution history
//! - Binance market-data provider (klines / latest price)
//! - Moving-average and Bollinger Band indicators
//! - JSON document store keyed by user id

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all core types are Send + Sync.
    ///
    /// The simulator is single-threaded by contract, but hosts embed it behind
    /// a mutex per user; nothing in the core may break that.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<engine::Simulator>();
        require_sync::<engine::Simulator>();
        require_send::<engine::TradeStatistics>();
        require_sync::<engine::TradeStatistics>();
        require_send::<data::Candle>();
        require_sync::<data::Candle>();
    }
}
