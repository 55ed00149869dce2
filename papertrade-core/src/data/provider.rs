//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over quote sources so the CLI can
//! swap implementations and tests can supply canned candles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV candle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Structured error types for market-data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by exchange (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("unsupported interval: {interval}")]
    InvalidInterval { interval: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for market-data providers.
///
/// Implementations handle the specifics of one exchange API. Quotes are
/// pull-based; the core makes no freshness guarantee.
pub trait MarketDataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch up to `limit` recent OHLCV candles for a symbol.
    fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize)
        -> Result<Vec<Candle>, DataError>;

    /// Latest known price for a symbol: the close of the most recent candle.
    fn latest_price(&self, symbol: &str) -> Result<f64, DataError> {
        let candles = self.fetch_candles(symbol, "1m", 1)?;
        candles
            .last()
            .map(|c| c.close)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}
