//! Binance public-API data provider.
//!
//! Fetches OHLCV candles from the v3 klines endpoint. Handles rate limiting
//! and retries with exponential backoff. No API key is needed for klines.
//!
//! Kline rows are heterogeneous JSON arrays: open time in epoch millis at
//! index 0, then OHLCV as decimal strings at indices 1-5. Everything past
//! index 5 (close time, quote volume, trade count, ...) is ignored.

use super::provider::{Candle, DataError, MarketDataProvider};
use serde_json::Value;
use std::time::Duration;

const BASE_URL: &str = "https://api.binance.com/api/v3";

/// Intervals accepted by the klines endpoint that this client exposes.
const SUPPORTED_INTERVALS: &[&str] = &["1m", "5m", "15m", "1h", "4h", "1d"];

/// Hard cap imposed by the Binance API.
const MAX_LIMIT: usize = 1000;

/// Binance klines provider.
pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different base URL (test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Parse one kline row into a Candle.
    fn parse_kline(row: &Value) -> Result<Candle, DataError> {
        let fields = row
            .as_array()
            .ok_or_else(|| DataError::ResponseFormatChanged("kline row is not an array".into()))?;
        if fields.len() < 6 {
            return Err(DataError::ResponseFormatChanged(format!(
                "kline row has {} fields, expected at least 6",
                fields.len()
            )));
        }

        let open_time_ms = fields[0]
            .as_i64()
            .ok_or_else(|| DataError::ResponseFormatChanged("open time is not an integer".into()))?;
        let open_time = chrono::DateTime::from_timestamp_millis(open_time_ms).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("invalid open time: {open_time_ms}"))
        })?;

        let number = |index: usize, name: &str| -> Result<f64, DataError> {
            fields[index]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("{name} is not a decimal string"))
                })
        };

        Ok(Candle {
            open_time,
            open: number(1, "open")?,
            high: number(2, "high")?,
            low: number(3, "low")?,
            close: number(4, "close")?,
            volume: number(5, "volume")?,
        })
    }

    /// Execute the klines request with retry and backoff.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.to_uppercase(),
            interval,
            limit.min(MAX_LIMIT)
        );
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    // Binance answers 400 for unknown symbols
                    if status == reqwest::StatusCode::BAD_REQUEST
                        || status == reqwest::StatusCode::NOT_FOUND
                    {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let rows: Vec<Value> = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    return rows.iter().map(Self::parse_kline).collect();
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        if !SUPPORTED_INTERVALS.contains(&interval) {
            return Err(DataError::InvalidInterval {
                interval: interval.to_string(),
            });
        }
        self.fetch_with_retry(symbol, interval, limit)
    }
}
