//! Technical indicators over candle series.
//!
//! Indicators are pure: a slice of candles in, one value per candle out,
//! `f64::NAN` during the warmup window. They are presentation-side helpers —
//! the simulator itself never consumes them.

pub mod bollinger;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand, BollingerBands};
pub use sma::Sma;

use crate::data::Candle;

/// A single-series indicator computed over candles.
pub trait Indicator {
    /// Stable name, unique per parameterization.
    fn name(&self) -> &str;

    /// Number of leading candles that produce NaN (warmup).
    fn lookback(&self) -> usize;

    /// One output value per input candle.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Create synthetic candles from close prices for testing.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let base = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: base + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual}"
    );
}
