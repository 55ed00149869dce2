//! Simple moving average of close prices.
//!
//! Lookback: period - 1.

use super::Indicator;
use crate::data::Candle;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let start = i + 1 - self.period;
            let window = &candles[start..=i];

            let mut has_nan = false;
            let mut sum = 0.0;
            for candle in window {
                if candle.close.is_nan() {
                    has_nan = true;
                    break;
                }
                sum += candle.close;
            }

            result[i] = if has_nan {
                f64::NAN
            } else {
                sum / self.period as f64
            };
        }

        result
    }
}
