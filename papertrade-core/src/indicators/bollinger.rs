//! Bollinger Bands: an SMA middle band flanked by bands a multiple of the
//! rolling standard deviation above and below it.
//!
//! All three series come out of a single pass over the closes
//! ([`BollingerBands::compute`]); the per-band [`Bollinger`] indicator is a
//! thin view over that. Standard deviation is the population form (divide
//! by the window length), which is what charting tools draw. Outputs are
//! NaN until a full window is available, and a NaN close poisons every
//! window it falls in.

use super::Indicator;
use crate::data::Candle;

/// Chart defaults: 20 candles at 2 standard deviations.
pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// All three band series over one candle slice.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerBands {
    pub fn compute(candles: &[Candle], period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");

        let n = candles.len();
        let mut bands = Self {
            upper: vec![f64::NAN; n],
            middle: vec![f64::NAN; n],
            lower: vec![f64::NAN; n],
        };
        if n < period {
            return bands;
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        for end in period..=n {
            let window = &closes[end - period..end];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }

            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for &close in window {
                sum += close;
                sum_sq += close * close;
            }
            let mean = sum / period as f64;
            // Rounding can push E[x²] − mean² a hair below zero.
            let variance = (sum_sq / period as f64 - mean * mean).max(0.0);
            let offset = multiplier * variance.sqrt();

            let i = end - 1;
            bands.middle[i] = mean;
            bands.upper[i] = mean + offset;
            bands.lower[i] = mean - offset;
        }

        bands
    }
}

/// Which band a [`Bollinger`] indicator instance yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

/// Single-band Bollinger indicator for use behind the [`Indicator`] trait.
#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::band(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::band(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::band(period, multiplier, BollingerBand::Lower)
    }

    fn band(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let suffix = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{suffix}_{period}_{multiplier}"),
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let bands = BollingerBands::compute(candles, self.period, self.multiplier);
        match self.band {
            BollingerBand::Upper => bands.upper,
            BollingerBand::Middle => bands.middle,
            BollingerBand::Lower => bands.lower,
        }
    }
}
