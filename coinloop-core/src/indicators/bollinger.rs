//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::closes;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

/// All three bands, aligned with the input samples.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    fn build(period: usize, multiplier: f64, band: BollingerBand, label: &str) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Upper, "upper")
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Middle, "middle")
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Lower, "lower")
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        let bands = bollinger(samples, self.period, self.multiplier);
        match self.band {
            BollingerBand::Upper => bands.upper,
            BollingerBand::Middle => bands.middle,
            BollingerBand::Lower => bands.lower,
        }
    }
}

/// Rolling mean and population stddev of a series, computed per window.
///
/// Returns `(mean, stddev)` series; both NaN where the window is short or
/// contains a NaN.
pub fn rolling_mean_std(values: &[f64], period: usize) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let mut mean = vec![f64::NAN; n];
    let mut std = vec![f64::NAN; n];
    if period == 0 || n < period {
        return (mean, std);
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let m = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / period as f64;
        mean[i] = m;
        std[i] = variance.sqrt();
    }

    (mean, std)
}

/// Rolling population stddev of an arbitrary series.
pub fn rolling_std_of_series(values: &[f64], period: usize) -> Vec<f64> {
    rolling_mean_std(values, period).1
}

/// Compute upper, middle and lower bands over close.
pub fn bollinger(samples: &[Sample], period: usize, multiplier: f64) -> BollingerBands {
    let (middle, std) = rolling_mean_std(&closes(samples), period);
    let upper = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| m + multiplier * s)
        .collect();
    let lower = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| m - multiplier * s)
        .collect();
    BollingerBands {
        upper,
        middle,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_samples, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_sma() {
        let samples = make_samples(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3, 2.0).compute(&samples);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_uses_population_stddev() {
        // window 10, 11, 12: mean 11, population variance 2/3
        let samples = make_samples(&[10.0, 11.0, 12.0]);
        let bands = bollinger(&samples, 3, 2.0);
        let std = (2.0_f64 / 3.0).sqrt();
        assert_approx(bands.upper[2], 11.0 + 2.0 * std, DEFAULT_EPSILON);
        assert_approx(bands.lower[2], 11.0 - 2.0 * std, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let samples = make_samples(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let bands = bollinger(&samples, 3, 2.0);
        for i in 2..5 {
            let half_width = bands.upper[i] - bands.middle[i];
            assert_approx(bands.middle[i] - bands.lower[i], half_width, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let samples = make_samples(&[100.0, 100.0, 100.0, 100.0]);
        let bands = bollinger(&samples, 3, 2.0);
        assert_approx(bands.upper[2], 100.0, DEFAULT_EPSILON);
        assert_approx(bands.lower[2], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_nan_propagation() {
        let mut samples = make_samples(&[10.0, 11.0, 12.0, 13.0]);
        samples[2].close = f64::NAN;
        let result = Bollinger::upper(3, 2.0).compute(&samples);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn bollinger_lookback() {
        assert_eq!(Bollinger::upper(20, 2.0).lookback(), 19);
    }
}
