use crate::ma::Ma;
use crate::{is_available, Indicator, NOT_AVAILABLE};
use serde::Serialize;
use streamta_core::ConfigError;

/// Bollinger Bands.
///
/// The middle band is a moving average; the bands sit `num_std` population
/// standard deviations above and below it. The deviation comes from a second
/// moving average over squared values, so updates stay O(1).
#[derive(Debug, Clone)]
pub struct Bollinger {
    num_std: f64,
    mean: Ma,
    mean_sq: Ma,
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerValue {
    const WARMING: Self = Self {
        upper: NOT_AVAILABLE,
        middle: NOT_AVAILABLE,
        lower: NOT_AVAILABLE,
    };

    pub fn bandwidth(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn is_ready(&self) -> bool {
        is_available(self.middle)
    }
}

impl Bollinger {
    pub fn new(periods: usize, num_std: f64) -> Result<Self, ConfigError> {
        let periods = ConfigError::check_period("Bollinger", periods)?;
        if !(num_std.is_finite() && num_std >= 0.0) {
            return Err(ConfigError::InvalidStdDev(num_std));
        }
        Ok(Self {
            num_std,
            mean: Ma::build(periods),
            mean_sq: Ma::build(periods),
        })
    }

    /// Standard Bollinger Bands (20, 2).
    pub fn default_periods() -> Self {
        Self {
            num_std: 2.0,
            mean: Ma::build(20),
            mean_sq: Ma::build(20),
        }
    }

    pub fn update(&mut self, value: f64) -> BollingerValue {
        self.mean.update(value);
        self.mean_sq.update(value * value);
        self.get()
    }

    pub fn get(&self) -> BollingerValue {
        let middle = self.mean.get();
        if middle.is_nan() {
            return BollingerValue::WARMING;
        }
        let offset = self.num_std * self.std_dev();
        BollingerValue {
            upper: middle + offset,
            middle,
            lower: middle - offset,
        }
    }

    /// Population standard deviation of the window.
    pub fn std_dev(&self) -> f64 {
        let middle = self.mean.get();
        // Rounding can push the difference slightly below zero.
        let variance = (self.mean_sq.get() - middle * middle).max(0.0);
        variance.sqrt()
    }

    pub fn periods(&self) -> usize {
        self.mean.periods()
    }

    pub fn num_std(&self) -> f64 {
        self.num_std
    }

    pub fn is_ready(&self) -> bool {
        self.mean.is_ready()
    }

    pub fn reset(&mut self) {
        self.mean.reset();
        self.mean_sq.reset();
    }
}

impl Default for Bollinger {
    fn default() -> Self {
        Self::default_periods()
    }
}

impl Indicator for Bollinger {
    type Input = f64;
    type Output = BollingerValue;

    fn next(&mut self, value: f64) -> BollingerValue {
        self.update(value)
    }

    fn current(&self) -> BollingerValue {
        self.get()
    }

    fn reset(&mut self) {
        Bollinger::reset(self);
    }

    fn period(&self) -> usize {
        self.periods()
    }

    fn is_ready(&self) -> bool {
        Bollinger::is_ready(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_basic() {
        let mut bb = Bollinger::new(3, 2.0).unwrap();
        assert!(!bb.update(10.0).is_ready());
        assert!(!bb.update(11.0).is_ready());
        let out = bb.update(12.0);
        assert!((out.middle - 11.0).abs() < 1e-9);
        let sd = (2.0f64 / 3.0).sqrt();
        assert!((out.upper - (11.0 + 2.0 * sd)).abs() < 1e-9);
        assert!((out.lower - (11.0 - 2.0 * sd)).abs() < 1e-9);
        assert!((out.bandwidth() - 4.0 * sd).abs() < 1e-9);
    }

    #[test]
    fn test_bollinger_constant_series_collapses() {
        let mut bb = Bollinger::new(4, 2.0).unwrap();
        let mut out = bb.get();
        for _ in 0..6 {
            out = bb.update(0.1);
        }
        assert!((out.upper - out.lower).abs() < 1e-9);
        assert!(bb.std_dev() >= 0.0);
    }

    #[test]
    fn test_bollinger_matches_brute_force() {
        let values = [3.0, 7.0, 1.0, 9.0, 4.0, 4.5, 8.0, 2.0, 6.0, 5.0];
        let periods = 4;
        let mut bb = Bollinger::new(periods, 1.5).unwrap();
        for (i, value) in values.iter().enumerate() {
            let out = bb.update(*value);
            if i + 1 < periods {
                continue;
            }
            let window = &values[i + 1 - periods..=i];
            let mean = window.iter().sum::<f64>() / periods as f64;
            let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / periods as f64;
            assert!((out.middle - mean).abs() < 1e-9);
            assert!((out.upper - (mean + 1.5 * var.sqrt())).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bollinger_invalid_config() {
        assert!(matches!(
            Bollinger::new(0, 2.0),
            Err(ConfigError::ZeroPeriod { .. })
        ));
        assert_eq!(
            Bollinger::new(20, -1.0).unwrap_err(),
            ConfigError::InvalidStdDev(-1.0)
        );
    }
}
