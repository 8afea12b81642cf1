use crate::{available, Indicator, NOT_AVAILABLE};
use streamta_core::ConfigError;

/// Default smoothing input; gives the classic `2 / (periods + 1)` factor.
pub const DEFAULT_ALPHA: f64 = 2.0;

/// Exponential Moving Average (EMA).
///
/// Seeded with the plain average of the first `periods` values, then
/// smoothed with `prev = value * k + prev * (1 - k)` where
/// `k = alpha / (1 + periods)`.
#[derive(Debug, Clone)]
pub struct Ema {
    periods: usize,
    alpha: f64,
    smoothing: f64,
    count: usize,
    /// Partial sum while warming up, the smoothed value afterwards.
    prev: f64,
}

impl Ema {
    pub fn new(periods: usize) -> Result<Self, ConfigError> {
        Self::with_alpha(periods, DEFAULT_ALPHA)
    }

    pub fn with_alpha(periods: usize, alpha: f64) -> Result<Self, ConfigError> {
        let periods = ConfigError::check_period("EMA", periods)?;
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ConfigError::InvalidAlpha(alpha));
        }
        Ok(Self::build(periods, alpha))
    }

    /// Construct from already-validated parameters.
    pub(crate) fn build(periods: usize, alpha: f64) -> Self {
        Self {
            periods,
            alpha,
            smoothing: alpha / (1.0 + periods as f64),
            count: 0,
            prev: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        self.count += 1;
        if self.count < self.periods {
            self.prev += value;
        } else if self.count == self.periods {
            self.prev += value;
            // Initial average
            self.prev /= self.periods as f64;
        } else {
            self.prev = value * self.smoothing + self.prev * (1.0 - self.smoothing);
        }
        self.get()
    }

    pub fn get(&self) -> f64 {
        if self.count >= self.periods {
            self.prev
        } else {
            NOT_AVAILABLE
        }
    }

    pub fn value(&self) -> Option<f64> {
        available(self.get())
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Weight given to the newest value once seeded.
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_ready(&self) -> bool {
        self.count >= self.periods
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.prev = 0.0;
    }
}

impl Indicator for Ema {
    type Input = f64;
    type Output = f64;

    fn next(&mut self, value: f64) -> f64 {
        self.update(value)
    }

    fn current(&self) -> f64 {
        self.get()
    }

    fn reset(&mut self) {
        Ema::reset(self);
    }

    fn period(&self) -> usize {
        self.periods
    }

    fn is_ready(&self) -> bool {
        Ema::is_ready(self)
    }
}
