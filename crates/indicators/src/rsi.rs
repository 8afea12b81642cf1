use crate::ma::Ma;
use crate::{available, Indicator, NOT_AVAILABLE};
use streamta_core::ConfigError;

/// Conventional RSI lookback.
pub const DEFAULT_PERIODS: usize = 14;

/// Relative Strength Index (RSI).
///
/// Each bar contributes its body (`close - open`) as a gain or a loss; both
/// are averaged with a simple moving average over `periods` bars.
#[derive(Debug, Clone)]
pub struct Rsi {
    gains: Ma,
    losses: Ma,
}

impl Rsi {
    pub fn new(periods: usize) -> Result<Self, ConfigError> {
        let periods = ConfigError::check_period("RSI", periods)?;
        Ok(Self {
            gains: Ma::new(periods)?,
            losses: Ma::new(periods)?,
        })
    }

    pub fn update(&mut self, open: f64, close: f64) -> f64 {
        let diff = close - open;
        self.gains.update(diff.max(0.0));
        self.losses.update((-diff).max(0.0));
        self.get()
    }

    /// Current RSI in `[0, 100]`. Saturates at 100 when the average loss is zero.
    pub fn get(&self) -> f64 {
        let losses = self.losses.get();
        if losses.is_nan() {
            return NOT_AVAILABLE;
        }
        if losses == 0.0 {
            return 100.0;
        }
        100.0 - 100.0 / (1.0 + self.gains.get() / losses)
    }

    pub fn value(&self) -> Option<f64> {
        available(self.get())
    }

    pub fn periods(&self) -> usize {
        self.losses.periods()
    }

    pub fn is_ready(&self) -> bool {
        self.losses.is_ready()
    }

    /// Average gain over the window.
    pub fn average_gain(&self) -> f64 {
        self.gains.get()
    }

    /// Average loss over the window, as a non-negative number.
    pub fn average_loss(&self) -> f64 {
        self.losses.get()
    }

    pub fn reset(&mut self) {
        self.gains.reset();
        self.losses.reset();
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self {
            gains: Ma::build(DEFAULT_PERIODS),
            losses: Ma::build(DEFAULT_PERIODS),
        }
    }
}

impl Indicator for Rsi {
    /// `(open, close)` of one bar.
    type Input = (f64, f64);
    type Output = f64;

    fn next(&mut self, (open, close): (f64, f64)) -> f64 {
        self.update(open, close)
    }

    fn current(&self) -> f64 {
        self.get()
    }

    fn reset(&mut self) {
        Rsi::reset(self);
    }

    fn period(&self) -> usize {
        self.periods()
    }

    fn is_ready(&self) -> bool {
        Rsi::is_ready(self)
    }
}
