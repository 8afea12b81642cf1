use crate::ema::{Ema, DEFAULT_ALPHA};
use crate::{is_available, Indicator, NOT_AVAILABLE};
use serde::Serialize;
use streamta_core::ConfigError;

/// MACD (Moving Average Convergence Divergence).
///
/// Composed of three EMAs:
/// - Short EMA (default 12)
/// - Long EMA (default 26)
/// - Signal EMA (default 9), fed with the MACD line
///
/// The MACD line is available from the `long`-th update. The signal EMA is
/// only fed from that point on, so it starts its own warm-up there and the
/// signal line needs `signal - 1` further updates.
#[derive(Debug, Clone)]
pub struct Macd {
    short: Ema,
    long: Ema,
    signal: Ema,
    start: usize,
    count: usize,
}

/// MACD output. Each component is [`NOT_AVAILABLE`] independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
}

impl MacdValue {
    const WARMING: Self = Self {
        macd: NOT_AVAILABLE,
        signal: NOT_AVAILABLE,
    };

    /// MACD line minus signal line.
    pub fn histogram(&self) -> f64 {
        self.macd - self.signal
    }

    pub fn has_macd(&self) -> bool {
        is_available(self.macd)
    }

    pub fn has_signal(&self) -> bool {
        is_available(self.signal)
    }

    pub fn as_pair(&self) -> (f64, f64) {
        (self.macd, self.signal)
    }
}

impl Macd {
    pub fn new(short: usize, long: usize, signal: usize) -> Result<Self, ConfigError> {
        Self::with_alpha(short, long, signal, DEFAULT_ALPHA)
    }

    pub fn with_alpha(
        short: usize,
        long: usize,
        signal: usize,
        alpha: f64,
    ) -> Result<Self, ConfigError> {
        let short = Ema::with_alpha(short, alpha)?;
        let long = Ema::with_alpha(long, alpha)?;
        let signal = Ema::with_alpha(signal, alpha)?;
        if short.periods() > long.periods() {
            return Err(ConfigError::PeriodOrder {
                short: short.periods(),
                long: long.periods(),
            });
        }
        Ok(Self::from_parts(short, long, signal))
    }

    /// Standard MACD (12, 26, 9).
    pub fn default_periods() -> Self {
        Self::from_parts(
            Ema::build(12, DEFAULT_ALPHA),
            Ema::build(26, DEFAULT_ALPHA),
            Ema::build(9, DEFAULT_ALPHA),
        )
    }

    fn from_parts(short: Ema, long: Ema, signal: Ema) -> Self {
        Self {
            start: long.periods(),
            short,
            long,
            signal,
            count: 0,
        }
    }

    pub fn update(&mut self, value: f64) -> MacdValue {
        self.count += 1;
        self.short.update(value);
        self.long.update(value);
        if self.count >= self.start {
            self.signal.update(self.short.get() - self.long.get());
        }
        self.get()
    }

    pub fn get(&self) -> MacdValue {
        if self.count < self.start {
            return MacdValue::WARMING;
        }
        MacdValue {
            macd: self.short.get() - self.long.get(),
            signal: self.signal.get(),
        }
    }

    /// Updates needed before the MACD line is available.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Updates needed before the signal line is available.
    pub fn signal_start(&self) -> usize {
        self.start + self.signal.periods() - 1
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_ready(&self) -> bool {
        self.signal.is_ready()
    }

    pub fn reset(&mut self) {
        self.short.reset();
        self.long.reset();
        self.signal.reset();
        self.count = 0;
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::default_periods()
    }
}

impl Indicator for Macd {
    type Input = f64;
    type Output = MacdValue;

    fn next(&mut self, value: f64) -> MacdValue {
        self.update(value)
    }

    fn current(&self) -> MacdValue {
        self.get()
    }

    fn reset(&mut self) {
        Macd::reset(self);
    }

    fn period(&self) -> usize {
        self.signal_start()
    }

    fn is_ready(&self) -> bool {
        Macd::is_ready(self)
    }
}
