use crate::ma::Ma;
use crate::{is_available, Indicator};
use serde::Serialize;
use streamta_core::ConfigError;

/// Conventional DMI lookback.
pub const DEFAULT_PERIODS: usize = 14;

/// Directional Movement Index.
///
/// Smooths +DM, -DM and true range with simple moving averages, derives the
/// directional indicators as ratios of those averages, and averages them
/// (and their normalized spread, DX) again over the same window.
///
/// Values are ratios in `[0, 1]` for the DIs and `[-1, 1]` for ADX; they are
/// not scaled to percentages.
#[derive(Debug, Clone)]
pub struct Dmi {
    periods: usize,
    /// High, low, close of the previous bar.
    previous: Option<(f64, f64, f64)>,
    smoothed_dm_pos: Ma,
    smoothed_dm_neg: Ma,
    smoothed_tr: Ma,
    di_pos: Ma,
    di_neg: Ma,
    adx: Ma,
    count: usize,
}

/// DMI output. Each component is NaN until its average is warm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DmiValue {
    pub di_pos: f64,
    pub di_neg: f64,
    pub adx: f64,
}

impl DmiValue {
    pub fn is_ready(&self) -> bool {
        is_available(self.di_pos) && is_available(self.di_neg) && is_available(self.adx)
    }
}

impl Dmi {
    pub fn new(periods: usize) -> Result<Self, ConfigError> {
        let periods = ConfigError::check_period("DMI", periods)?;
        Ok(Self::build(periods))
    }

    fn build(periods: usize) -> Self {
        Self {
            periods,
            previous: None,
            smoothed_dm_pos: Ma::build(periods),
            smoothed_dm_neg: Ma::build(periods),
            smoothed_tr: Ma::build(periods),
            di_pos: Ma::build(periods),
            di_neg: Ma::build(periods),
            adx: Ma::build(periods),
            count: 0,
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> DmiValue {
        if let Some((prev_high, prev_low, prev_close)) = self.previous {
            let tr = (high - low)
                .abs()
                .max((high - prev_close).abs())
                .max((low - prev_close).abs());
            let mut dm_pos = high - prev_high;
            let mut dm_neg = prev_low - low;
            if dm_pos > dm_neg {
                dm_neg = 0.0;
            } else if dm_neg > dm_pos {
                dm_pos = 0.0;
            }
            self.smoothed_dm_pos.update(dm_pos);
            self.smoothed_dm_neg.update(dm_neg);
            self.smoothed_tr.update(tr);
        }

        if self.count > self.periods + 1 {
            let tr = self.smoothed_tr.get();
            let (di_pos, di_neg) = if tr == 0.0 {
                (0.0, 0.0)
            } else {
                (self.smoothed_dm_pos.get() / tr, self.smoothed_dm_neg.get() / tr)
            };
            let spread = di_pos + di_neg;
            let dx = if spread == 0.0 {
                0.0
            } else {
                (di_pos - di_neg) / spread
            };
            self.di_pos.update(di_pos);
            self.di_neg.update(di_neg);
            self.adx.update(dx);
        }

        self.previous = Some((high, low, close));
        self.count += 1;
        self.get()
    }

    pub fn get(&self) -> DmiValue {
        DmiValue {
            di_pos: self.di_pos.get(),
            di_neg: self.di_neg.get(),
            adx: self.adx.get(),
        }
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Bars needed before every component is available.
    pub fn warm_up(&self) -> usize {
        2 * self.periods + 2
    }

    pub fn is_ready(&self) -> bool {
        self.adx.is_ready()
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.smoothed_dm_pos.reset();
        self.smoothed_dm_neg.reset();
        self.smoothed_tr.reset();
        self.di_pos.reset();
        self.di_neg.reset();
        self.adx.reset();
        self.count = 0;
    }
}

impl Default for Dmi {
    fn default() -> Self {
        Self::build(DEFAULT_PERIODS)
    }
}

impl Indicator for Dmi {
    /// `(high, low, close)` of one bar.
    type Input = (f64, f64, f64);
    type Output = DmiValue;

    fn next(&mut self, (high, low, close): (f64, f64, f64)) -> DmiValue {
        self.update(high, low, close)
    }

    fn current(&self) -> DmiValue {
        self.get()
    }

    fn reset(&mut self) {
        Dmi::reset(self);
    }

    fn period(&self) -> usize {
        self.warm_up()
    }

    fn is_ready(&self) -> bool {
        Dmi::is_ready(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising_bar(i: usize) -> (f64, f64, f64) {
        let base = i as f64;
        (10.0 + base, 9.0 + base, 9.5 + base)
    }

    #[test]
    fn test_dmi_warm_up() {
        let mut dmi = Dmi::new(2).unwrap();
        assert_eq!(dmi.warm_up(), 6);
        for i in 0..5 {
            let (h, l, c) = rising_bar(i);
            assert!(!dmi.update(h, l, c).is_ready(), "ready at bar {}", i + 1);
        }
        let (h, l, c) = rising_bar(5);
        assert!(dmi.update(h, l, c).is_ready());
    }

    #[test]
    fn test_dmi_uptrend() {
        let mut dmi = Dmi::new(2).unwrap();
        let bars: Vec<_> = (0..8).map(rising_bar).collect();
        let out = *crate::replay(&mut dmi, bars).last().unwrap();
        // +DM = 1, -DM = 0, TR = 1.5 on every bar after the first
        assert!((out.di_pos - 1.0 / 1.5).abs() < 1e-9);
        assert_eq!(out.di_neg, 0.0);
        assert!((out.adx - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dmi_flat_market_stays_finite() {
        let mut dmi = Dmi::new(2).unwrap();
        let mut out = dmi.get();
        for _ in 0..10 {
            out = dmi.update(5.0, 5.0, 5.0);
        }
        assert_eq!(out.di_pos, 0.0);
        assert_eq!(out.di_neg, 0.0);
        assert_eq!(out.adx, 0.0);
    }

    #[test]
    fn test_dmi_reset() {
        let mut dmi = Dmi::default();
        assert_eq!(dmi.periods(), DEFAULT_PERIODS);
        for i in 0..40 {
            let (h, l, c) = rising_bar(i);
            dmi.update(h, l, c);
        }
        assert!(dmi.is_ready());
        dmi.reset();
        assert!(!dmi.is_ready());
        assert!(dmi.get().di_pos.is_nan());
    }

    #[test]
    fn test_dmi_zero_period_rejected() {
        assert!(matches!(Dmi::new(0), Err(ConfigError::ZeroPeriod { indicator: "DMI" })));
    }
}
