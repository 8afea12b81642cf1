pub mod bollinger;
pub mod config;
pub mod dmi;
pub mod ema;
pub mod ma;
pub mod macd;
pub mod rsi;

pub use bollinger::{Bollinger, BollingerValue};
pub use config::{AnyIndicator, IndicatorConfig, Reading};
pub use dmi::{Dmi, DmiValue};
pub use ema::Ema;
pub use ma::Ma;
pub use macd::{Macd, MacdValue};
pub use rsi::Rsi;

/// Value reported while an indicator has not seen enough observations.
pub const NOT_AVAILABLE: f64 = f64::NAN;

/// Whether `value` is a real reading rather than [`NOT_AVAILABLE`].
#[inline]
pub fn is_available(value: f64) -> bool {
    !value.is_nan()
}

/// `Some(value)` unless it is the not-available sentinel.
#[inline]
pub fn available(value: f64) -> Option<f64> {
    if is_available(value) {
        Some(value)
    } else {
        None
    }
}

/// Trait for streaming (incremental) indicators.
/// Feed one input at a time; the indicator maintains internal state.
pub trait Indicator: Send + Sync {
    type Input;
    type Output;

    /// Process the next input and return the indicator output.
    fn next(&mut self, input: Self::Input) -> Self::Output;

    /// The current output without feeding new data.
    fn current(&self) -> Self::Output;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The minimum number of inputs needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

/// Feed every input into `indicator` in order, collecting each output.
pub fn replay<I, It>(indicator: &mut I, inputs: It) -> Vec<I::Output>
where
    I: Indicator,
    It: IntoIterator<Item = I::Input>,
{
    inputs.into_iter().map(|input| indicator.next(input)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_helpers() {
        assert!(!is_available(NOT_AVAILABLE));
        assert!(is_available(0.0));
        assert!(is_available(f64::INFINITY));
        assert_eq!(available(NOT_AVAILABLE), None);
        assert_eq!(available(1.5), Some(1.5));
    }

    #[test]
    fn test_replay_matches_manual_updates() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let mut driven = Ma::new(3).unwrap();
        let outputs = replay(&mut driven, values);

        let mut manual = Ma::new(3).unwrap();
        for (value, out) in values.iter().zip(&outputs) {
            let expected = manual.update(*value);
            assert_eq!(expected.to_bits(), out.to_bits());
        }
    }

    #[test]
    fn test_identical_instances_are_deterministic() {
        let closes: Vec<f64> = (0..200).map(|i| 100.0 + ((i * 37) % 23) as f64 * 0.37).collect();
        let mut a = Macd::default_periods();
        let mut b = Macd::default_periods();
        for close in &closes {
            let x = a.update(*close);
            let y = b.update(*close);
            assert_eq!(x.macd.to_bits(), y.macd.to_bits());
            assert_eq!(x.signal.to_bits(), y.signal.to_bits());
        }
    }
}
