use crate::{available, Indicator, NOT_AVAILABLE};
use streamta_core::ConfigError;

/// Simple Moving Average (MA) over a fixed window.
///
/// Keeps the last `periods` values in a ring buffer alongside their running
/// sum. Once the window is full, each update evicts the oldest slot from the
/// sum and adds the new value, so the window is never rescanned.
///
/// The running-sum trick only works for invertible reducers: a windowed
/// min or max cannot be maintained this way.
#[derive(Debug, Clone)]
pub struct Ma {
    periods: usize,
    count: usize,
    sum: f64,
    buffer: Box<[f64]>,
    cursor: usize,
}

impl Ma {
    pub fn new(periods: usize) -> Result<Self, ConfigError> {
        let periods = ConfigError::check_period("MA", periods)?;
        Ok(Self::build(periods))
    }

    /// Construct from an already-validated, non-zero period.
    pub(crate) fn build(periods: usize) -> Self {
        Self {
            periods,
            count: 0,
            sum: 0.0,
            buffer: vec![0.0; periods].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Push a value into the window and return the updated average.
    pub fn update(&mut self, value: f64) -> f64 {
        if self.count < self.periods {
            self.count += 1;
        } else {
            self.sum -= self.buffer[self.cursor];
        }
        self.buffer[self.cursor] = value;
        self.sum += value;
        self.cursor = (self.cursor + 1) % self.periods;
        self.get()
    }

    /// Current average, or [`NOT_AVAILABLE`] while fewer than `periods`
    /// values have been seen.
    pub fn get(&self) -> f64 {
        if self.count < self.periods {
            NOT_AVAILABLE
        } else {
            self.sum / self.periods as f64
        }
    }

    /// Current average as an `Option`.
    pub fn value(&self) -> Option<f64> {
        available(self.get())
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Number of values seen, saturating at `periods`.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_ready(&self) -> bool {
        self.count >= self.periods
    }

    /// Running sum of the values currently in the window.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.count = 0;
        self.sum = 0.0;
        self.cursor = 0;
    }
}

impl Indicator for Ma {
    type Input = f64;
    type Output = f64;

    fn next(&mut self, value: f64) -> f64 {
        self.update(value)
    }

    fn current(&self) -> f64 {
        self.get()
    }

    fn reset(&mut self) {
        Ma::reset(self);
    }

    fn period(&self) -> usize {
        self.periods
    }

    fn is_ready(&self) -> bool {
        Ma::is_ready(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic xorshift generator for pseudo-random sequences.
    struct XorShift(u64);

    impl XorShift {
        fn next_f64(&mut self) -> f64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    #[test]
    fn test_ma_basic() {
        let mut ma = Ma::new(3).unwrap();
        let ts = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        for value in ts {
            let y = ma.update(value);
            if value < 3.0 {
                assert!(y.is_nan());
            } else {
                assert_eq!(y, value - 1.0);
            }
        }
    }

    #[test]
    fn test_ma_zero_period_rejected() {
        assert_eq!(
            Ma::new(0).unwrap_err(),
            ConfigError::ZeroPeriod { indicator: "MA" }
        );
    }

    #[test]
    fn test_ma_warm_up_reports_not_available() {
        let mut ma = Ma::new(5).unwrap();
        assert!(ma.get().is_nan());
        for _ in 0..4 {
            assert!(ma.update(7.25).is_nan());
            assert!(ma.value().is_none());
        }
        assert_eq!(ma.update(7.25), 7.25);
        assert_eq!(ma.value(), Some(7.25));
    }

    #[test]
    fn test_ma_single_period_tracks_input() {
        let mut ma = Ma::new(1).unwrap();
        assert_eq!(ma.update(4.0), 4.0);
        assert_eq!(ma.update(-2.0), -2.0);
        assert_eq!(ma.count(), 1);
    }

    #[test]
    fn test_ma_sum_matches_brute_force_window() {
        for periods in [1usize, 2, 3, 7, 16] {
            let mut rng = XorShift(0x9E37_79B9_7F4A_7C15 ^ periods as u64);
            let mut ma = Ma::new(periods).unwrap();
            let mut history = Vec::new();
            for _ in 0..500 {
                let value = rng.next_f64() * 200.0 - 100.0;
                history.push(value);
                let got = ma.update(value);
                if history.len() < periods {
                    assert!(got.is_nan());
                    continue;
                }
                let window = &history[history.len() - periods..];
                let expected: f64 = window.iter().sum();
                assert!((ma.sum() - expected).abs() < 1e-9);
                assert!((got - expected / periods as f64).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_ma_get_is_idempotent() {
        let mut ma = Ma::new(2).unwrap();
        ma.update(1.0);
        ma.update(2.0);
        let first = ma.get();
        assert_eq!(ma.get(), first);
        assert_eq!(ma.get(), first);
        assert_eq!(ma.count(), 2);
    }

    #[test]
    fn test_ma_reset() {
        let mut ma = Ma::new(2).unwrap();
        ma.update(10.0);
        ma.update(20.0);
        ma.reset();
        assert!(!ma.is_ready());
        assert_eq!(ma.sum(), 0.0);
        assert!(ma.update(5.0).is_nan());
        assert_eq!(ma.update(15.0), 10.0);
    }
}
