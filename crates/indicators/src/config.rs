//! Declarative indicator configuration and dispatch over a bar stream.

use crate::bollinger::{Bollinger, BollingerValue};
use crate::dmi::{self, Dmi, DmiValue};
use crate::ema::{Ema, DEFAULT_ALPHA};
use crate::ma::Ma;
use crate::macd::{Macd, MacdValue};
use crate::rsi::{self, Rsi};
use crate::{is_available, Indicator};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use streamta_core::{Bar, ConfigError};

const DEFAULT_MA_PERIODS: usize = 20;
const DEFAULT_BOLLINGER_STD: f64 = 2.0;

fn default_ma_periods() -> usize {
    DEFAULT_MA_PERIODS
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_rsi_periods() -> usize {
    rsi::DEFAULT_PERIODS
}

fn default_dmi_periods() -> usize {
    dmi::DEFAULT_PERIODS
}

fn default_macd_short() -> usize {
    12
}

fn default_macd_long() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_std() -> f64 {
    DEFAULT_BOLLINGER_STD
}

/// Parameters for one indicator, as written in a study file.
///
/// ```toml
/// [[indicators]]
/// kind = "macd"
/// short = 12
/// long = 26
/// signal = 9
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorConfig {
    Ma {
        #[serde(default = "default_ma_periods")]
        periods: usize,
    },
    Ema {
        #[serde(default = "default_ma_periods")]
        periods: usize,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    Rsi {
        #[serde(default = "default_rsi_periods")]
        periods: usize,
    },
    Macd {
        #[serde(default = "default_macd_short")]
        short: usize,
        #[serde(default = "default_macd_long")]
        long: usize,
        #[serde(default = "default_macd_signal")]
        signal: usize,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    Dmi {
        #[serde(default = "default_dmi_periods")]
        periods: usize,
    },
    Bollinger {
        #[serde(default = "default_ma_periods")]
        periods: usize,
        #[serde(default = "default_bollinger_std")]
        num_std: f64,
    },
}

impl IndicatorConfig {
    /// The study used when nothing else is configured.
    pub fn default_study() -> Vec<IndicatorConfig> {
        vec![
            IndicatorConfig::Ma {
                periods: DEFAULT_MA_PERIODS,
            },
            IndicatorConfig::Ema {
                periods: DEFAULT_MA_PERIODS,
                alpha: DEFAULT_ALPHA,
            },
            IndicatorConfig::Rsi {
                periods: rsi::DEFAULT_PERIODS,
            },
            IndicatorConfig::Macd {
                short: default_macd_short(),
                long: default_macd_long(),
                signal: default_macd_signal(),
                alpha: DEFAULT_ALPHA,
            },
        ]
    }

    /// Short display name, e.g. `macd(12,26,9)`. Default smoothing is omitted.
    pub fn label(&self) -> String {
        match self {
            IndicatorConfig::Ma { periods } => format!("ma({})", periods),
            IndicatorConfig::Ema { periods, alpha } if *alpha == DEFAULT_ALPHA => {
                format!("ema({})", periods)
            }
            IndicatorConfig::Ema { periods, alpha } => format!("ema({},{})", periods, alpha),
            IndicatorConfig::Rsi { periods } => format!("rsi({})", periods),
            IndicatorConfig::Macd {
                short,
                long,
                signal,
                alpha,
            } if *alpha == DEFAULT_ALPHA => format!("macd({},{},{})", short, long, signal),
            IndicatorConfig::Macd {
                short,
                long,
                signal,
                alpha,
            } => format!("macd({},{},{},{})", short, long, signal, alpha),
            IndicatorConfig::Dmi { periods } => format!("dmi({})", periods),
            IndicatorConfig::Bollinger { periods, num_std } => {
                format!("bollinger({},{})", periods, num_std)
            }
        }
    }

    /// Validate the parameters and construct the indicator.
    pub fn build(&self) -> Result<AnyIndicator, ConfigError> {
        let indicator = match *self {
            IndicatorConfig::Ma { periods } => AnyIndicator::Ma(Ma::new(periods)?),
            IndicatorConfig::Ema { periods, alpha } => {
                AnyIndicator::Ema(Ema::with_alpha(periods, alpha)?)
            }
            IndicatorConfig::Rsi { periods } => AnyIndicator::Rsi(Rsi::new(periods)?),
            IndicatorConfig::Macd {
                short,
                long,
                signal,
                alpha,
            } => AnyIndicator::Macd(Macd::with_alpha(short, long, signal, alpha)?),
            IndicatorConfig::Dmi { periods } => AnyIndicator::Dmi(Dmi::new(periods)?),
            IndicatorConfig::Bollinger { periods, num_std } => {
                AnyIndicator::Bollinger(Bollinger::new(periods, num_std)?)
            }
        };
        tracing::debug!(
            indicator = %self.label(),
            warm_up = indicator.period(),
            "Built indicator"
        );
        Ok(indicator)
    }
}

/// Parses `kind[:arg,arg,...]`, e.g. `rsi:14`, `macd:12,26,9`, `bollinger:20,2.5`.
/// Omitted trailing arguments take their defaults.
impl FromStr for IndicatorConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, rest) = match s.split_once(':') {
            Some((kind, rest)) => (kind, rest),
            None => (s, ""),
        };
        let args: Vec<&str> = rest
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();

        let (config, arity) = match kind.trim().to_lowercase().as_str() {
            "ma" | "sma" => (
                IndicatorConfig::Ma {
                    periods: arg(&args, 0, DEFAULT_MA_PERIODS)?,
                },
                1,
            ),
            "ema" => (
                IndicatorConfig::Ema {
                    periods: arg(&args, 0, DEFAULT_MA_PERIODS)?,
                    alpha: arg(&args, 1, DEFAULT_ALPHA)?,
                },
                2,
            ),
            "rsi" => (
                IndicatorConfig::Rsi {
                    periods: arg(&args, 0, rsi::DEFAULT_PERIODS)?,
                },
                1,
            ),
            "macd" => (
                IndicatorConfig::Macd {
                    short: arg(&args, 0, default_macd_short())?,
                    long: arg(&args, 1, default_macd_long())?,
                    signal: arg(&args, 2, default_macd_signal())?,
                    alpha: arg(&args, 3, DEFAULT_ALPHA)?,
                },
                4,
            ),
            "dmi" | "adx" => (
                IndicatorConfig::Dmi {
                    periods: arg(&args, 0, dmi::DEFAULT_PERIODS)?,
                },
                1,
            ),
            "bollinger" | "bb" => (
                IndicatorConfig::Bollinger {
                    periods: arg(&args, 0, DEFAULT_MA_PERIODS)?,
                    num_std: arg(&args, 1, DEFAULT_BOLLINGER_STD)?,
                },
                2,
            ),
            other => {
                return Err(ConfigError::InvalidSpec(format!(
                    "unknown indicator kind '{}'",
                    other
                )))
            }
        };

        if args.len() > arity {
            return Err(ConfigError::InvalidSpec(format!(
                "'{}' takes at most {} arguments, got {}",
                s,
                arity,
                args.len()
            )));
        }
        Ok(config)
    }
}

fn arg<T: FromStr>(args: &[&str], idx: usize, default: T) -> Result<T, ConfigError> {
    match args.get(idx) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidSpec(format!("invalid argument '{}'", raw))),
        None => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Any configured indicator, driven by whole bars.
///
/// Single-series indicators read `close`; RSI reads `open` and `close`;
/// DMI reads `high`, `low` and `close`.
#[derive(Debug, Clone)]
pub enum AnyIndicator {
    Ma(Ma),
    Ema(Ema),
    Rsi(Rsi),
    Macd(Macd),
    Dmi(Dmi),
    Bollinger(Bollinger),
}

/// Output of an [`AnyIndicator`]. Unavailable components serialize as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Value(f64),
    Macd(MacdValue),
    Dmi(DmiValue),
    Bollinger(BollingerValue),
}

impl Reading {
    /// Named components, in a stable order.
    pub fn fields(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Reading::Value(v) => vec![("value", v)],
            Reading::Macd(m) => vec![
                ("macd", m.macd),
                ("signal", m.signal),
                ("histogram", m.histogram()),
            ],
            Reading::Dmi(d) => vec![("di_pos", d.di_pos), ("di_neg", d.di_neg), ("adx", d.adx)],
            Reading::Bollinger(b) => vec![
                ("upper", b.upper),
                ("middle", b.middle),
                ("lower", b.lower),
            ],
        }
    }

    /// Whether at least one component is available.
    pub fn any_available(&self) -> bool {
        self.fields().iter().any(|(_, v)| is_available(*v))
    }
}

impl AnyIndicator {
    pub fn update_bar(&mut self, bar: &Bar) -> Reading {
        match self {
            AnyIndicator::Ma(i) => Reading::Value(i.update(bar.close)),
            AnyIndicator::Ema(i) => Reading::Value(i.update(bar.close)),
            AnyIndicator::Rsi(i) => Reading::Value(i.update(bar.open, bar.close)),
            AnyIndicator::Macd(i) => Reading::Macd(i.update(bar.close)),
            AnyIndicator::Dmi(i) => Reading::Dmi(i.update(bar.high, bar.low, bar.close)),
            AnyIndicator::Bollinger(i) => Reading::Bollinger(i.update(bar.close)),
        }
    }

    pub fn reading(&self) -> Reading {
        match self {
            AnyIndicator::Ma(i) => Reading::Value(i.get()),
            AnyIndicator::Ema(i) => Reading::Value(i.get()),
            AnyIndicator::Rsi(i) => Reading::Value(i.get()),
            AnyIndicator::Macd(i) => Reading::Macd(i.get()),
            AnyIndicator::Dmi(i) => Reading::Dmi(i.get()),
            AnyIndicator::Bollinger(i) => Reading::Bollinger(i.get()),
        }
    }

    /// Bars needed before the indicator is fully available.
    pub fn period(&self) -> usize {
        match self {
            AnyIndicator::Ma(i) => Indicator::period(i),
            AnyIndicator::Ema(i) => Indicator::period(i),
            AnyIndicator::Rsi(i) => Indicator::period(i),
            AnyIndicator::Macd(i) => Indicator::period(i),
            AnyIndicator::Dmi(i) => Indicator::period(i),
            AnyIndicator::Bollinger(i) => Indicator::period(i),
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            AnyIndicator::Ma(i) => i.is_ready(),
            AnyIndicator::Ema(i) => i.is_ready(),
            AnyIndicator::Rsi(i) => i.is_ready(),
            AnyIndicator::Macd(i) => i.is_ready(),
            AnyIndicator::Dmi(i) => i.is_ready(),
            AnyIndicator::Bollinger(i) => i.is_ready(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            AnyIndicator::Ma(i) => i.reset(),
            AnyIndicator::Ema(i) => i.reset(),
            AnyIndicator::Rsi(i) => i.reset(),
            AnyIndicator::Macd(i) => i.reset(),
            AnyIndicator::Dmi(i) => i.reset(),
            AnyIndicator::Bollinger(i) => i.reset(),
        }
    }
}
