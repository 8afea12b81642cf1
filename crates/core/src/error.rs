// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Invalid indicator parameters. Raised at construction, never during updates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{indicator} period must be at least 1")]
    ZeroPeriod { indicator: &'static str },
    #[error("Smoothing alpha must be a positive finite number, got {0}")]
    InvalidAlpha(f64),
    #[error("Short period ({short}) must not exceed long period ({long})")]
    PeriodOrder { short: usize, long: usize },
    #[error("Band width must be a non-negative finite number of deviations, got {0}")]
    InvalidStdDev(f64),
    #[error("Invalid indicator spec: {0}")]
    InvalidSpec(String),
}

impl ConfigError {
    /// Fails with [`ConfigError::ZeroPeriod`] when `periods` is zero.
    pub fn check_period(indicator: &'static str, periods: usize) -> Result<usize, ConfigError> {
        if periods == 0 {
            Err(ConfigError::ZeroPeriod { indicator })
        } else {
            Ok(periods)
        }
    }
}

// ---------------------------------------------------------------------------
// Data errors
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding observations.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_period() {
        assert_eq!(ConfigError::check_period("MA", 3), Ok(3));
        assert_eq!(
            ConfigError::check_period("MA", 0),
            Err(ConfigError::ZeroPeriod { indicator: "MA" })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::ZeroPeriod { indicator: "EMA" };
        assert_eq!(err.to_string(), "EMA period must be at least 1");
        let err = DataError::ParseError("bad row".into());
        assert_eq!(err.to_string(), "Parse error: bad row");
    }
}
