use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single OHLCV bar, delivered in chronological order by whatever feeds
/// the indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time, when the source carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    /// A flat bar where every price equals `close`.
    pub fn from_close(close: f64) -> Self {
        Self {
            timestamp: None,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    /// Close minus open of this bar.
    pub fn body(&self) -> f64 {
        self.close - self.open
    }

    /// Whether every price field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_close_is_flat() {
        let bar = Bar::from_close(42.5);
        assert_eq!(bar.open, 42.5);
        assert_eq!(bar.high, 42.5);
        assert_eq!(bar.low, 42.5);
        assert_eq!(bar.body(), 0.0);
        assert!(bar.timestamp.is_none());
    }

    #[test]
    fn test_bar_serde_skips_missing_timestamp() {
        let bar = Bar::from_close(1.0);
        let json = serde_json::to_string(&bar).unwrap();
        assert!(!json.contains("timestamp"));

        let parsed: Bar =
            serde_json::from_str(r#"{"open":1.0,"high":2.0,"low":0.5,"close":1.5}"#).unwrap();
        assert_eq!(parsed.volume, 0.0);
        assert_eq!(parsed.body(), 0.5);
    }

    #[test]
    fn test_is_finite() {
        let mut bar = Bar::from_close(3.0);
        assert!(bar.is_finite());
        bar.high = f64::INFINITY;
        assert!(!bar.is_finite());
    }
}
