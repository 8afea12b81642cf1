use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use streamta_indicators::IndicatorConfig;

/// A TOML study file: the indicators to run over one series.
///
/// ```toml
/// [[indicators]]
/// kind = "rsi"
/// periods = 14
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyFile {
    #[serde(default)]
    pub indicators: Vec<IndicatorConfig>,
}

impl StudyFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read study file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid study file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
