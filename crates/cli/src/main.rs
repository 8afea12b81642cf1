mod output;
mod study;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::{OutputFormat, ReadingWriter};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;
use streamta_data::BarReader;
use streamta_indicators::{replay, IndicatorConfig, Ma};
use study::StudyFile;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "streamta")]
#[command(about = "Streaming technical indicators over a bar stream")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay CSV bars from stdin through a set of indicators
    Run {
        /// TOML study file listing `[[indicators]]`
        #[arg(short, long, env = "STREAMTA_STUDY")]
        config: Option<PathBuf>,

        /// Extra indicator spec, e.g. "rsi:14" or "macd:12,26,9" (repeatable)
        #[arg(short, long = "indicator")]
        indicators: Vec<IndicatorConfig>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "jsonl")]
        format: OutputFormat,
    },

    /// Time a naive window mean against the streaming moving average
    Compare {
        /// Number of observations
        #[arg(long, default_value = "10000")]
        size: usize,

        /// Window length
        #[arg(long, default_value = "1000")]
        periods: usize,
    },

    /// List available indicator kinds
    Indicators,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries the readings.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            indicators,
            format,
        } => run_study(config, indicators, format)?,
        Commands::Compare { size, periods } => compare(size, periods)?,
        Commands::Indicators => {
            println!("Available indicators (spec syntax, defaults in brackets):");
            println!("  ma:PERIODS                      - Simple moving average [20]");
            println!("  ema:PERIODS,ALPHA               - Exponential moving average [20, 2.0]");
            println!("  rsi:PERIODS                     - Relative strength index of bar bodies [14]");
            println!("  macd:SHORT,LONG,SIGNAL,ALPHA    - MACD line and signal line [12, 26, 9, 2.0]");
            println!("  dmi:PERIODS                     - Directional movement index [14]");
            println!("  bollinger:PERIODS,NUM_STD       - Bollinger Bands [20, 2.0]");
        }
    }

    Ok(())
}

fn run_study(
    config: Option<PathBuf>,
    extra: Vec<IndicatorConfig>,
    format: OutputFormat,
) -> Result<()> {
    let mut configs = match &config {
        Some(path) => StudyFile::load(path)?.indicators,
        None => Vec::new(),
    };
    configs.extend(extra);
    if configs.is_empty() {
        configs = IndicatorConfig::default_study();
    }

    let mut study = configs
        .iter()
        .map(|c| Ok((c.label(), c.build()?)))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        indicators = study.len(),
        study = ?config.as_ref().map(|p| p.display().to_string()),
        "Starting replay"
    );

    let columns: Vec<_> = study
        .iter()
        .map(|(label, indicator)| (label.clone(), indicator.reading()))
        .collect();
    let stdout = io::stdout();
    let mut writer = ReadingWriter::new(format, BufWriter::new(stdout.lock()), &columns)?;

    let mut bars = 0usize;
    let mut readings = columns;
    for bar in BarReader::new(io::stdin().lock())? {
        let bar = bar?;
        bars += 1;
        for ((_, indicator), (label, reading)) in study.iter_mut().zip(readings.iter_mut()) {
            let was_ready = indicator.is_ready();
            *reading = indicator.update_bar(&bar);
            if !was_ready && indicator.is_ready() {
                tracing::debug!(indicator = %label, bars, "Indicator warmed up");
            }
        }
        writer.write(&bar, &readings)?;
    }
    writer.flush()?;

    for (label, indicator) in &study {
        if !indicator.is_ready() {
            tracing::warn!(
                indicator = %label,
                bars,
                needed = indicator.period(),
                "Stream ended before indicator warmed up"
            );
        }
    }
    tracing::info!(bars, "Replay complete");
    Ok(())
}

/// Mean of each trailing window, recomputed from scratch at every step.
fn naive_means(series: &[f64], periods: usize) -> Vec<f64> {
    series
        .windows(periods)
        .map(|window| window.iter().sum::<f64>() / periods as f64)
        .collect()
}

fn compare(size: usize, periods: usize) -> Result<()> {
    let mut ma = Ma::new(periods)?;
    if size < periods {
        anyhow::bail!("size ({}) must be at least periods ({})", size, periods);
    }
    let series: Vec<f64> = (0..size).map(|i| ((i * 7919) % 1000) as f64 / 10.0).collect();

    let start = Instant::now();
    let naive = naive_means(&series, periods);
    let naive_us = start.elapsed().as_secs_f64() * 1e6;

    let start = Instant::now();
    let streaming = replay(&mut ma, series.iter().copied());
    let streaming_us = start.elapsed().as_secs_f64() * 1e6;

    let mismatches = naive
        .iter()
        .zip(&streaming[periods - 1..])
        .filter(|(a, b)| (*a - *b).abs() > 1e-6)
        .count();
    if mismatches > 0 {
        anyhow::bail!("streaming MA diverged from naive mean at {} points", mismatches);
    }
    tracing::debug!(points = naive.len(), "Streaming MA agrees with naive mean");

    println!("size,periods,naive_us,streaming_us");
    println!("{},{},{:.1},{:.1}", size, periods, naive_us, streaming_us);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_means_align_with_streaming() {
        let series: Vec<f64> = (0..50).map(|i| (i % 9) as f64).collect();
        let naive = naive_means(&series, 5);
        let mut ma = Ma::new(5).unwrap();
        let streaming = replay(&mut ma, series.iter().copied());
        assert_eq!(naive.len(), streaming.len() - 4);
        for (a, b) in naive.iter().zip(&streaming[4..]) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_compare_rejects_short_series() {
        assert!(compare(3, 5).is_err());
        assert!(compare(10, 0).is_err());
    }

    #[test]
    fn test_cli_parses_indicator_specs() {
        let cli = Cli::try_parse_from([
            "streamta", "run", "-i", "rsi:7", "-i", "macd:3,6,2", "--format", "csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                indicators, format, ..
            } => {
                assert_eq!(indicators.len(), 2);
                assert_eq!(indicators[0], IndicatorConfig::Rsi { periods: 7 });
                assert_eq!(format, OutputFormat::Csv);
            }
            _ => panic!("expected run"),
        }
        assert!(Cli::try_parse_from(["streamta", "run", "-i", "nope"]).is_err());
    }
}
