use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use streamta_core::Bar;
use streamta_indicators::{is_available, Reading};

/// How replayed readings are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per bar; unavailable values are `null`.
    Jsonl,
    /// One CSV row per bar; unavailable values are empty.
    Csv,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    close: f64,
    values: BTreeMap<&'a str, Reading>,
}

/// Writes one row per bar in the selected format.
pub enum ReadingWriter<W: Write> {
    Jsonl(W),
    Csv(csv::Writer<W>),
}

impl<W: Write> ReadingWriter<W> {
    /// `columns` pairs each indicator label with a reading of its shape.
    pub fn new(format: OutputFormat, out: W, columns: &[(String, Reading)]) -> Result<Self> {
        match format {
            OutputFormat::Jsonl => Ok(ReadingWriter::Jsonl(out)),
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(out);
                let mut header = vec!["timestamp".to_string(), "close".to_string()];
                for (label, reading) in columns {
                    header.extend(column_names(label, reading));
                }
                writer.write_record(&header)?;
                Ok(ReadingWriter::Csv(writer))
            }
        }
    }

    pub fn write(&mut self, bar: &Bar, readings: &[(String, Reading)]) -> Result<()> {
        match self {
            ReadingWriter::Jsonl(out) => {
                let row = JsonRow {
                    timestamp: bar.timestamp,
                    close: bar.close,
                    values: readings
                        .iter()
                        .map(|(label, reading)| (label.as_str(), *reading))
                        .collect(),
                };
                serde_json::to_writer(&mut *out, &row)?;
                out.write_all(b"\n")?;
            }
            ReadingWriter::Csv(writer) => {
                let mut record = vec![
                    bar.timestamp.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
                    bar.close.to_string(),
                ];
                for (_, reading) in readings {
                    record.extend(reading.fields().into_iter().map(|(_, v)| format_value(v)));
                }
                writer.write_record(&record)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        match self {
            ReadingWriter::Jsonl(out) => out.flush()?,
            ReadingWriter::Csv(writer) => writer.flush()?,
        }
        Ok(())
    }
}

fn column_names(label: &str, reading: &Reading) -> Vec<String> {
    match reading {
        Reading::Value(_) => vec![label.to_string()],
        other => other
            .fields()
            .into_iter()
            .map(|(field, _)| format!("{}.{}", label, field))
            .collect(),
    }
}

fn format_value(value: f64) -> String {
    if is_available(value) {
        value.to_string()
    } else {
        String::new()
    }
}
