use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::io::Read;
use streamta_core::{Bar, DataError};

/// Decode every bar from a CSV source.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `close` (or `c`, `price`) is required; `timestamp` (or `date`,
/// `datetime`, `time`), `open`, `high`, `low` and `volume` are optional.
/// Missing open/high/low default to the close.
///
/// Rows are returned in input order.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let bars = BarReader::new(reader)?.collect::<Result<Vec<_>, _>>()?;
    tracing::info!(bars = bars.len(), "Decoded bars");
    Ok(bars)
}

/// Streaming bar decoder: yields one [`Bar`] per CSV record.
pub struct BarReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    columns: BarColumnMap,
    row: usize,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<R: Read> BarReader<R> {
    /// Read the header row and resolve the column layout.
    pub fn new(reader: R) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
            .clone();
        let columns = resolve_bar_columns(&headers)?;

        Ok(Self {
            records: reader.into_records(),
            columns,
            row: 0,
            last_timestamp: None,
        })
    }

    fn decode(&mut self, record: &csv::StringRecord) -> Result<Bar, DataError> {
        let cols = &self.columns;
        let close = parse_price(field(record, cols.close, "close")?, "close")?;
        let optional = |idx: Option<usize>, name: &str| -> Result<f64, DataError> {
            match idx {
                Some(idx) => parse_price(field(record, idx, name)?, name),
                None => Ok(close),
            }
        };
        let open = optional(cols.open, "open")?;
        let high = optional(cols.high, "high")?;
        let low = optional(cols.low, "low")?;
        let volume = match cols.volume {
            Some(idx) => parse_price(field(record, idx, "volume")?, "volume")?,
            None => 0.0,
        };
        let timestamp = match cols.timestamp {
            Some(idx) => Some(parse_timestamp(field(record, idx, "timestamp")?)?),
            None => None,
        };

        if let (Some(prev), Some(ts)) = (self.last_timestamp, timestamp) {
            if ts < prev {
                tracing::warn!(row = self.row, %ts, %prev, "Bar timestamp goes backwards");
            }
        }
        if timestamp.is_some() {
            self.last_timestamp = timestamp;
        }

        Ok(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

impl<R: Read> Iterator for BarReader<R> {
    type Item = Result<Bar, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.row += 1;
        let row = self.row;
        let bar = match record {
            Ok(record) => self.decode(&record),
            Err(e) => Err(DataError::ParseError(format!("CSV record error: {}", e))),
        };
        Some(bar.map_err(|e| match e {
            DataError::ParseError(msg) => DataError::ParseError(format!("row {}: {}", row, msg)),
            other => other,
        }))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct BarColumnMap {
    timestamp: Option<usize>,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    let close = find_column(headers, &["close", "c", "price"])
        .ok_or_else(|| DataError::ParseError("No close column found".into()))?;

    Ok(BarColumnMap {
        timestamp: find_column(headers, &["timestamp", "date", "datetime", "time"]),
        open: find_column(headers, &["open", "o"]),
        high: find_column(headers, &["high", "h"]),
        low: find_column(headers, &["low", "l"]),
        close,
        volume: find_column(headers, &["volume", "vol", "v"]),
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let h = header.trim().to_lowercase();
        names.iter().any(|name| h == *name)
    })
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, DataError> {
    record
        .get(idx)
        .ok_or_else(|| DataError::ParseError(format!("Missing {} field", name)))
}

fn parse_price(s: &str, field: &str) -> Result<f64, DataError> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))?;
    if !value.is_finite() {
        return Err(DataError::ParseError(format!(
            "Non-finite {} '{}'",
            field, s
        )));
    }
    Ok(value)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DataError> {
    let s = s.trim();

    // Try RFC 3339 / ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Numeric UTC offset, e.g. 2024-01-02 15:00:00+0000
    for fmt in ["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    // Common formats (without timezone, assume UTC)
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y%m%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    // Date only
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    // Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!(
        "Unable to parse timestamp: '{}'",
        s
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_read_full_bars() {
        let csv = "Date,Open,Low,High,Close,Volume\n\
                   2024-01-02 00:00:00+0000,10,9,11,10.5,100\n\
                   2024-01-03 00:00:00+0000,10.5,10,12,11.5,150\n";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, 10.0);
        assert_eq!(bars[0].low, 9.0);
        assert_eq!(bars[0].high, 11.0);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[1].volume, 150.0);
        assert_eq!(
            bars[1].timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_close_only_source() {
        let bars = read_bars("price\n1.5\n2.5\n".as_bytes()).unwrap();
        assert_eq!(bars, vec![Bar::from_close(1.5), Bar::from_close(2.5)]);
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        for raw in [
            "2024-03-01T12:30:00Z",
            "2024-03-01 12:30:00",
            "2024-03-01T12:30:00",
            "03/01/2024 12:30",
            "1709296200",
        ] {
            assert_eq!(parse_timestamp(raw).unwrap(), expected, "{}", raw);
        }
        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_missing_close_column() {
        let err = read_bars("open,high\n1,2\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("No close column"));
    }

    #[test]
    fn test_rejects_non_finite_and_garbage() {
        let err = read_bars("close\n1.0\nNaN\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(read_bars("close\nabc\n".as_bytes()).is_err());
    }

    #[test]
    fn test_reader_streams_in_input_order() {
        let csv = "time,close\n2024-01-02,2\n2024-01-01,1\n";
        let closes: Vec<f64> = BarReader::new(csv.as_bytes())
            .unwrap()
            .map(|bar| bar.unwrap().close)
            .collect();
        assert_eq!(closes, vec![2.0, 1.0]);
    }
}
