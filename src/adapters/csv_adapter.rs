//! CSV file data adapter.
//!
//! Reads `<base>/<SYMBOL>_<GRANULARITY>.csv` with a header row and the
//! columns `time,open,high,low,close,volume`. `time` is either a date
//! (`2024-01-15`) or a date-time (`2024-01-15T09:30:00`).

use crate::domain::error::BacktestError;
use crate::domain::granularity::Granularity;
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, granularity: Granularity) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, granularity))
    }
}

fn unavailable(symbol: &str, reason: String) -> BacktestError {
    BacktestError::DataUnavailable {
        symbol: symbol.to_string(),
        reason,
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field<T: FromStr>(
    record: &StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
    line: u64,
) -> Result<T, BacktestError>
where
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(index)
        .ok_or_else(|| unavailable(symbol, format!("line {}: missing {} column", line, name)))?;
    raw.trim().parse().map_err(|e| {
        unavailable(
            symbol,
            format!("line {}: invalid {} value '{}': {}", line, name, raw, e),
        )
    })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<PriceSeries, BacktestError> {
        let path = self.csv_path(symbol, granularity);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(symbol, format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| unavailable(symbol, format!("CSV parse error: {}", e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let time = record
                .get(0)
                .ok_or_else(|| unavailable(symbol, format!("line {}: missing time column", line)))?;
            let timestamp = parse_timestamp(time).ok_or_else(|| {
                unavailable(symbol, format!("line {}: invalid time '{}'", line, time))
            })?;

            let date = timestamp.date();
            if date < start || date > end {
                continue;
            }

            bars.push(OhlcvBar {
                timestamp,
                open: parse_field(&record, 1, "open", symbol, line)?,
                high: parse_field(&record, 2, "high", symbol, line)?,
                low: parse_field(&record, 3, "low", symbol, line)?,
                close: parse_field(&record, 4, "close", symbol, line)?,
                volume: parse_field(&record, 5, "volume", symbol, line)?,
            });
        }

        if bars.is_empty() {
            return Err(unavailable(
                symbol,
                format!("no rows in {} between {} and {}", path.display(), start, end),
            ));
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(symbol, %granularity, bars = bars.len(), path = %path.display(), "loaded prices");
        PriceSeries::new(symbol, granularity, bars)
    }
}
