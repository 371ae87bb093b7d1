//! Append-only trade history.
//!
//! One headerless CSV line per fired signal, fields in this order:
//! `timestamp,type,instrument,price,amount`. Timestamps are RFC 3339,
//! `type` is `BUY` or `SELL`. Import tooling depends on the field order.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Instrument, SignalKind};

#[derive(Debug, Error)]
pub enum TradeLogError {
    #[error("open trade log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trade log CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub instrument: Instrument,
    pub price: f64,
    pub amount: f64,
}

/// Appends trade records to a CSV file.
#[derive(Debug)]
pub struct TradeLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl TradeLog {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: &Path) -> Result<Self, TradeLogError> {
        let open_err = |source| TradeLogError::Open {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and flush it to disk.
    pub fn append(&mut self, record: &TradeRecord) -> Result<(), TradeLogError> {
        self.writer.serialize(record)?;
        self.writer.flush().map_err(csv::Error::from)?;
        debug!(path = %self.path.display(), kind = %record.kind, "trade recorded");
        Ok(())
    }

    /// Read every record in file order.
    pub fn read_all(path: &Path) -> Result<Vec<TradeRecord>, TradeLogError> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_path(path)?;
        let records = rdr.deserialize().collect::<Result<Vec<TradeRecord>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(kind: SignalKind, price: f64) -> TradeRecord {
        TradeRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            kind,
            instrument: Instrument::parse("KRW-BTC").unwrap(),
            price,
            amount: 100_000.0,
        }
    }

    #[test]
    fn writes_fields_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let mut log = TradeLog::open(&path).unwrap();
        log.append(&record(SignalKind::Buy, 50_000_000.0)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.trim_end(),
            "2024-05-01T09:30:00Z,BUY,KRW-BTC,50000000.0,100000.0"
        );
    }

    #[test]
    fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("trades.csv");
        TradeLog::open(&path)
            .unwrap()
            .append(&record(SignalKind::Buy, 1.0))
            .unwrap();
        TradeLog::open(&path)
            .unwrap()
            .append(&record(SignalKind::Sell, 2.0))
            .unwrap();

        let all = TradeLog::read_all(&path).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, SignalKind::Buy);
        assert_eq!(all[1], record(SignalKind::Sell, 2.0));
    }
}
