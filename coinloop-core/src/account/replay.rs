//! Replay account: serves a recorded series one sample per price query.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::domain::{Instrument, Sample};

use super::{quote_from_history, AccountCollaborator, AccountError, Balance, CandleInterval, PriceQuote};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or unix seconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Read headered OHLCV rows (`timestamp,open,high,low,close,volume`).
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<Sample>, AccountError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    for (idx, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| AccountError::InvalidRow {
            row: idx + 1,
            reason: format!("unrecognized timestamp `{}`", row.timestamp),
        })?;
        samples.push(Sample::new(
            timestamp, row.open, row.high, row.low, row.close, row.volume,
        ));
    }
    Ok(samples)
}

pub fn read_samples_csv(path: &Path) -> Result<Vec<Sample>, AccountError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_samples(file)
}

/// Replays recorded samples for one instrument.
///
/// Each `current_price` call reveals the next sample; `series` only returns
/// samples revealed so far. Once every sample has been revealed further
/// price queries fail with [`AccountError::Exhausted`]. The candle interval
/// argument is ignored: the recording has its own.
#[derive(Debug)]
pub struct ReplayAccount {
    instrument: Instrument,
    samples: Vec<Sample>,
    cursor: Mutex<usize>,
    balance: Balance,
}

impl ReplayAccount {
    pub fn new(instrument: Instrument, samples: Vec<Sample>) -> Self {
        Self {
            instrument,
            samples,
            cursor: Mutex::new(0),
            balance: Balance::default(),
        }
    }

    pub fn from_csv(instrument: Instrument, path: &Path) -> Result<Self, AccountError> {
        Ok(Self::new(instrument, read_samples_csv(path)?))
    }

    /// Reveal the first `n` samples up front.
    pub fn with_history(self, n: usize) -> Self {
        *self.cursor.lock() = n.min(self.samples.len());
        self
    }

    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = balance;
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples not yet revealed.
    pub fn remaining(&self) -> usize {
        self.samples.len() - *self.cursor.lock()
    }

    fn check(&self, instrument: &Instrument) -> Result<(), AccountError> {
        if instrument != &self.instrument {
            return Err(AccountError::UnknownInstrument(instrument.to_string()));
        }
        Ok(())
    }
}

impl AccountCollaborator for ReplayAccount {
    fn name(&self) -> &str {
        "replay"
    }

    fn current_price(&self, instrument: &Instrument) -> Result<PriceQuote, AccountError> {
        self.check(instrument)?;
        let mut cursor = self.cursor.lock();
        if *cursor >= self.samples.len() {
            return Err(AccountError::Exhausted(self.samples.len()));
        }
        *cursor += 1;
        quote_from_history(&self.samples[..*cursor]).ok_or_else(|| AccountError::PriceUnavailable {
            instrument: instrument.to_string(),
            reason: "no samples revealed".into(),
        })
    }

    fn series(
        &self,
        instrument: &Instrument,
        _interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Sample>, AccountError> {
        self.check(instrument)?;
        let cursor = *self.cursor.lock();
        let start = cursor.saturating_sub(count);
        Ok(self.samples[start..cursor].to_vec())
    }

    fn balance(&self, instrument: &Instrument) -> Result<Balance, AccountError> {
        self.check(instrument)?;
        Ok(self.balance)
    }
}
