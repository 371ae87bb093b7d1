//! Series buffer: bounded, append-only OHLCV history for one instrument.

use thiserror::Error;
use tracing::warn;

use super::{Instrument, Sample};

/// Errors raised when appending to a [`Series`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("sample at {timestamp} is not after the last sample at {last}")]
    NonIncreasingTimestamp { timestamp: String, last: String },

    #[error("malformed sample at {timestamp}")]
    Malformed { timestamp: String },

    #[error("series capacity must be >= 1")]
    ZeroCapacity,
}

/// Ordered OHLCV samples with strictly increasing timestamps.
///
/// The buffer keeps at most `capacity` samples; appending past capacity evicts
/// the oldest sample. Strategies only ever see the contiguous slice returned
/// by [`Series::samples`].
///
/// Evicted samples stay in the backing `Vec` until it holds twice the
/// capacity, then the stale prefix is drained in one move. Appends are
/// amortized O(1).
#[derive(Debug, Clone)]
pub struct Series {
    instrument: Instrument,
    capacity: usize,
    buf: Vec<Sample>,
}

impl Series {
    pub fn new(instrument: Instrument, capacity: usize) -> Result<Self, SeriesError> {
        if capacity == 0 {
            return Err(SeriesError::ZeroCapacity);
        }
        Ok(Self {
            instrument,
            capacity,
            buf: Vec::with_capacity(capacity),
        })
    }

    /// Build a series from samples, keeping the newest `capacity` of them.
    pub fn from_samples(
        instrument: Instrument,
        capacity: usize,
        samples: impl IntoIterator<Item = Sample>,
    ) -> Result<Self, SeriesError> {
        let mut series = Self::new(instrument, capacity)?;
        for sample in samples {
            series.push(sample)?;
        }
        Ok(series)
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buf.len().min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.buf.last()
    }

    fn check(&self, sample: &Sample) -> Result<(), SeriesError> {
        if !sample.is_well_formed() {
            return Err(SeriesError::Malformed {
                timestamp: sample.timestamp.to_rfc3339(),
            });
        }
        if let Some(last) = self.buf.last() {
            if sample.timestamp <= last.timestamp {
                return Err(SeriesError::NonIncreasingTimestamp {
                    timestamp: sample.timestamp.to_rfc3339(),
                    last: last.timestamp.to_rfc3339(),
                });
            }
        }
        Ok(())
    }

    /// Append a sample. Returns the evicted sample when the buffer was full.
    pub fn push(&mut self, sample: Sample) -> Result<Option<Sample>, SeriesError> {
        self.check(&sample)?;

        let evicted = if self.len() == self.capacity {
            self.samples().first().copied()
        } else {
            None
        };
        self.buf.push(sample);
        if self.buf.len() >= 2 * self.capacity {
            let stale = self.buf.len() - self.capacity;
            self.buf.drain(..stale);
        }
        Ok(evicted)
    }

    /// Merge a freshly fetched batch.
    ///
    /// Samples at or before the current last timestamp are skipped silently.
    /// Malformed or out-of-order samples are skipped with a warning and the
    /// rest of the batch is still merged. Returns exactly the samples that
    /// were appended, in order.
    pub fn merge(&mut self, batch: &[Sample]) -> Vec<Sample> {
        let mut appended = Vec::new();
        for sample in batch {
            let is_new = self
                .buf
                .last()
                .map_or(true, |last| sample.timestamp > last.timestamp);
            if !is_new {
                continue;
            }
            match self.push(*sample) {
                Ok(_) => appended.push(*sample),
                Err(e) => warn!(
                    instrument = %self.instrument,
                    error = %e,
                    "skipping sample"
                ),
            }
        }
        appended
    }

    /// Read-only view of the retained samples, oldest first.
    pub fn samples(&self) -> &[Sample] {
        &self.buf[self.buf.len().saturating_sub(self.capacity)..]
    }

    /// The last `k` samples in insertion order (all samples if `k > len`).
    pub fn tail(&self, k: usize) -> &[Sample] {
        let samples = self.samples();
        &samples[samples.len().saturating_sub(k)..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.samples().iter().map(|s| s.close).collect()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
