//! Domain types for coinloop

pub mod instrument;
pub mod sample;
pub mod series;
pub mod signal;

pub use instrument::{Instrument, InstrumentError};
pub use sample::Sample;
pub use series::{Series, SeriesError};
pub use signal::{Signal, SignalKind};
