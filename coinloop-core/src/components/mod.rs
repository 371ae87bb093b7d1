//! Component traits shared by the indicator library and strategies.

pub mod indicator;

pub use indicator::{Indicator, IndicatorValues};
