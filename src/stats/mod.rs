//! Statistics and metric trait implementations

pub mod histogram;

pub use histogram::{HistogramAggregates, normalize};
