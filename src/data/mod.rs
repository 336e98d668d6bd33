//! Tabular input and batching
//!
//! `TimeSeriesFrame` holds the lagged table, `SeriesDataset` and
//! `SeriesBatcher` feed it to burn data loaders.

pub mod dataset;
pub mod frame;

pub use dataset::{SeriesBatch, SeriesBatcher, SeriesDataset, SeriesItem};
pub use frame::{TimeSeriesFrame, TARGET_COLUMN};
