//! Data layer for the sales dashboard.
//!
//! Loads the transaction spreadsheet, computes the aggregation views and
//! headline summary, and encodes them as CSV downloads.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod reader;

pub use dashboard_core as core;
