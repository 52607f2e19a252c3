//! Core domain types for the sales dashboard.
//!
//! Holds the transaction model, the period type used for chronological
//! grouping, the error taxonomy, display formatting, CLI settings and time
//! helpers shared by the data, runtime and UI crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod period;
pub mod settings;
pub mod time_utils;
