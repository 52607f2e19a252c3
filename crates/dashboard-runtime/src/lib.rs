//! Runtime layer for the sales dashboard.
//!
//! Owns the loaded table, watches the source file for changes and feeds
//! fresh dashboard snapshots to the UI over a channel.

pub mod data_manager;
pub mod orchestrator;

pub use dashboard_core as core;
pub use dashboard_data as data;
