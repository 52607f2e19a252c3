//! Reusable line-level widgets: header, metric cards and share bars.

pub mod header;
pub mod metric_card;
pub mod share_bar;
