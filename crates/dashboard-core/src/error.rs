use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while loading a transaction table.
///
/// Any of these stops the dependent pipeline: no aggregation runs on a table
/// that failed to load.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source file does not exist.
    #[error("Source file not found: {0}")]
    NotFound(PathBuf),

    /// One or more required columns are absent from the header row.
    #[error("Missing required column(s) in {path}: {}", missing.join(", "))]
    SchemaError { path: PathBuf, missing: Vec<String> },

    /// The file extension is not a spreadsheet or CSV format we can read.
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The file exists but could not be opened or decoded.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LoadError {
    /// Wrap any reader error for `path`.
    pub fn read(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Read {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// All errors produced by the sales dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// An export file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be encoded.
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
