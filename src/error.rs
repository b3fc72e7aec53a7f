use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a [`FoodTable`](crate::data::model::FoodTable) from a source.
///
/// No partial dataset is ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source file {} not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
    #[error("malformed JSON in {origin}: {details}")]
    Json { origin: String, details: String },
    #[error("unreadable parquet file {origin}: {details}")]
    Parquet { origin: String, details: String },
    #[error("{origin} is missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        origin: String,
        missing: Vec<&'static str>,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

/// Failure while writing records out as CSV or Parquet.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}
