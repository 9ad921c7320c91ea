//! Errors raised while decoding Parquet files.

use thiserror::Error;

/// Errors that can occur when reading a Parquet file from memory.
#[derive(Debug, Error)]
pub enum ParquetReadError {
    /// The buffer is not a readable Parquet file (bad magic, truncated footer, ...).
    #[error("Failed to open Parquet file: {0}")]
    Open(#[source] parquet::errors::ParquetError),

    /// A record batch could not be read.
    #[error("Failed to read Parquet record batch {batch}: {source}")]
    Batch {
        /// Zero-based index of the failing batch
        batch: usize,
        /// The underlying Arrow error
        #[source]
        source: arrow_schema::ArrowError,
    },

    /// A column could not be converted into row values.
    #[error("Failed to convert column '{column}': {message}")]
    Convert {
        /// The column name
        column: String,
        /// Description of the conversion problem
        message: String,
    },

    /// The `geo` key-value metadata is not valid JSON.
    #[error("Invalid GeoParquet metadata: {0}")]
    Metadata(#[source] serde_json::Error),
}

/// Result type alias that uses [`ParquetReadError`].
pub type ParquetReadResult<T> = Result<T, ParquetReadError>;
