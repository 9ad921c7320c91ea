//! Custom error types for `geoload` ingestion.
//!
//! This module provides structured error handling using `thiserror`. Every
//! fatal pipeline failure is an [`IngestError`]; per-row geometry problems are
//! not errors at this level and never appear here.

use thiserror::Error;

use crate::codec::CompressionFormat;

/// Boxed error used to carry collaborator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for ingestion runs.
///
/// Sub-taxonomies are wrapped with `#[error(transparent)]` so their own
/// messages are shown unchanged.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The source bytes could not be retrieved
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Neither the raw nor the decompressed bytes could be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// No geometry column and no latitude/longitude pair was found
    #[error("No geometry source found among fields: {}", format_fields(fields))]
    NoGeometry {
        /// Field names that were inspected
        fields: Vec<String>,
    },

    /// The file decoded but none of its rows yielded a usable geometry
    #[error("No usable geometry in {rows} decoded row(s)")]
    EmptyResult {
        /// Number of rows that were processed
        rows: usize,
    },

    /// Invalid ingestion options
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn format_fields(fields: &[String]) -> String {
    if fields.is_empty() {
        "(none)".to_string()
    } else {
        fields.join(", ")
    }
}

/// Errors raised while retrieving source bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The locator is neither a usable path nor a supported URL
    #[error("Invalid locator '{locator}': {reason}")]
    InvalidLocator {
        /// The rejected locator
        locator: String,
        /// Why it was rejected
        reason: String,
    },

    /// Nothing exists at the locator
    #[error("Source not found: '{locator}'")]
    NotFound {
        /// The missing locator
        locator: String,
    },

    /// The request itself failed
    #[error("Failed to fetch '{locator}': {source}")]
    Request {
        /// The locator being fetched
        locator: String,
        /// The underlying error
        #[source]
        source: BoxError,
    },
}

/// Errors raised by the decompression adapter.
#[derive(Debug, Error)]
pub enum DecompressionError {
    /// The chunk sequence was empty
    #[error("Nothing to decompress: input produced no chunks")]
    Empty,

    /// The codec rejected the stream
    #[error("{format} stream is corrupt: {source}")]
    Corrupt {
        /// Codec that was applied
        format: CompressionFormat,
        /// The codec error
        #[source]
        source: std::io::Error,
    },
}

/// Aggregated failure of the decode → decompress → decode sequence.
///
/// The variant names the final cause; the first decode failure is kept as
/// context.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Direct decode failed and the bytes could not be decompressed
    #[error("Failed to decode {decoder} data ({initial}); decompression also failed: {source}")]
    Decompression {
        /// Decoder name
        decoder: String,
        /// Message of the first decode attempt
        initial: String,
        /// The decompression failure
        #[source]
        source: DecompressionError,
    },

    /// Decompression succeeded but the decompressed bytes did not decode
    #[error("Failed to decode {decoder} data ({initial}); decompressed data failed too: {source}")]
    Retry {
        /// Decoder name
        decoder: String,
        /// Message of the first decode attempt
        initial: String,
        /// The second decode failure
        #[source]
        source: BoxError,
    },
}

impl DecodeError {
    /// Returns the decompression failure when it was the final cause.
    #[must_use]
    pub fn decompression_failure(&self) -> Option<&DecompressionError> {
        match self {
            Self::Decompression { source, .. } => Some(source),
            Self::Retry { .. } => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },
}

/// Coarse classification of an [`IngestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Decode,
    /// Decoding failed and the decompression fallback failed as well.
    Decompression,
    NoGeometry,
    EmptyResult,
    Config,
}

/// Type alias for Results using `IngestError`.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Classifies the error.
    ///
    /// A decode failure whose final cause was decompression reports
    /// [`ErrorKind::Decompression`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Decode(e) if e.decompression_failure().is_some() => ErrorKind::Decompression,
            Self::Decode(_) => ErrorKind::Decode,
            Self::NoGeometry { .. } => ErrorKind::NoGeometry,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(FetchError::NotFound { locator }) => format!("Nothing found at {locator}"),
            Self::Fetch(e) => format!("Could not load the file: {e}"),
            Self::Decode(e) => format!("Could not read the file: {e}"),
            Self::NoGeometry { .. } | Self::EmptyResult { .. } => {
                format!("The file has no mappable geometry. {self}")
            },
            Self::Config(e) => format!("Configuration error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self.kind() {
            ErrorKind::Fetch => Some("Check that the path or URL is correct and reachable.".to_string()),
            ErrorKind::Decode | ErrorKind::Decompression => {
                Some("Make sure the file is Parquet, optionally zstd or gzip compressed.".to_string())
            },
            ErrorKind::NoGeometry => Some(
                "Name the geometry column explicitly, or provide latitude/longitude columns."
                    .to_string(),
            ),
            ErrorKind::EmptyResult => {
                Some("Validate geometries using a GIS tool before loading.".to_string())
            },
            ErrorKind::Config => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_geometry_message_lists_fields() {
        let err = IngestError::NoGeometry {
            fields: vec!["id".to_string(), "name".to_string()],
        };
        assert_eq!(err.to_string(), "No geometry source found among fields: id, name");
        assert_eq!(err.kind(), ErrorKind::NoGeometry);
    }

    #[test]
    fn test_no_geometry_message_without_fields() {
        let err = IngestError::NoGeometry { fields: Vec::new() };
        assert!(err.to_string().ends_with("(none)"));
    }

    #[test]
    fn test_decompression_failure_takes_precedence_in_kind() {
        let err = IngestError::from(DecodeError::Decompression {
            decoder: "Parquet".to_string(),
            initial: "bad magic".to_string(),
            source: DecompressionError::Empty,
        });
        assert_eq!(err.kind(), ErrorKind::Decompression);
        assert!(err.to_string().contains("bad magic"));
        assert!(err.to_string().contains("Nothing to decompress"));
    }

    #[test]
    fn test_retry_failure_is_decode_kind() {
        let err = IngestError::from(DecodeError::Retry {
            decoder: "Parquet".to_string(),
            initial: "bad magic".to_string(),
            source: "still bad".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_fetch_not_found_user_message() {
        let err = IngestError::from(FetchError::NotFound {
            locator: "/tmp/missing.parquet".to_string(),
        });
        assert_eq!(err.user_message(), "Nothing found at /tmp/missing.parquet");
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn test_config_error_has_no_suggestion() {
        let err = IngestError::from(ConfigError::InvalidOption {
            option: "batch_size".to_string(),
            message: "must be positive".to_string(),
        });
        assert_eq!(err.to_string(), "Invalid batch_size option: must be positive");
        assert!(err.recovery_suggestion().is_none());
    }
}
