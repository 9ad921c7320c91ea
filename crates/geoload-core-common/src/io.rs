//! I/O traits for fetching and decoding columnar geospatial data.
//!
//! This module defines the collaborator traits the ingestion pipeline drives:
//! a [`ByteSource`] that retrieves raw file bytes and a [`ColumnarDecoder`] that
//! turns those bytes into rows.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::schema::Schema;
use crate::values::Row;

/// Output layout requested from a columnar decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputShape {
    /// A plain sequence of rows without schema information.
    Rows,
    /// Rows together with the file schema.
    #[default]
    Table,
}

/// Options forwarded unchanged to the columnar decoder.
///
/// The ingestion pipeline never inspects these; only decoder implementations do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Output layout to produce.
    pub shape: OutputShape,
    /// Restrict decoding to these columns (all columns when `None`).
    pub columns: Option<Vec<String>>,
    /// Target number of rows decoded per batch.
    pub batch_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            shape: OutputShape::default(),
            columns: None,
            batch_size: 8192,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shape(mut self, shape: OutputShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Option<Vec<String>>) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Raw decoder output; its layout depends on the decode options.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderOutput {
    /// Rows only.
    Rows(Vec<Row>),
    /// Rows plus the schema the decoder observed.
    Table {
        /// Decoded records
        data: Vec<Row>,
        /// Field descriptors, when the decoder could report them
        schema: Option<Schema>,
    },
}

/// Trait for retrieving the raw bytes behind a locator.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Fetches the complete contents of `locator`.
    ///
    /// # Arguments
    ///
    /// * `locator` - A local path or URL
    ///
    /// # Returns
    ///
    /// The file contents as an immutable byte buffer
    async fn fetch(&self, locator: &str) -> Result<Bytes>;
}

/// Trait for decoding a columnar file held in memory.
///
/// Implementations accept the whole file as a byte buffer and either return
/// its records or fail; they never partially succeed.
#[async_trait]
pub trait ColumnarDecoder: Send + Sync {
    /// Short format name used in log and error messages (e.g., `"Parquet"`).
    fn name(&self) -> &'static str;

    /// Decodes `bytes` into rows.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The complete file contents
    /// * `options` - Decoder options passed through by the caller
    async fn decode(&self, bytes: Bytes, options: &DecodeOptions) -> Result<DecoderOutput>;
}
