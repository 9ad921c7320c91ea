//! Columnar decode with a decompression fallback.
//!
//! Bytes are decoded as-is first. Only when that fails are they decompressed
//! and decoded a second time; there is no third attempt.

use bytes::Bytes;
use geoload_core_common::{ColumnarDecoder, DecodeOptions, DecoderOutput, Row, Schema};
use log::{info, warn};

use crate::codec::{CodecHandle, decompress};
use crate::error::DecodeError;

/// Uniform decode result, whatever layout the decoder produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRows {
    pub rows: Vec<Row>,
    pub schema: Option<Schema>,
    /// Whether the rows came from the decompression fallback.
    pub decompressed: bool,
}

impl DecodedRows {
    /// Normalizes decoder output into rows plus an optional schema.
    #[must_use]
    pub fn from_output(output: DecoderOutput, decompressed: bool) -> Self {
        let (rows, schema) = match output {
            DecoderOutput::Rows(rows) => (rows, None),
            DecoderOutput::Table { data, schema } => (data, schema),
        };
        Self {
            rows,
            schema,
            decompressed,
        }
    }
}

/// Decodes `buffer`, retrying once on its decompressed form.
///
/// # Errors
///
/// Returns [`DecodeError::Decompression`] when the fallback could not
/// decompress the buffer, or [`DecodeError::Retry`] when the decompressed bytes
/// failed to decode as well.
pub async fn decode_rows(
    decoder: &dyn ColumnarDecoder,
    codec: &CodecHandle,
    buffer: Bytes,
    options: &DecodeOptions,
) -> Result<DecodedRows, DecodeError> {
    let initial = match decoder.decode(buffer.clone(), options).await {
        Ok(output) => return Ok(DecodedRows::from_output(output, false)),
        Err(e) => e.to_string(),
    };

    warn!(
        "Direct {} decode failed ({initial}); trying decompression",
        decoder.name()
    );

    let decompressed = decompress(codec, &buffer)
        .await
        .map_err(|source| DecodeError::Decompression {
            decoder: decoder.name().to_string(),
            initial: initial.clone(),
            source,
        })?;
    info!(
        "Decompressed {} bytes into {} bytes",
        buffer.len(),
        decompressed.len()
    );

    let output = decoder
        .decode(Bytes::from(decompressed), options)
        .await
        .map_err(|e| DecodeError::Retry {
            decoder: decoder.name().to_string(),
            initial,
            source: e.into(),
        })?;

    Ok(DecodedRows::from_output(output, true))
}
