//! [`ColumnarDecoder`] implementation for Apache Parquet.

use anyhow::Result;
use arrow_array::RecordBatchReader;
use async_trait::async_trait;
use bytes::Bytes;
use geoload_core_common::{
    ColumnarDecoder, DecodeOptions, DecoderOutput, FieldInfo, OutputShape, Row, Schema,
};
use log::{debug, warn};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::convert::batch_to_rows;
use crate::datatype::ArrowDataTypeExt;
use crate::error::{ParquetReadError, ParquetReadResult};
use crate::metadata::GeoMetadata;

/// Decodes whole Parquet files held in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetDecoder;

impl ParquetDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reads every record of `bytes`, returning rows and the observed schema.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is not a Parquet file or a batch cannot be read.
    pub fn read(
        &self,
        bytes: Bytes,
        options: &DecodeOptions,
    ) -> ParquetReadResult<(Vec<Row>, Schema)> {
        let mut builder =
            ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(ParquetReadError::Open)?;

        let key_values = builder.metadata().file_metadata().key_value_metadata();
        let geo = match GeoMetadata::from_key_values(key_values) {
            Ok(geo) => geo,
            Err(e) => {
                warn!("Ignoring GeoParquet metadata: {e}");
                None
            },
        };
        if let Some(geo) = &geo {
            debug!(
                "GeoParquet metadata version {}",
                geo.version.as_deref().unwrap_or("unknown")
            );
            for column in geo.non_wkb_columns() {
                warn!(
                    "GeoParquet column '{}' uses {} encoding; only WKB values are decoded",
                    column.name,
                    column.encoding.as_deref().unwrap_or_default()
                );
            }
        }

        if let Some(columns) = &options.columns {
            let arrow_schema = builder.schema();
            let mut indices = Vec::with_capacity(columns.len());
            for name in columns {
                match arrow_schema.index_of(name) {
                    Ok(idx) => indices.push(idx),
                    Err(_) => warn!("Projected column '{name}' not found in Parquet schema"),
                }
            }
            let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
            builder = builder.with_projection(mask);
        }

        if options.batch_size > 0 {
            builder = builder.with_batch_size(options.batch_size);
        }

        let reader = builder.build().map_err(ParquetReadError::Open)?;
        let arrow_schema = reader.schema();

        let mut rows = Vec::new();
        for (batch_idx, batch) in reader.enumerate() {
            let batch = batch.map_err(|source| ParquetReadError::Batch {
                batch: batch_idx,
                source,
            })?;
            rows.extend(batch_to_rows(&batch)?);
        }

        let fields = arrow_schema
            .fields()
            .iter()
            .map(|f| FieldInfo::new(f.name().clone(), f.data_type().label(), f.is_nullable()))
            .collect();
        let schema = Schema::new(fields).with_primary_geometry(geo.and_then(|g| g.primary_column));

        debug!(
            "Decoded {} Parquet row(s) with {} column(s)",
            rows.len(),
            schema.fields.len()
        );
        Ok((rows, schema))
    }
}

#[async_trait]
impl ColumnarDecoder for ParquetDecoder {
    fn name(&self) -> &'static str {
        "Parquet"
    }

    async fn decode(&self, bytes: Bytes, options: &DecodeOptions) -> Result<DecoderOutput> {
        let decoder = *self;
        let read_options = options.clone();
        let (rows, schema) =
            tokio::task::spawn_blocking(move || decoder.read(bytes, &read_options)).await??;
        Ok(match options.shape {
            OutputShape::Rows => DecoderOutput::Rows(rows),
            OutputShape::Table => DecoderOutput::Table {
                data: rows,
                schema: Some(schema),
            },
        })
    }
}
