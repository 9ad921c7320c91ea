use std::sync::Arc;

use anyhow::Result;
use arrow_array::{BinaryArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema as ArrowSchema};
use bytes::Bytes;
use geoload_core_common::{ColumnarDecoder, DecodeOptions, DecoderOutput, FieldValue, OutputShape};
use geoload_parquet::ParquetDecoder;
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;

/// Little-endian WKB for a 2D point.
fn wkb_point(x: f64, y: f64) -> Vec<u8> {
    let mut out = vec![1_u8, 1, 0, 0, 0];
    out.extend_from_slice(&x.to_le_bytes());
    out.extend_from_slice(&y.to_le_bytes());
    out
}

fn sample_batch() -> RecordBatch {
    let schema = Arc::new(ArrowSchema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
        Field::new("geom", DataType::Binary, true),
    ]));
    let a = wkb_point(1.0, 2.0);
    let b = wkb_point(3.0, 4.0);
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])),
            Arc::new(Float64Array::from(vec![0.5, 1.5, 2.5])),
            Arc::new(BinaryArray::from(vec![Some(a.as_slice()), Some(b.as_slice()), None])),
        ],
    )
    .unwrap()
}

fn write_parquet(batch: &RecordBatch, geo: Option<&str>) -> Bytes {
    let props = WriterProperties::builder()
        .set_key_value_metadata(
            geo.map(|doc| vec![KeyValue::new("geo".to_string(), doc.to_string())]),
        )
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props)).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
    Bytes::from(buffer)
}

#[tokio::test]
async fn test_decode_table_shape_reports_schema() -> Result<()> {
    let bytes = write_parquet(&sample_batch(), None);
    let output = ParquetDecoder::new()
        .decode(bytes, &DecodeOptions::default())
        .await?;

    let DecoderOutput::Table { data, schema } = output else {
        panic!("expected table output");
    };
    let schema = schema.expect("schema");
    assert_eq!(
        schema.field_names().collect::<Vec<_>>(),
        vec!["id", "name", "score", "geom"]
    );
    assert_eq!(schema.fields[1].data_type, "String");
    assert_eq!(schema.primary_geometry, None);

    assert_eq!(data.len(), 3);
    assert_eq!(data[0].get("id"), Some(&FieldValue::Int(1)));
    assert_eq!(data[1].get("geom"), Some(&FieldValue::Binary(wkb_point(3.0, 4.0))));
    assert_eq!(data[2].get("name"), Some(&FieldValue::Null));
    Ok(())
}

#[tokio::test]
async fn test_decode_rows_shape() -> Result<()> {
    let bytes = write_parquet(&sample_batch(), None);
    let options = DecodeOptions::default().with_shape(OutputShape::Rows);
    let output = ParquetDecoder::new().decode(bytes, &options).await?;

    let DecoderOutput::Rows(rows) = output else {
        panic!("expected rows output");
    };
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get("score"), Some(&FieldValue::Float(2.5)));
    Ok(())
}

#[tokio::test]
async fn test_decode_reads_geoparquet_primary_column() -> Result<()> {
    let geo = r#"{"version":"1.0.0","primary_column":"geom","columns":{"geom":{"encoding":"WKB"}}}"#;
    let bytes = write_parquet(&sample_batch(), Some(geo));
    let output = ParquetDecoder::new()
        .decode(bytes, &DecodeOptions::default())
        .await?;

    let DecoderOutput::Table { schema, .. } = output else {
        panic!("expected table output");
    };
    assert_eq!(schema.unwrap().primary_geometry.as_deref(), Some("geom"));
    Ok(())
}

#[tokio::test]
async fn test_decode_ignores_malformed_geo_metadata() -> Result<()> {
    let bytes = write_parquet(&sample_batch(), Some("{not json"));
    let output = ParquetDecoder::new()
        .decode(bytes, &DecodeOptions::default())
        .await?;

    let DecoderOutput::Table { data, schema } = output else {
        panic!("expected table output");
    };
    assert_eq!(data.len(), 3);
    assert_eq!(schema.unwrap().primary_geometry, None);
    Ok(())
}

#[tokio::test]
async fn test_decode_with_projection_and_batch_size() -> Result<()> {
    let bytes = write_parquet(&sample_batch(), None);
    let options = DecodeOptions::default()
        .with_columns(Some(vec!["geom".to_string(), "missing".to_string()]))
        .with_batch_size(1);
    let output = ParquetDecoder::new().decode(bytes, &options).await?;

    let DecoderOutput::Table { data, schema } = output else {
        panic!("expected table output");
    };
    assert_eq!(schema.unwrap().field_names().collect::<Vec<_>>(), vec!["geom"]);
    assert_eq!(data.len(), 3);
    assert_eq!(data[0].keys().collect::<Vec<_>>(), vec!["geom"]);
    Ok(())
}

#[tokio::test]
async fn test_decode_rejects_non_parquet_bytes() {
    let result = ParquetDecoder::new()
        .decode(Bytes::from_static(b"definitely not parquet"), &DecodeOptions::default())
        .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to open Parquet file"));
}

#[tokio::test]
async fn test_decode_keeps_rows_with_non_wkb_geo_columns() -> Result<()> {
    let geo = r#"{"version":"1.1.0","primary_column":"geom","columns":{"geom":{"encoding":"point"}}}"#;
    let bytes = write_parquet(&sample_batch(), Some(geo));
    let output = ParquetDecoder::new()
        .decode(bytes, &DecodeOptions::default())
        .await?;

    let DecoderOutput::Table { data, schema } = output else {
        panic!("expected table output");
    };
    assert_eq!(data.len(), 3);
    assert_eq!(schema.unwrap().primary_geometry.as_deref(), Some("geom"));
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn test_concurrent_decodes_on_single_threaded_runtime() -> Result<()> {
    let bytes = write_parquet(&sample_batch(), None);
    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let bytes = bytes.clone();
            tokio::spawn(async move {
                let options = DecodeOptions::default().with_shape(OutputShape::Rows);
                ParquetDecoder::new().decode(bytes, &options).await
            })
        })
        .collect();

    for task in tasks {
        let DecoderOutput::Rows(rows) = task.await?? else {
            panic!("expected row output");
        };
        assert_eq!(rows.len(), 3);
    }
    Ok(())
}

#[tokio::test]
async fn test_decode_gzip_compressed_column_chunks() -> Result<()> {
    let batch = sample_batch();
    let props = WriterProperties::builder()
        .set_compression(Compression::GZIP(GzipLevel::default()))
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    let options = DecodeOptions::default().with_shape(OutputShape::Rows);
    let output = ParquetDecoder::new()
        .decode(Bytes::from(buffer), &options)
        .await?;
    let DecoderOutput::Rows(rows) = output else {
        panic!("expected row output");
    };
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].get("name"), Some(&FieldValue::Text("b".to_string())));
    Ok(())
}
