//! Conversion of Arrow record batches into [`Row`]s.
//!
//! Scalar columns are downcast directly. Nested columns (struct, list, map) go
//! through `arrow-json` so they surface as structured JSON values, and anything
//! else falls back to Arrow's display formatting.

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type, UInt16Type,
    UInt32Type, UInt64Type,
};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{DataType, Field, Schema as ArrowSchema};
use geoload_core_common::{FieldValue, JsonObject, JsonValue, Row};

use crate::datatype::ArrowDataTypeExt;
use crate::error::{ParquetReadError, ParquetReadResult};

/// Converts every record of `batch` into a [`Row`], preserving column order.
///
/// # Errors
///
/// Returns [`ParquetReadError::Convert`] if a column cannot be materialized.
pub fn batch_to_rows(batch: &RecordBatch) -> ParquetReadResult<Vec<Row>> {
    let schema = batch.schema();
    let columns = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| column_values(field, array))
        .collect::<ParquetReadResult<Vec<_>>>()?;

    let mut rows: Vec<Row> = (0..batch.num_rows())
        .map(|_| Row::with_capacity(columns.len()))
        .collect();

    for (field, values) in schema.fields().iter().zip(columns) {
        for (row, value) in rows.iter_mut().zip(values) {
            row.insert(field.name().clone(), value);
        }
    }

    Ok(rows)
}

/// Materializes one column into per-row values.
fn column_values(field: &Field, array: &ArrayRef) -> ParquetReadResult<Vec<FieldValue>> {
    if array.data_type().is_nested() {
        return nested_values(field, array);
    }

    let len = array.len();
    let values = match array.data_type() {
        DataType::Null => vec![FieldValue::Null; len],
        DataType::Boolean => {
            let a = array.as_boolean();
            collect(len, array, |i| FieldValue::Bool(a.value(i)))
        },
        DataType::Int8 => {
            let a = array.as_primitive::<Int8Type>();
            collect(len, array, |i| FieldValue::Int(i64::from(a.value(i))))
        },
        DataType::Int16 => {
            let a = array.as_primitive::<Int16Type>();
            collect(len, array, |i| FieldValue::Int(i64::from(a.value(i))))
        },
        DataType::Int32 => {
            let a = array.as_primitive::<Int32Type>();
            collect(len, array, |i| FieldValue::Int(i64::from(a.value(i))))
        },
        DataType::Int64 => {
            let a = array.as_primitive::<Int64Type>();
            collect(len, array, |i| FieldValue::Int(a.value(i)))
        },
        DataType::UInt8 => {
            let a = array.as_primitive::<UInt8Type>();
            collect(len, array, |i| FieldValue::Int(i64::from(a.value(i))))
        },
        DataType::UInt16 => {
            let a = array.as_primitive::<UInt16Type>();
            collect(len, array, |i| FieldValue::Int(i64::from(a.value(i))))
        },
        DataType::UInt32 => {
            let a = array.as_primitive::<UInt32Type>();
            collect(len, array, |i| FieldValue::Int(i64::from(a.value(i))))
        },
        DataType::UInt64 => {
            let a = array.as_primitive::<UInt64Type>();
            collect(len, array, |i| {
                let v = a.value(i);
                i64::try_from(v).map_or(FieldValue::UInt(v), FieldValue::Int)
            })
        },
        DataType::Float32 => {
            let a = array.as_primitive::<Float32Type>();
            collect(len, array, |i| FieldValue::Float(f64::from(a.value(i))))
        },
        DataType::Float64 => {
            let a = array.as_primitive::<Float64Type>();
            collect(len, array, |i| FieldValue::Float(a.value(i)))
        },
        DataType::Utf8 => {
            let a = array.as_string::<i32>();
            collect(len, array, |i| FieldValue::Text(a.value(i).to_string()))
        },
        DataType::LargeUtf8 => {
            let a = array.as_string::<i64>();
            collect(len, array, |i| FieldValue::Text(a.value(i).to_string()))
        },
        DataType::Utf8View => {
            let a = array.as_string_view();
            collect(len, array, |i| FieldValue::Text(a.value(i).to_string()))
        },
        DataType::Binary => {
            let a = array.as_binary::<i32>();
            collect(len, array, |i| FieldValue::Binary(a.value(i).to_vec()))
        },
        DataType::LargeBinary => {
            let a = array.as_binary::<i64>();
            collect(len, array, |i| FieldValue::Binary(a.value(i).to_vec()))
        },
        DataType::BinaryView => {
            let a = array.as_binary_view();
            collect(len, array, |i| FieldValue::Binary(a.value(i).to_vec()))
        },
        DataType::FixedSizeBinary(_) => {
            let a = array.as_fixed_size_binary();
            collect(len, array, |i| FieldValue::Binary(a.value(i).to_vec()))
        },
        _ => formatted_values(field, array)?,
    };

    Ok(values)
}

fn collect(len: usize, array: &ArrayRef, value: impl Fn(usize) -> FieldValue) -> Vec<FieldValue> {
    (0..len)
        .map(|i| {
            if array.is_null(i) {
                FieldValue::Null
            } else {
                value(i)
            }
        })
        .collect()
}

/// Renders values with Arrow's display formatter (dates, decimals, dictionaries, ...).
fn formatted_values(field: &Field, array: &ArrayRef) -> ParquetReadResult<Vec<FieldValue>> {
    let options = FormatOptions::default();
    let formatter =
        ArrayFormatter::try_new(array.as_ref(), &options).map_err(|e| ParquetReadError::Convert {
            column: field.name().clone(),
            message: e.to_string(),
        })?;

    Ok(collect(array.len(), array, |i| {
        FieldValue::Text(formatter.value(i).to_string())
    }))
}

/// Encodes a nested column as JSON, one value per row.
fn nested_values(field: &Field, array: &ArrayRef) -> ParquetReadResult<Vec<FieldValue>> {
    let convert_err = |message: String| ParquetReadError::Convert {
        column: field.name().clone(),
        message,
    };

    let schema = Arc::new(ArrowSchema::new(vec![field.clone()]));
    let batch = RecordBatch::try_new(schema, vec![Arc::clone(array)])
        .map_err(|e| convert_err(e.to_string()))?;

    let mut writer = arrow_json::ArrayWriter::new(Vec::new());
    writer
        .write(&batch)
        .map_err(|e| convert_err(e.to_string()))?;
    writer.finish().map_err(|e| convert_err(e.to_string()))?;
    let buffer = writer.into_inner();

    // An empty batch produces no output at all.
    if buffer.is_empty() {
        return Ok(Vec::new());
    }

    let objects: Vec<JsonObject> =
        serde_json::from_slice(&buffer).map_err(|e| convert_err(e.to_string()))?;

    Ok(objects
        .into_iter()
        .map(|mut object| match object.remove(field.name()) {
            None | Some(JsonValue::Null) => FieldValue::Null,
            Some(value) => FieldValue::Json(value),
        })
        .collect())
}
