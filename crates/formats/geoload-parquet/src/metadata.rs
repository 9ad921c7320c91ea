//! `GeoParquet` file metadata (`geo` key-value entry).

use parquet::file::metadata::KeyValue;
use serde_json::Value;

use crate::error::{ParquetReadError, ParquetReadResult};

/// Key under which `GeoParquet` stores its metadata document.
pub const GEO_METADATA_KEY: &str = "geo";

/// Geometry column declared in `GeoParquet` metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoColumn {
    /// Column name
    pub name: String,
    /// Declared encoding (e.g., `"WKB"`), if present
    pub encoding: Option<String>,
}

/// Subset of the `GeoParquet` metadata document used for geometry discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoMetadata {
    /// Specification version string
    pub version: Option<String>,
    /// Name of the primary geometry column
    pub primary_column: Option<String>,
    /// Declared geometry columns, in document order
    pub columns: Vec<GeoColumn>,
}

impl GeoMetadata {
    /// Parses the JSON document stored under the `geo` key.
    ///
    /// # Errors
    ///
    /// Returns [`ParquetReadError::Metadata`] when the document is not valid JSON.
    pub fn parse(document: &str) -> ParquetReadResult<Self> {
        let value: Value = serde_json::from_str(document).map_err(ParquetReadError::Metadata)?;

        let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

        let columns = value
            .get("columns")
            .and_then(Value::as_object)
            .map(|columns| {
                columns
                    .iter()
                    .map(|(name, spec)| GeoColumn {
                        name: name.clone(),
                        encoding: text(spec, "encoding"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            version: text(&value, "version"),
            primary_column: text(&value, "primary_column"),
            columns,
        })
    }

    /// Finds and parses the `geo` entry among file key-value metadata.
    ///
    /// Returns `Ok(None)` when the file carries no `geo` entry.
    ///
    /// # Errors
    ///
    /// Returns [`ParquetReadError::Metadata`] when the entry is malformed.
    pub fn from_key_values(entries: Option<&Vec<KeyValue>>) -> ParquetReadResult<Option<Self>> {
        let document = entries.and_then(|entries| {
            entries
                .iter()
                .find(|kv| kv.key == GEO_METADATA_KEY)
                .and_then(|kv| kv.value.as_deref())
        });

        document.map(Self::parse).transpose()
    }

    /// Declared columns whose encoding is something other than WKB.
    ///
    /// Columns without an `encoding` entry are assumed to be WKB.
    pub fn non_wkb_columns(&self) -> impl Iterator<Item = &GeoColumn> {
        self.columns.iter().filter(|column| {
            column
                .encoding
                .as_deref()
                .is_some_and(|encoding| !encoding.eq_ignore_ascii_case("WKB"))
        })
    }
}
