//! Schema information reported by columnar decoders.

/// Information about a field/column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Human-readable data type label
    pub data_type: String,
    /// Whether the field is nullable
    pub nullable: bool,
}

impl FieldInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// Ordered field descriptors of a decoded file.
///
/// Only used to discover the geometry source; it is not retained once features
/// have been assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Fields in column order
    pub fields: Vec<FieldInfo>,
    /// Primary geometry column declared by file metadata (`GeoParquet` `geo` key)
    pub primary_geometry: Option<String>,
}

impl Schema {
    #[must_use]
    pub fn new(fields: Vec<FieldInfo>) -> Self {
        Self {
            fields,
            primary_geometry: None,
        }
    }

    #[must_use]
    pub fn with_primary_geometry(mut self, column: Option<String>) -> Self {
        self.primary_geometry = column;
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
