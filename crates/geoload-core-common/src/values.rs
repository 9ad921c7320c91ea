//! Row and value model produced by columnar decoders.
//!
//! Every decoded record is a [`Row`]: an ordered list of named [`FieldValue`]s.
//! The geometry column of a row is inspected through [`GeometryValue`], a
//! borrowed view that narrows a field down to the shapes a geometry can arrive in.

use std::fmt;

pub use serde_json::Map as JsonMap;
pub use serde_json::Value as JsonValue;

/// JSON object type used for structured values and feature properties.
pub type JsonObject = JsonMap<String, JsonValue>;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value that does not fit into `i64`.
    UInt(u64),
    /// Floating-point value.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes (for example WKB geometry or opaque blobs).
    Binary(Vec<u8>),
    /// Nested value (struct, list or map columns).
    Json(JsonValue),
}

impl FieldValue {
    /// Returns `true` for [`FieldValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Interprets the value as a floating-point number.
    ///
    /// Numeric variants convert directly; text is trimmed and parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::UInt(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
            FieldValue::Json(JsonValue::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Converts the value into a JSON property value.
    ///
    /// Binary payloads are decoded as UTF-8 text (invalid sequences are replaced)
    /// so raw bytes never reach the properties of a feature. Non-finite floats
    /// have no JSON representation and become `null`.
    #[must_use]
    pub fn to_property(&self) -> JsonValue {
        match self {
            FieldValue::Null => JsonValue::Null,
            FieldValue::Bool(v) => JsonValue::Bool(*v),
            FieldValue::Int(v) => JsonValue::from(*v),
            FieldValue::UInt(v) => JsonValue::from(*v),
            FieldValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            FieldValue::Text(v) => JsonValue::String(v.clone()),
            FieldValue::Binary(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
            FieldValue::Json(v) => v.clone(),
        }
    }

    /// Short label describing the value kind, used in log messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) | FieldValue::UInt(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Binary(_) => "binary",
            FieldValue::Json(_) => "json",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(value)
    }
}

impl From<JsonValue> for FieldValue {
    fn from(value: JsonValue) -> Self {
        FieldValue::Json(value)
    }
}

/// The shapes a raw geometry cell can take.
///
/// Which one applies is only known once the cell is inspected; decoders walk
/// these variants in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryValue<'a> {
    /// Binary-encoded geometry (WKB).
    Binary(&'a [u8]),
    /// Text that may hold a `GeoJSON` geometry.
    Text(&'a str),
    /// An already structured geometry object.
    Structured(&'a JsonObject),
    /// No geometry value present.
    Absent,
}

impl<'a> GeometryValue<'a> {
    /// Narrows an optional field to its geometry shape.
    ///
    /// Scalars that cannot carry geometry (numbers, booleans, arrays) are
    /// treated as [`GeometryValue::Absent`].
    #[must_use]
    pub fn from_field(value: Option<&'a FieldValue>) -> Self {
        match value {
            Some(FieldValue::Binary(bytes)) => GeometryValue::Binary(bytes),
            Some(FieldValue::Text(text)) => GeometryValue::Text(text),
            Some(FieldValue::Json(JsonValue::Object(object))) => GeometryValue::Structured(object),
            Some(FieldValue::Json(JsonValue::String(text))) => GeometryValue::Text(text),
            _ => GeometryValue::Absent,
        }
    }
}

/// One decoded record, with fields kept in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Appends a field, replacing any existing field with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Builder-style variant of [`Row::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Looks a field up ignoring ASCII case, returning the stored name.
    #[must_use]
    pub fn get_ignore_case(&self, name: &str) -> Option<(&str, &FieldValue)> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{key}: {}", value.kind()))
            .collect();
        write!(f, "Row({})", kinds.join(", "))
    }
}
