//! Extension helpers for Arrow [`DataType`]s seen in Parquet files.

use arrow_schema::DataType;

/// Extension trait for classifying and labelling Arrow [`DataType`]s.
///
/// # Examples
///
/// ```
/// use arrow_schema::DataType;
/// use geoload_parquet::ArrowDataTypeExt;
///
/// assert_eq!(DataType::Utf8.label(), "String");
/// assert_eq!(DataType::LargeBinary.label(), "LargeBinary");
/// assert!(!DataType::Int32.is_nested());
/// ```
pub trait ArrowDataTypeExt {
    /// Human-readable type label stored in [`FieldInfo`](geoload_core_common::FieldInfo).
    fn label(&self) -> String;

    /// Returns `true` for types decoded as nested JSON values.
    fn is_nested(&self) -> bool;
}

impl ArrowDataTypeExt for DataType {
    fn label(&self) -> String {
        match self {
            DataType::Utf8 => "String".to_string(),
            DataType::LargeUtf8 => "LargeString".to_string(),
            DataType::Utf8View => "StringView".to_string(),
            DataType::BinaryView => "BinaryView".to_string(),
            DataType::FixedSizeBinary(size) => format!("FixedSizeBinary({size})"),
            DataType::Decimal128(p, s) | DataType::Decimal256(p, s) => {
                format!("Decimal({p}, {s})")
            },
            DataType::Timestamp(unit, tz) => {
                let tz_str = tz.as_ref().map_or("", |t| t.as_ref());
                format!("Timestamp({unit:?}, {tz_str})")
            },
            DataType::List(_) | DataType::ListView(_) => "List".to_string(),
            DataType::LargeList(_) | DataType::LargeListView(_) => "LargeList".to_string(),
            DataType::FixedSizeList(_, size) => format!("FixedSizeList({size})"),
            DataType::Struct(_) => "Struct".to_string(),
            DataType::Map(_, _) => "Map".to_string(),
            DataType::Dictionary(_, value) => value.label(),
            _ => format!("{self:?}"),
        }
    }

    fn is_nested(&self) -> bool {
        matches!(
            self,
            DataType::List(_)
                | DataType::ListView(_)
                | DataType::LargeList(_)
                | DataType::LargeListView(_)
                | DataType::FixedSizeList(_, _)
                | DataType::Struct(_)
                | DataType::Map(_, _)
        )
    }
}
