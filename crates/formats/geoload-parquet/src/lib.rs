//! Apache Parquet support for `geoload`.
//!
//! Decodes an in-memory Parquet file into [`Row`](geoload_core_common::Row)s,
//! reporting the Arrow schema and the `GeoParquet` primary geometry column.

pub mod convert;
pub mod datatype;
pub mod decoder;
pub mod error;
pub mod metadata;

pub use datatype::ArrowDataTypeExt;
pub use decoder::ParquetDecoder;
pub use error::{ParquetReadError, ParquetReadResult};
pub use metadata::GeoMetadata;
