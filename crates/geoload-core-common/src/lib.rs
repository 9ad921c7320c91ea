//! Common types and traits shared across `geoload` crates.
//!
//! This crate provides the row model and the collaborator traits that are shared
//! between `geoload-core` and format implementation crates, preventing circular
//! dependencies.

pub mod io;
pub mod schema;
pub mod values;

// Re-export commonly used types
pub use io::{ByteSource, ColumnarDecoder, DecodeOptions, DecoderOutput, OutputShape};
pub use schema::{FieldInfo, Schema};
pub use values::{FieldValue, GeometryValue, JsonObject, JsonValue, Row};
