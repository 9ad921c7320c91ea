//! `geoload-core` turns a columnar geospatial file into a `GeoJSON` feature collection.
//!
//! The pipeline runs in four stages:
//! - **Fetch**: retrieve the raw bytes for a locator ([`fetch`]).
//! - **Decode**: decode the bytes, falling back to zstd/gzip decompression when the
//!   first attempt fails ([`columnar`], [`codec`]).
//! - **Resolve**: decide which field carries geometry ([`resolver`]).
//! - **Assemble**: decode each row's geometry and build features ([`geometry`], [`assemble`]).
//!
//! [`pipeline::IngestContext`] ties the stages together and owns the codec state.

pub mod assemble;
pub mod codec;
pub mod columnar;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod pipeline;
pub mod resolver;
pub mod types;

pub use error::{ErrorKind, IngestError, Result};
pub use geoload_core_common::{DecodeOptions, OutputShape};
pub use pipeline::{IngestCallbacks, IngestContext, IngestOptions, LoadState, RunOutcome};
pub use types::CollectionSummary;
