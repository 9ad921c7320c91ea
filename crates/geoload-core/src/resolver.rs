//! Geometry column discovery.
//!
//! Decides which field of a decoded file carries geometry. Geometry columns are
//! looked for before latitude/longitude pairs:
//!
//! 1. the primary column declared by `GeoParquet` metadata,
//! 2. the first conventional geometry column name, in [`GEOMETRY_COLUMN_NAMES`] order,
//! 3. a latitude field together with a longitude field.
//!
//! Without a schema, the keys of the first row are inspected instead.

use geoload_core_common::{Row, Schema};
use log::{debug, info};

use crate::error::IngestError;
use crate::geometry::{LATITUDE_NAMES, LONGITUDE_NAMES};

/// Conventional geometry column names, in priority order.
///
/// Files may define several of these; the earliest entry wins.
pub const GEOMETRY_COLUMN_NAMES: &[&str] = &[
    "geometry",
    "geom",
    "the_geom",
    "wkb_geometry",
    "geography",
    "shape",
];

/// Where a row's geometry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    /// A single column holding encoded geometry.
    Column(String),
    /// A point synthesized from two scalar columns.
    LatLon {
        /// Latitude field name
        latitude: String,
        /// Longitude field name
        longitude: String,
    },
}

impl GeometrySource {
    /// Name of the geometry column, if geometry comes from one.
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            GeometrySource::Column(name) => Some(name),
            GeometrySource::LatLon { .. } => None,
        }
    }
}

/// Resolves the geometry source for a decoded file.
///
/// `preferred` names a column chosen by the caller; it wins when present.
///
/// # Errors
///
/// Returns [`IngestError::NoGeometry`] when neither a geometry column nor a
/// latitude/longitude pair exists.
pub fn resolve_geometry_source(
    schema: Option<&Schema>,
    rows: &[Row],
    preferred: Option<&str>,
) -> Result<GeometrySource, IngestError> {
    let fields: Vec<&str> = match schema {
        Some(schema) => schema.field_names().collect(),
        None => {
            debug!("No schema reported; inspecting the first row");
            rows.first().map(|row| row.keys().collect()).unwrap_or_default()
        },
    };

    let declared = schema.and_then(|s| s.primary_geometry.as_deref());
    let source = preferred
        .and_then(|name| exact_field(&fields, name))
        .or_else(|| declared.and_then(|name| exact_field(&fields, name)))
        .or_else(|| first_match(&fields, GEOMETRY_COLUMN_NAMES))
        .map(|name| GeometrySource::Column(name.to_string()))
        .or_else(|| {
            let latitude = first_match(&fields, LATITUDE_NAMES)?;
            let longitude = first_match(&fields, LONGITUDE_NAMES)?;
            Some(GeometrySource::LatLon {
                latitude: latitude.to_string(),
                longitude: longitude.to_string(),
            })
        });

    match source {
        Some(source) => {
            info!("Geometry source: {source:?}");
            Ok(source)
        },
        None => Err(IngestError::NoGeometry {
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }),
    }
}

fn exact_field<'a>(fields: &[&'a str], name: &str) -> Option<&'a str> {
    fields.iter().copied().find(|field| *field == name)
}

/// First field matching a candidate, scanning candidates in priority order.
fn first_match<'a>(fields: &[&'a str], candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| {
        fields
            .iter()
            .copied()
            .find(|field| field.eq_ignore_ascii_case(candidate))
    })
}
