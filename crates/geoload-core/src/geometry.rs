//! Per-row geometry decoding.
//!
//! A raw geometry cell is tried against an ordered chain of interpretations,
//! from the most explicit to the least:
//!
//! 1. binary WKB (EWKB accepted as well),
//! 2. `GeoJSON` text, skipped when the text is purely hexadecimal,
//! 3. an already structured `GeoJSON` geometry object,
//! 4. a point built from the row's latitude/longitude fields.
//!
//! The order decides which representation wins when a cell satisfies more
//! than one step. Failures never escape: [`decode_geometry`] yields `None`, and
//! [`try_decode_geometry`] reports the last [`GeometryIssue`] for diagnostics.

use std::fmt;

use geoload_core_common::{GeometryValue, JsonObject, JsonValue, Row};
use geojson::{Geometry, Value};
use geozero::ToGeo;
use geozero::wkb::{Ewkb, Wkb};
use log::debug;

/// Field names recognised as latitude, in priority order.
pub const LATITUDE_NAMES: &[&str] = &["latitude", "lat"];

/// Field names recognised as longitude, in priority order.
pub const LONGITUDE_NAMES: &[&str] = &["longitude", "lon", "lng", "long"];

/// Why a step of the decoding chain produced nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryIssue {
    /// The binary payload is not valid WKB/EWKB.
    InvalidWkb(String),
    /// The text is purely hexadecimal and was not parsed as JSON.
    HexText,
    /// The text is not valid JSON.
    InvalidJson(String),
    /// The value lacks a `type` tag or a `coordinates` member.
    MissingTypeOrCoordinates,
    /// The geometry could not be interpreted as `GeoJSON`.
    InvalidGeoJson(String),
    /// The geometry has no coordinates, or non-finite ones.
    EmptyCoordinates,
    /// No geometry value and no usable latitude/longitude fields.
    NoSource,
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWkb(e) => write!(f, "invalid WKB: {e}"),
            Self::HexText => f.write_str("hexadecimal text is not GeoJSON"),
            Self::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            Self::MissingTypeOrCoordinates => f.write_str("missing type or coordinates"),
            Self::InvalidGeoJson(e) => write!(f, "invalid GeoJSON geometry: {e}"),
            Self::EmptyCoordinates => f.write_str("empty or non-finite coordinates"),
            Self::NoSource => f.write_str("no geometry value and no latitude/longitude"),
        }
    }
}

/// Decodes one row's geometry, returning `None` when every step fails.
#[must_use]
pub fn decode_geometry(raw: GeometryValue<'_>, row: &Row) -> Option<Geometry> {
    match try_decode_geometry(raw, row) {
        Ok(geometry) => Some(geometry),
        Err(issue) => {
            debug!("Dropping row geometry: {issue}");
            None
        },
    }
}

/// Decodes one row's geometry, reporting the last issue on failure.
///
/// # Errors
///
/// Returns the [`GeometryIssue`] of the last step that was attempted.
pub fn try_decode_geometry(raw: GeometryValue<'_>, row: &Row) -> Result<Geometry, GeometryIssue> {
    let attempt = match raw {
        GeometryValue::Binary(bytes) => from_wkb(bytes),
        GeometryValue::Text(text) => from_text(text),
        GeometryValue::Structured(object) => from_object(object),
        GeometryValue::Absent => Err(GeometryIssue::NoSource),
    };

    match attempt {
        Ok(geometry) => Ok(geometry),
        Err(issue) => {
            if !matches!(issue, GeometryIssue::NoSource) {
                debug!("Geometry value rejected ({issue}); trying latitude/longitude");
            }
            row_lat_lon_point(row).ok_or(issue)
        },
    }
}

/// Returns `true` when `text` is a non-empty run of hexadecimal digits.
#[must_use]
pub fn is_hex(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

fn from_wkb(bytes: &[u8]) -> Result<Geometry, GeometryIssue> {
    let geo: geo_types::Geometry<f64> = Wkb(bytes.to_vec())
        .to_geo()
        .or_else(|wkb_err| Ewkb(bytes.to_vec()).to_geo().map_err(|_| wkb_err))
        .map_err(|e| GeometryIssue::InvalidWkb(e.to_string()))?;

    let geometry = Geometry::new(Value::from(&geo));
    validate(geometry)
}

fn from_text(text: &str) -> Result<Geometry, GeometryIssue> {
    let text = text.trim();
    if is_hex(text) {
        return Err(GeometryIssue::HexText);
    }

    let parsed: JsonValue =
        serde_json::from_str(text).map_err(|e| GeometryIssue::InvalidJson(e.to_string()))?;
    match parsed {
        JsonValue::Object(object) => from_object(&object),
        _ => Err(GeometryIssue::MissingTypeOrCoordinates),
    }
}

fn from_object(object: &JsonObject) -> Result<Geometry, GeometryIssue> {
    let has_type = object.get("type").is_some_and(JsonValue::is_string);
    let has_coordinates = object.get("coordinates").is_some_and(JsonValue::is_array);
    if !has_type || !has_coordinates {
        return Err(GeometryIssue::MissingTypeOrCoordinates);
    }

    let geometry = Geometry::from_json_object(object.clone())
        .map_err(|e| GeometryIssue::InvalidGeoJson(e.to_string()))?;
    validate(geometry)
}

/// Builds a point from the row's latitude/longitude fields, if both parse.
///
/// Coordinates are ordered `[longitude, latitude]`.
#[must_use]
pub fn row_lat_lon_point(row: &Row) -> Option<Geometry> {
    let latitude = find_field(row, LATITUDE_NAMES)?;
    let longitude = find_field(row, LONGITUDE_NAMES)?;
    lat_lon_point(row, latitude, longitude)
}

/// Builds a point from the named latitude/longitude fields of `row`.
#[must_use]
pub fn lat_lon_point(row: &Row, latitude: &str, longitude: &str) -> Option<Geometry> {
    let lat = row.get(latitude)?.as_f64()?;
    let lon = row.get(longitude)?.as_f64()?;
    // Projected coordinates are accepted as-is; only non-numbers are rejected.
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some(Geometry::new(Value::Point(vec![lon, lat])))
}

/// Returns the stored name of the first field matching `candidates`.
pub(crate) fn find_field<'a>(row: &'a Row, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|candidate| row.get_ignore_case(candidate).map(|(name, _)| name))
}

fn validate(geometry: Geometry) -> Result<Geometry, GeometryIssue> {
    if is_structurally_valid(&geometry.value) {
        Ok(geometry)
    } else {
        Err(GeometryIssue::EmptyCoordinates)
    }
}

/// Checks that a geometry has a non-empty set of finite positions.
#[must_use]
pub fn is_structurally_valid(value: &Value) -> bool {
    fn position(p: &[f64]) -> bool {
        p.len() >= 2 && p.iter().all(|c| c.is_finite())
    }
    fn line(l: &[Vec<f64>]) -> bool {
        !l.is_empty() && l.iter().all(|p| position(p))
    }
    fn polygon(rings: &[Vec<Vec<f64>>]) -> bool {
        !rings.is_empty() && rings.iter().all(|r| line(r))
    }

    match value {
        Value::Point(p) => position(p),
        Value::MultiPoint(points) => line(points),
        Value::LineString(l) => line(l),
        Value::MultiLineString(lines) => !lines.is_empty() && lines.iter().all(|l| line(l)),
        Value::Polygon(rings) => polygon(rings),
        Value::MultiPolygon(polygons) => {
            !polygons.is_empty() && polygons.iter().all(|p| polygon(p))
        },
        Value::GeometryCollection(members) => {
            !members.is_empty() && members.iter().all(|g| is_structurally_valid(&g.value))
        },
    }
}
