//! Feature assembly.
//!
//! Combines each row's geometry with its remaining fields. Rows whose geometry
//! cannot be resolved are dropped; input order is preserved for the rest.

use geoload_core_common::{GeometryValue, JsonObject, Row};
use geojson::{Feature, FeatureCollection, Geometry};
use log::{info, warn};

use crate::error::IngestError;
use crate::geometry::{decode_geometry, lat_lon_point};
use crate::resolver::GeometrySource;

/// Row accounting for one assembly pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub rows: usize,
    pub features: usize,
    pub dropped: usize,
}

/// Builds a feature collection from decoded rows.
///
/// # Errors
///
/// Returns [`IngestError::EmptyResult`] when no row produced a feature.
pub fn assemble(rows: &[Row], source: &GeometrySource) -> Result<FeatureCollection, IngestError> {
    let (collection, report) = assemble_with_report(rows, source);
    if report.features == 0 {
        return Err(IngestError::EmptyResult { rows: report.rows });
    }
    Ok(collection)
}

/// Builds a feature collection and reports how many rows were dropped.
///
/// Unlike [`assemble`], an empty result is not an error here.
#[must_use]
pub fn assemble_with_report(
    rows: &[Row],
    source: &GeometrySource,
) -> (FeatureCollection, AssemblyReport) {
    let features: Vec<Feature> = rows
        .iter()
        .filter_map(|row| {
            let geometry = row_geometry(row, source)?;
            Some(Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: Some(properties(row, source.column())),
                foreign_members: None,
            })
        })
        .collect();

    let report = AssemblyReport {
        rows: rows.len(),
        features: features.len(),
        dropped: rows.len() - features.len(),
    };
    if report.dropped > 0 {
        warn!(
            "Dropped {} of {} row(s) without usable geometry",
            report.dropped, report.rows
        );
    }
    info!("Assembled {} feature(s)", report.features);

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    (collection, report)
}

fn row_geometry(row: &Row, source: &GeometrySource) -> Option<Geometry> {
    match source {
        GeometrySource::Column(column) => {
            decode_geometry(GeometryValue::from_field(row.get(column)), row)
        },
        GeometrySource::LatLon {
            latitude,
            longitude,
        } => lat_lon_point(row, latitude, longitude),
    }
}

/// Row fields as feature properties, without the geometry column.
fn properties(row: &Row, geometry_column: Option<&str>) -> JsonObject {
    row.iter()
        .filter(|(name, _)| Some(*name) != geometry_column)
        .map(|(name, value)| (name.to_string(), value.to_property()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoload_core_common::{FieldValue, JsonValue};
    use geojson::Value;
    use serde_json::json;

    fn wkb_point(x: f64, y: f64) -> Vec<u8> {
        let mut out = vec![1_u8, 1, 0, 0, 0];
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
        out
    }

    fn column(name: &str) -> GeometrySource {
        GeometrySource::Column(name.to_string())
    }

    #[test]
    fn drops_bad_rows_and_keeps_order() {
        let rows = vec![
            Row::new().with("id", 1_i64).with("geom", wkb_point(1.0, 1.0)),
            Row::new().with("id", 2_i64).with("geom", vec![0xFF_u8]),
            Row::new().with("id", 3_i64).with("geom", wkb_point(3.0, 3.0)),
        ];

        let (collection, report) = assemble_with_report(&rows, &column("geom"));
        assert_eq!(
            report,
            AssemblyReport {
                rows: 3,
                features: 2,
                dropped: 1
            }
        );
        let ids: Vec<&JsonValue> = collection
            .features
            .iter()
            .map(|f| f.property("id").unwrap())
            .collect();
        assert_eq!(ids, vec![&json!(1), &json!(3)]);
    }

    #[test]
    fn geometry_column_is_removed_from_properties() {
        let rows = vec![
            Row::new()
                .with("geom", wkb_point(1.0, 2.0))
                .with("label", FieldValue::Binary(b"north".to_vec())),
        ];

        let collection = assemble(&rows, &column("geom")).unwrap();
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert!(!properties.contains_key("geom"));
        assert_eq!(properties.get("label"), Some(&json!("north")));
    }

    #[test]
    fn lat_lon_source_synthesizes_points() {
        let rows = vec![
            Row::new()
                .with("name", "NYC")
                .with("latitude", "40.7")
                .with("longitude", "-74.0"),
        ];
        let source = GeometrySource::LatLon {
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
        };

        let collection = assemble(&rows, &source).unwrap();
        let geometry = collection.features[0].geometry.as_ref().unwrap();
        assert_eq!(geometry.value, Value::Point(vec![-74.0, 40.7]));
        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties.get("latitude"), Some(&json!("40.7")));
    }

    #[test]
    fn projected_lat_lon_columns_are_kept() {
        let rows = vec![
            Row::new().with("lat", 4_500_000.0).with("lon", -8_200_000.0),
            Row::new().with("lat", "4500100.5").with("lon", "-8200100.5"),
        ];
        let source = GeometrySource::LatLon {
            latitude: "lat".to_string(),
            longitude: "lon".to_string(),
        };

        let (collection, report) = assemble_with_report(&rows, &source);
        assert_eq!(report.dropped, 0);
        let geometry = collection.features[1].geometry.as_ref().unwrap();
        assert_eq!(geometry.value, Value::Point(vec![-8_200_100.5, 4_500_100.5]));
    }

    #[test]
    fn absent_geometry_falls_back_to_row_lat_lon() {
        let rows = vec![
            Row::new()
                .with("geometry", FieldValue::Null)
                .with("latitude", "40.7")
                .with("longitude", "-74.0"),
        ];

        let collection = assemble(&rows, &column("geometry")).unwrap();
        let geometry = collection.features[0].geometry.as_ref().unwrap();
        assert_eq!(geometry.value, Value::Point(vec![-74.0, 40.7]));
    }

    #[test]
    fn all_rows_failing_is_empty_result() {
        let rows = vec![
            Row::new().with("geom", vec![0x00_u8]),
            Row::new().with("geom", "ffff"),
        ];
        let err = assemble(&rows, &column("geom")).unwrap_err();
        assert!(matches!(err, IngestError::EmptyResult { rows: 2 }));
    }

    #[test]
    fn no_rows_is_empty_result() {
        let err = assemble(&[], &column("geom")).unwrap_err();
        assert!(matches!(err, IngestError::EmptyResult { rows: 0 }));
    }
}
