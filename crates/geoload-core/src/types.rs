//! Summary types describing an ingested feature collection.

use std::collections::BTreeMap;

use geojson::{FeatureCollection, Value};

/// Overview of a feature collection, used for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSummary {
    /// Number of features
    pub features: usize,
    /// Feature count per geometry type, keyed by `GeoJSON` type name
    pub geometry_types: BTreeMap<String, usize>,
    /// Property names in first-seen order
    pub properties: Vec<String>,
    /// Bounding box as `[min_x, min_y, max_x, max_y]`
    pub bbox: Option<[f64; 4]>,
}

#[derive(Debug, Clone, Copy)]
struct Bounds([f64; 4]);

impl Bounds {
    fn empty() -> Self {
        Self([f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY])
    }

    fn extend(&mut self, position: &[f64]) {
        if let [x, y, ..] = position {
            self.0[0] = self.0[0].min(*x);
            self.0[1] = self.0[1].min(*y);
            self.0[2] = self.0[2].max(*x);
            self.0[3] = self.0[3].max(*y);
        }
    }

    fn extend_value(&mut self, value: &Value) {
        match value {
            Value::Point(p) => self.extend(p),
            Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().for_each(|p| self.extend(p)),
            Value::MultiLineString(ls) | Value::Polygon(ls) => {
                ls.iter().flatten().for_each(|p| self.extend(p));
            },
            Value::MultiPolygon(polys) => {
                polys.iter().flatten().flatten().for_each(|p| self.extend(p));
            },
            Value::GeometryCollection(geometries) => {
                geometries.iter().for_each(|g| self.extend_value(&g.value));
            },
        }
    }

    fn finish(self) -> Option<[f64; 4]> {
        (self.0[0] <= self.0[2]).then_some(self.0)
    }
}

impl CollectionSummary {
    /// Summarizes `collection`.
    #[must_use]
    pub fn from_collection(collection: &FeatureCollection) -> Self {
        let mut geometry_types = BTreeMap::new();
        let mut properties: Vec<String> = Vec::new();
        let mut bounds = Bounds::empty();

        for feature in &collection.features {
            if let Some(geometry) = &feature.geometry {
                *geometry_types
                    .entry(geometry.value.type_name().to_string())
                    .or_insert(0) += 1;
                bounds.extend_value(&geometry.value);
            }
            for name in feature.properties.iter().flat_map(|p| p.keys()) {
                if !properties.contains(name) {
                    properties.push(name.clone());
                }
            }
        }

        Self {
            features: collection.features.len(),
            geometry_types,
            properties,
            bbox: bounds.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Feature, Geometry};
    use serde_json::json;

    fn feature(value: Value, properties: serde_json::Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    #[test]
    fn test_summary_counts_types_and_bounds() {
        let collection = FeatureCollection {
            bbox: None,
            features: vec![
                feature(Value::Point(vec![1.0, 2.0]), json!({"id": 1, "name": "a"})),
                feature(
                    Value::LineString(vec![vec![-3.0, 0.5], vec![4.0, 5.0]]),
                    json!({"id": 2, "kind": "road"}),
                ),
                feature(Value::Point(vec![0.0, 0.0]), json!({"id": 3})),
            ],
            foreign_members: None,
        };

        let summary = CollectionSummary::from_collection(&collection);
        assert_eq!(summary.features, 3);
        assert_eq!(summary.geometry_types.get("Point"), Some(&2));
        assert_eq!(summary.geometry_types.get("LineString"), Some(&1));
        assert_eq!(summary.properties, vec!["id", "name", "kind"]);
        assert_eq!(summary.bbox, Some([-3.0, 0.0, 4.0, 5.0]));
    }

    #[test]
    fn test_summary_names_collection_types() {
        let square = vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]];
        let collection = FeatureCollection {
            bbox: None,
            features: vec![
                feature(Value::MultiPolygon(vec![square.clone()]), json!({})),
                feature(
                    Value::GeometryCollection(vec![Geometry::new(Value::Polygon(square))]),
                    json!({}),
                ),
            ],
            foreign_members: None,
        };

        let summary = CollectionSummary::from_collection(&collection);
        let names: Vec<&str> = summary.geometry_types.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["GeometryCollection", "MultiPolygon"]);
    }

    #[test]
    fn test_empty_collection_has_no_bbox() {
        let summary = CollectionSummary::from_collection(&FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        });
        assert_eq!(summary.features, 0);
        assert!(summary.bbox.is_none());
    }
}
