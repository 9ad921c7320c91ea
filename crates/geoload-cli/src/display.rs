//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting loaded feature collections in a human-readable format.

use tabled::{Table, Tabled};

use geoload_core::CollectionSummary;

/// Table row representation for a geometry type and how often it occurs.
#[derive(Tabled)]
pub struct GeometryTypeRow {
    /// `GeoJSON` geometry type name.
    #[tabled(rename = "Geometry Type")]
    pub geometry_type: String,
    /// Number of features with this type.
    #[tabled(rename = "Features")]
    pub count: usize,
}

/// Table row representation for a feature property.
#[derive(Tabled)]
pub struct PropertyRow {
    /// Position of the property, starting at 1.
    #[tabled(rename = "#")]
    pub position: usize,
    /// Property name.
    #[tabled(rename = "Property")]
    pub name: String,
}

fn format_bbox(bbox: Option<[f64; 4]>) -> String {
    match bbox {
        Some([min_x, min_y, max_x, max_y]) => format!("[{min_x}, {min_y}, {max_x}, {max_y}]"),
        None => "N/A".to_string(),
    }
}

/// Display a feature collection summary in formatted tables.
///
/// # Arguments
///
/// * `locator` - Where the features were loaded from
/// * `summary` - The summary to display
pub fn display_summary(locator: &str, summary: &CollectionSummary) {
    println!("\nSource: {locator}");
    println!("Features: {}", summary.features);
    println!("Extent: {}", format_bbox(summary.bbox));

    if !summary.geometry_types.is_empty() {
        println!("\n=== Geometry Types ===");

        let rows: Vec<GeometryTypeRow> = summary
            .geometry_types
            .iter()
            .map(|(geometry_type, count)| GeometryTypeRow {
                geometry_type: geometry_type.clone(),
                count: *count,
            })
            .collect();

        println!("{}", Table::new(rows));
    }

    if !summary.properties.is_empty() {
        println!("\n=== Properties ===");

        let rows: Vec<PropertyRow> = summary
            .properties
            .iter()
            .enumerate()
            .map(|(i, name)| PropertyRow {
                position: i + 1,
                name: name.clone(),
            })
            .collect();

        println!("{}", Table::new(rows));
    }
}

/// Report a failed load on standard error.
pub fn display_failure(message: &str, suggestion: Option<&str>) {
    eprintln!("Error: {message}");
    if let Some(suggestion) = suggestion {
        eprintln!("Suggestion: {suggestion}");
    }
}
