//! Grid configuration.
//!
//! Deserializable from the page (camelCase JSON / JS object); every field
//! has a default so a partial object is enough.

use serde::{Deserialize, Serialize};

/// Sizing and display knobs for the grid
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    /// Upper bound for auto-sized column widths
    pub max_column_width: Option<f32>,
    /// Upper bound for the header row height
    pub max_row_height: Option<f32>,
    /// Height of data rows and of a single-line header
    pub row_height: f32,
    /// Extra height per wrapped header line
    pub header_line_height: f32,
    /// Horizontal padding added to measured content (both sides)
    pub cell_padding: f32,
    /// Padding added to the rotated label in vertical-header mode
    pub vertical_header_padding: f32,
    /// Smallest auto-sized width for data columns
    pub min_column_width: f32,
    /// Smallest width for the index column
    pub index_min_width: f32,
    /// Smallest width a drag can produce
    pub resize_floor: f32,
    /// Rows sampled per column when measuring content
    pub sample_rows: usize,
    /// Fallback average glyph widths (cell / header fonts)
    pub char_width: f32,
    pub header_char_width: f32,
    /// CSS fonts used for canvas measurement
    pub cell_font: String,
    pub header_font: String,
    /// Shown for null/NaN cells
    pub nan_display: String,
    /// Extra rows/columns rendered around the viewport
    pub overscan: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_column_width: None,
            max_row_height: None,
            row_height: 25.0,
            header_line_height: 15.0,
            cell_padding: 16.0,
            vertical_header_padding: 15.0,
            min_column_width: 35.0,
            index_min_width: 35.0,
            resize_floor: 10.0,
            sample_rows: 100,
            char_width: 7.0,
            header_char_width: 8.0,
            cell_font: "12px \"Open Sans\", sans-serif".to_string(),
            header_font: "bold 12px \"Open Sans\", sans-serif".to_string(),
            nan_display: "-".to_string(),
            overscan: 2,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config: GridConfig =
            serde_json::from_str(r#"{"maxColumnWidth":35,"nanDisplay":"nan"}"#).unwrap();
        assert_eq!(config.max_column_width, Some(35.0));
        assert_eq!(config.nan_display, "nan");
        assert_eq!(config.row_height, 25.0);
        assert_eq!(config.resize_floor, 10.0);
    }
}
