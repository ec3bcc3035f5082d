//! Background mode tests for dtview
//!
//! Tests for the dtypes palette, heatmap ramps and bounds, flagging modes,
//! outlier shading and mode switches.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use common::load;
use dtview::background::{compute_style, dtype_color, BackgroundBounds};
use dtview::color::HEATMAP_STOPS;
use dtview::grid::{GridState, RequestKind};
use dtview::{BackgroundMode, DataRecord, OutlierRange, RawValue, SettingsUpdate};
use fixtures::{sample_response, DtypesBuilder, ResponseBuilder};
use test_case::test_case;

fn set_mode(grid: &mut GridState, mode: BackgroundMode) {
    grid.apply_settings_update(SettingsUpdate {
        background_mode: Some(mode),
        ..SettingsUpdate::default()
    });
}

fn background(grid: &GridState, row: usize, column: &str) -> Option<String> {
    grid.data[&row][column]
        .style
        .as_ref()
        .and_then(|s| s.background.clone())
}

#[test_case("" , BackgroundMode::None ; "none")]
#[test_case("dtypes", BackgroundMode::Dtypes ; "dtypes")]
#[test_case("lowVariance", BackgroundMode::LowVariance ; "low variance")]
#[test_case("heatmap-all", BackgroundMode::HeatmapTable ; "heatmap all")]
#[test_case("heatmap-col-price", BackgroundMode::HeatmapColumn("price".into()) ; "single column")]
fn mode_strings(text: &str, mode: BackgroundMode) {
    assert_eq!(text.parse::<BackgroundMode>().unwrap(), mode);
    let json = serde_json::to_string(&mode).unwrap();
    assert_eq!(json, format!("\"{text}\""));
}

#[test]
fn bad_mode_string_is_rejected() {
    assert!(matches!(
        "heatmap-sideways".parse::<BackgroundMode>(),
        Err(dtview::DtviewError::BackgroundMode(_))
    ));
}

#[test]
fn heatmap_to_dtypes_leaves_no_heatmap_style() {
    let mut grid = load(sample_response(10));
    set_mode(&mut grid, BackgroundMode::HeatmapCol);

    // column ends of the ramp
    assert_eq!(background(&grid, 1, "col1"), Some(HEATMAP_STOPS[0].to_hex()));
    assert_eq!(background(&grid, 10, "col1"), Some(HEATMAP_STOPS[2].to_hex()));
    assert_eq!(background(&grid, 1, "col3"), None);

    set_mode(&mut grid, BackgroundMode::Dtypes);
    for row in grid.data.values() {
        for col in &grid.columns {
            let style = row[&col.name].style.as_ref().unwrap();
            assert_eq!(style.background, Some(dtype_color(col.kind).to_hex()));
            assert_eq!(style.color, None);
        }
    }
    assert_eq!(grid.bounds.mode, BackgroundMode::Dtypes);
    assert!(grid.bounds.columns.is_empty());
}

#[test]
fn heatmap_prefers_server_statistics() {
    let response = ResponseBuilder::new()
        .stats_column("v", "float64", 0.0, 100.0)
        .row(vec![RawValue::Float(50.0)])
        .row(vec![RawValue::Float(100.0)])
        .build();
    let mut grid = load(response);
    set_mode(&mut grid, BackgroundMode::HeatmapCol);
    assert_eq!(grid.bounds.columns["v"], (0.0, 100.0));
    // midpoint of the server range is the middle stop
    assert_eq!(background(&grid, 1, "v"), Some(HEATMAP_STOPS[1].to_hex()));
}

#[test]
fn single_column_heatmap_styles_only_that_column() {
    let mut grid = load(sample_response(5));
    set_mode(&mut grid, BackgroundMode::HeatmapColumn("col2".into()));
    assert!(background(&grid, 1, "col2").is_some());
    assert_eq!(background(&grid, 1, "col1"), None);
}

#[test]
fn row_heatmap_uses_each_rows_range() {
    let response = ResponseBuilder::new()
        .column("a", "int64")
        .column("b", "int64")
        .row(vec![RawValue::Int(1), RawValue::Int(2)])
        .row(vec![RawValue::Int(200), RawValue::Int(100)])
        .build();
    let mut grid = load(response);
    set_mode(&mut grid, BackgroundMode::HeatmapRow);
    assert_eq!(background(&grid, 1, "a"), Some(HEATMAP_STOPS[0].to_hex()));
    assert_eq!(background(&grid, 2, "a"), Some(HEATMAP_STOPS[2].to_hex()));
    assert_eq!(background(&grid, 2, "b"), Some(HEATMAP_STOPS[0].to_hex()));
}

#[test]
fn missing_values_are_not_heat_mapped() {
    let response = ResponseBuilder::new()
        .column("v", "float64")
        .row(vec![RawValue::Null])
        .row(vec![RawValue::Float(1.0)])
        .row(vec![RawValue::Float(3.0)])
        .build();
    let mut grid = load(response);
    set_mode(&mut grid, BackgroundMode::HeatmapTable);
    assert_eq!(background(&grid, 1, "v"), None);
    assert!(background(&grid, 2, "v").is_some());
}

#[test]
fn bounds_for_another_mode_are_ignored() {
    let grid = load(sample_response(5));
    let bounds = BackgroundBounds::compute(&BackgroundMode::HeatmapCol, &grid.columns, &grid.data);
    let col = grid.column("col1").unwrap();
    let record = &grid.data[&1]["col1"];

    let applied = compute_style(col, record, 1, &BackgroundMode::HeatmapCol, &bounds);
    assert!(applied.style.background.is_some());
    let stale = compute_style(col, record, 1, &BackgroundMode::HeatmapTable, &bounds);
    assert_eq!(stale.style.background, None);
}

#[test]
fn outliers_shade_beyond_fences() {
    let response = ResponseBuilder::new()
        .column("v", "float64")
        .rows(12, |r| vec![RawValue::Float(if r == 11 { 500.0 } else { r as f64 })])
        .build();
    let mut grid = load(response);
    let token = grid.begin_request(RequestKind::Dtypes);
    let dtypes = DtypesBuilder::new()
        .column("v", "float64", |c| {
            c.has_outliers = Some(1);
            c.outlier_range = Some(OutlierRange {
                lower: 0.0,
                upper: 20.0,
            });
        })
        .build();
    grid.apply_dtypes_response(token, dtypes).unwrap();
    set_mode(&mut grid, BackgroundMode::Outliers);

    let scale = grid.column("v").unwrap().outlier_scale.unwrap();
    assert_eq!((scale.lower, scale.upper, scale.max), (0.0, 20.0, 500.0));
    assert!(background(&grid, 12, "v").is_some());
    assert_eq!(background(&grid, 3, "v"), None);
}

#[test]
fn flag_modes_need_the_column_flag() {
    let grid = load(sample_response(2));
    let mut col = grid.column("col1").unwrap().clone();
    let record = DataRecord::empty();
    let bounds = BackgroundBounds::default();

    let result = compute_style(&col, &record, 1, &BackgroundMode::LowVariance, &bounds);
    assert!(!result.highlighted);
    col.low_variance = true;
    let result = compute_style(&col, &record, 1, &BackgroundMode::LowVariance, &bounds);
    assert!(result.highlighted);
    assert_eq!(result.class, Some("lowVariance"));
}
