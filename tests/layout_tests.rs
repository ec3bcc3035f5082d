//! Layout tests for dtview
//!
//! Tests for content-driven column widths, width caps, sticky manual widths,
//! header heights (wrapped and rotated labels) and frozen-pane geometry.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use common::{grid_with, load, load_with, width_of, FixedMeasure};
use dtview::grid::ColumnAction;
use dtview::layout::{recompute_layout, row_height, CharWidthMeasure, SizingContext};
use dtview::{GridConfig, RawValue, SettingsUpdate, SortDirection};
use fixtures::{sample_response, ResponseBuilder};

fn single_column() -> dtview::DataResponse {
    ResponseBuilder::new()
        .column("col1", "int64")
        .rows(3, |r| vec![RawValue::Int(i64::try_from(r).unwrap())])
        .build()
}

// ============================================================================
// Column widths
// ============================================================================

#[test]
fn content_width_is_capped_by_max_column_width() {
    let measure = FixedMeasure::new().with("col1", 20.0).cells(40.0);
    let config = GridConfig {
        max_column_width: Some(35.0),
        ..GridConfig::default()
    };
    let grid = load_with(grid_with(config, measure.clone()), single_column());
    assert_eq!(width_of(&grid, "col1"), 35.0);

    // without the cap the content plus padding wins
    let grid = load_with(grid_with(GridConfig::default(), measure), single_column());
    assert_eq!(width_of(&grid, "col1"), 56.0);
}

#[test]
fn header_wins_over_narrow_content() {
    let measure = FixedMeasure::new().with("a_long_header_name", 150.0).cells(12.0);
    let response = ResponseBuilder::new()
        .column("a_long_header_name", "int64")
        .row(vec![RawValue::Int(1)])
        .build();
    let grid = load_with(grid_with(GridConfig::default(), measure), response);
    assert_eq!(width_of(&grid, "a_long_header_name"), 166.0);
}

#[test]
fn recompute_is_idempotent() {
    let grid = load(sample_response(40));
    let measure = CharWidthMeasure::from_config(&grid.config);
    let ctx = SizingContext::new(&grid.settings, &grid.config, &measure);

    let once = recompute_layout(&grid.columns, &grid.data, grid.row_count, &ctx);
    let twice = recompute_layout(&once, &grid.data, grid.row_count, &ctx);
    assert_eq!(once, twice);
    assert_eq!(once, grid.columns);
    assert_eq!(
        row_height(0, &once, &ctx),
        row_height(0, &twice, &ctx)
    );
}

#[test]
fn every_width_respects_floor() {
    let grid = load(sample_response(10));
    for col in &grid.columns {
        assert!(col.width >= grid.config.min_column_width, "{} is {}", col.name, col.width);
    }
}

#[test]
fn resized_width_survives_sort_change() {
    let mut grid = load(sample_response(10));
    grid.apply_column_action(ColumnAction::ResizeColumn {
        column: "col3".into(),
        width: 200.0,
    })
    .unwrap();
    let col1_before = width_of(&grid, "col1");

    grid.apply_column_action(ColumnAction::SortColumn {
        column: "col1".into(),
        direction: Some(SortDirection::Asc),
    })
    .unwrap();

    assert_eq!(width_of(&grid, "col3"), 200.0);
    assert!(grid.column("col3").unwrap().resized);
    // the sort glyph widens the auto-sized header
    assert!(width_of(&grid, "col1") > col1_before);
}

#[test]
fn reset_width_returns_to_auto() {
    let mut grid = load(sample_response(10));
    let auto = width_of(&grid, "col3");
    grid.apply_column_action(ColumnAction::ResizeColumn {
        column: "col3".into(),
        width: 300.0,
    })
    .unwrap();
    grid.apply_column_action(ColumnAction::ResetWidth { column: "col3".into() })
        .unwrap();
    assert_eq!(width_of(&grid, "col3"), auto);
    assert!(!grid.column("col3").unwrap().resized);
}

#[test]
fn manual_width_has_a_floor() {
    let mut grid = load(sample_response(3));
    grid.apply_column_action(ColumnAction::ResizeColumn {
        column: "col1".into(),
        width: 2.0,
    })
    .unwrap();
    assert_eq!(width_of(&grid, "col1"), grid.config.resize_floor);
}

// ============================================================================
// Header height
// ============================================================================

#[test]
fn narrow_columns_wrap_header_labels() {
    let config = GridConfig {
        max_column_width: Some(35.0),
        ..GridConfig::default()
    };
    let grid = load_with(dtview::GridState::new(config), sample_response(5));
    // "colN" is 32px in a 19px text box: two lines
    assert_eq!(grid.header_height, 40.0);
    assert_eq!(grid.row_height(1), 25.0);
}

#[test]
fn vertical_headers_use_longest_label() {
    let mut grid = load(sample_response(5));
    assert_eq!(grid.header_height, 25.0);
    grid.apply_settings_update(SettingsUpdate {
        vertical_headers: Some(true),
        ..SettingsUpdate::default()
    });
    assert_eq!(grid.header_height, 32.0 + 15.0);
}

#[test]
fn max_row_height_bounds_header() {
    let config = GridConfig {
        max_row_height: Some(40.0),
        ..GridConfig::default()
    };
    let mut grid = load_with(dtview::GridState::new(config), sample_response(5));
    grid.apply_settings_update(SettingsUpdate {
        vertical_headers: Some(true),
        sort_info: Some(vec![("col2".into(), SortDirection::Desc)]),
        ..SettingsUpdate::default()
    });
    assert_eq!(grid.header_height, 40.0);
}

// ============================================================================
// Pixel layout
// ============================================================================

#[test]
fn hidden_columns_leave_the_layout() {
    let mut grid = load(sample_response(5));
    grid.apply_column_action(ColumnAction::HideColumn { column: "col2".into() })
        .unwrap();
    let layout = grid.layout();
    assert_eq!(layout.col_count(), 5);
    assert_eq!(layout.column_index("col2"), None);
    assert_eq!(layout.column_name(2), Some("col3"));
}

#[test]
fn frozen_pane_covers_index_and_locked() {
    let mut grid = load(sample_response(5));
    grid.apply_column_action(ColumnAction::LockColumn { column: "col3".into() })
        .unwrap();
    let layout = grid.layout();
    assert_eq!(layout.frozen_cols, 2);
    assert_eq!(layout.column_name(1), Some("col3"));
    assert_eq!(
        layout.frozen_cols_width(),
        grid.index_width + width_of(&grid, "col3")
    );
    let total: f32 = grid.index_width + grid.columns.iter().map(|c| c.width).sum::<f32>();
    assert_eq!(layout.total_width(), total);
    assert_eq!(layout.total_height(), grid.header_height + 5.0 * 25.0);
}

#[test]
fn hit_testing_finds_columns_and_rows() {
    let grid = load(sample_response(20));
    let layout = grid.layout();
    let col2 = layout.column_index("col2").unwrap();
    let rect = layout.cell_rect(3, col2);
    assert_eq!(layout.col_at_x(rect.x + 1.0), Some(col2));
    assert_eq!(layout.row_at_y(rect.y + 1.0), 3);
    assert_eq!(layout.row_at_y(1.0e6), 20);
    assert_eq!(layout.col_at_x(1.0e6), Some(layout.col_count() - 1));
}
