//! Grid state propagation tests for dtview
//!
//! Tests for column actions, settings updates, request sequencing and the
//! locked-column invariant across every kind of propagated update.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use common::{assert_fixed_count, column_names, load, width_of};
use dtview::grid::{ColumnAction, RequestKind, StateUpdate};
use dtview::i18n::Untranslated;
use dtview::layout::Viewport;
use dtview::view::render_window;
use dtview::{
    BackgroundMode, ColumnFormat, ColumnKind, DtviewError, InstanceSettings, RawValue,
    SettingsUpdate, SortDirection,
};
use fixtures::{sample_response, DtypesBuilder, ResponseBuilder};

// ============================================================================
// Sort and visibility
// ============================================================================

#[test]
fn hiding_a_sorted_column_keeps_its_sort_entry() {
    let mut grid = load(sample_response(5));
    grid.apply_settings_update(SettingsUpdate {
        sort_info: Some(vec![("col4".into(), SortDirection::Asc)]),
        ..SettingsUpdate::default()
    });
    grid.apply_column_action(ColumnAction::HideColumn { column: "col4".into() })
        .unwrap();

    assert_eq!(grid.settings.sort_info, vec![("col4".to_string(), SortDirection::Asc)]);
    let window = render_window(&grid, &Viewport::new(2000.0, 400.0), &Untranslated);
    assert!(window.header.iter().all(|h| h.column.as_deref() != Some("col4")));
    assert!(window.header.iter().all(|h| h.sort.is_none()));

    // showing it again brings the glyph back
    grid.apply_column_action(ColumnAction::ShowColumn { column: "col4".into() })
        .unwrap();
    let window = render_window(&grid, &Viewport::new(2000.0, 400.0), &Untranslated);
    let header = window
        .header
        .iter()
        .find(|h| h.column.as_deref() == Some("col4"))
        .unwrap();
    assert_eq!(header.sort, Some(SortDirection::Asc));
    assert!(header.label.ends_with('▲'));
}

#[test]
fn clearing_a_sort() {
    let mut grid = load(sample_response(5));
    grid.apply_column_action(ColumnAction::SortColumn {
        column: "col2".into(),
        direction: Some(SortDirection::Desc),
    })
    .unwrap();
    let update = grid
        .apply_column_action(ColumnAction::SortColumn {
            column: "col2".into(),
            direction: None,
        })
        .unwrap();
    assert_eq!(update.sort_info, Some(vec![]));
    assert!(grid.settings.sort_info.is_empty());
}

#[test]
fn unknown_column_is_an_error() {
    let mut grid = load(sample_response(2));
    let err = grid
        .apply_column_action(ColumnAction::HideColumn { column: "nope".into() })
        .unwrap_err();
    assert!(matches!(err, DtviewError::UnknownColumn(name) if name == "nope"));
    assert!(grid.columns.iter().all(|c| c.visible));
}

// ============================================================================
// Locked columns
// ============================================================================

#[test]
fn fixed_count_tracks_locks_through_every_update() {
    let mut grid = load(sample_response(5));
    assert_fixed_count(&grid);

    let actions = [
        ColumnAction::LockColumn { column: "col3".into() },
        ColumnAction::LockColumn { column: "col5".into() },
        ColumnAction::HideColumn { column: "col5".into() },
        ColumnAction::MoveColumn { column: "col1".into(), to: 0 },
        ColumnAction::UnlockColumn { column: "col3".into() },
        ColumnAction::RenameColumn { column: "col5".into(), to: "five".into() },
    ];
    for action in actions {
        grid.apply_column_action(action).unwrap();
        assert_fixed_count(&grid);
    }

    grid.apply_settings_update(SettingsUpdate {
        locked: Some(vec!["col2".into(), "col4".into()]),
        ..SettingsUpdate::default()
    });
    assert_fixed_count(&grid);
    assert_eq!(&column_names(&grid)[..2], &["col2", "col4"]);

    let mut columns = grid.columns.clone();
    columns.iter_mut().for_each(|c| c.locked = true);
    grid.propagate(StateUpdate::columns(columns));
    assert_eq!(grid.fixed_column_count, 6);

    let token = grid.begin_request(RequestKind::Data);
    grid.apply_data_response(token, sample_response(3)).unwrap();
    assert_fixed_count(&grid);
}

#[test]
fn locked_columns_stay_in_front() {
    let mut grid = load(sample_response(2));
    grid.apply_column_action(ColumnAction::LockColumn { column: "col4".into() })
        .unwrap();
    grid.apply_column_action(ColumnAction::MoveColumn { column: "col2".into(), to: 0 })
        .unwrap();
    assert_eq!(column_names(&grid), vec!["col4", "col2", "col1", "col3", "col5"]);
    assert_eq!(grid.take_settings_update().unwrap().locked, Some(vec!["col4".to_string()]));
}

#[test]
fn repeated_lock_and_unlock_keep_order() {
    let mut grid = load(sample_response(3));
    grid.apply_column_action(ColumnAction::UnlockColumn { column: "col4".into() })
        .unwrap();
    assert_eq!(column_names(&grid), vec!["col1", "col2", "col3", "col4", "col5"]);

    for column in ["col3", "col5", "col3"] {
        grid.apply_column_action(ColumnAction::LockColumn { column: column.into() })
            .unwrap();
    }
    assert_eq!(column_names(&grid), vec!["col3", "col5", "col1", "col2", "col4"]);
    assert_eq!(grid.settings.locked, vec!["col3".to_string(), "col5".to_string()]);
    assert_fixed_count(&grid);
}

#[test]
fn loaded_settings_apply_locks() {
    let mut grid = load(sample_response(2));
    grid.load_settings(InstanceSettings {
        locked: vec!["col5".into()],
        background_mode: BackgroundMode::Dtypes,
        ..InstanceSettings::default()
    });
    assert_eq!(column_names(&grid)[0], "col5");
    assert!(grid.column("col5").unwrap().locked);
    assert_eq!(grid.fixed_column_count, 2);
    assert!(grid.data[&1]["col1"].style.is_some());
}

// ============================================================================
// Formatting updates
// ============================================================================

#[test]
fn format_only_update_leaves_widths_until_next_layout() {
    let mut grid = load(sample_response(10));
    let before = width_of(&grid, "col2");

    let mut formats = std::collections::BTreeMap::new();
    formats.insert(
        "col2".to_string(),
        ColumnFormat {
            precision: Some(6),
            ..ColumnFormat::default()
        },
    );
    grid.apply_settings_update(SettingsUpdate {
        column_formats: Some(formats),
        ..SettingsUpdate::default()
    });
    assert_eq!(grid.data[&2]["col2"].view.text(), "2.500000");
    assert_eq!(width_of(&grid, "col2"), before);

    grid.apply_column_action(ColumnAction::HideColumn { column: "col1".into() })
        .unwrap();
    assert!(width_of(&grid, "col2") > before);
}

#[test]
fn nan_display_reformats_missing_cells() {
    let response = ResponseBuilder::new()
        .column("x", "float64")
        .row(vec![RawValue::Null])
        .row(vec![RawValue::Float(1.0)])
        .build();
    let mut grid = load(response);
    assert_eq!(grid.data[&1]["x"].view.text(), "-");
    grid.apply_settings_update(SettingsUpdate {
        nan_display: Some("nan".into()),
        ..SettingsUpdate::default()
    });
    assert_eq!(grid.data[&1]["x"].view.text(), "nan");
    assert_eq!(grid.data[&2]["x"].view.text(), "1.00");
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn streams_are_sequenced_independently() {
    let mut grid = load(sample_response(3));
    let dtypes = grid.begin_request(RequestKind::Dtypes);
    let data = grid.begin_request(RequestKind::Data);
    let newer_dtypes = grid.begin_request(RequestKind::Dtypes);

    grid.apply_data_response(data, sample_response(4)).unwrap();
    let err = grid
        .apply_dtypes_response(dtypes, DtypesBuilder::new().build())
        .unwrap_err();
    assert!(matches!(err, DtviewError::StaleResponse { .. }));
    grid.apply_dtypes_response(newer_dtypes, DtypesBuilder::new().build())
        .unwrap();
    assert_eq!(grid.row_count, 4);
}

#[test]
fn stale_data_leaves_last_good_state() {
    let mut grid = load(sample_response(3));
    let old = grid.begin_request(RequestKind::Data);
    let new = grid.begin_request(RequestKind::Data);
    grid.apply_data_response(new, sample_response(7)).unwrap();
    assert!(grid.apply_data_response(old, sample_response(1)).is_err());
    assert_eq!(grid.row_count, 7);
    assert!(grid.data.contains_key(&7));
}

#[test]
fn dtypes_response_reclassifies_and_flags() {
    let mut grid = load(sample_response(3));
    let token = grid.begin_request(RequestKind::Dtypes);
    let dtypes = DtypesBuilder::new()
        .column("col2", "float64", |c| c.has_missing = Some(3))
        .column("col3", "category", |c| c.unique_ct = Some(3))
        .build();
    grid.apply_dtypes_response(token, dtypes).unwrap();

    assert_eq!(grid.column("col3").unwrap().kind, ColumnKind::Category);
    assert!(grid.column("col2").unwrap().has_missing());

    grid.apply_settings_update(SettingsUpdate {
        background_mode: Some(BackgroundMode::Missing),
        ..SettingsUpdate::default()
    });
    let window = render_window(&grid, &Viewport::new(2000.0, 400.0), &Untranslated);
    let header = window
        .header
        .iter()
        .find(|h| h.column.as_deref() == Some("col2"))
        .unwrap();
    assert!(header.label.starts_with('⚠'));
    assert_eq!(header.tooltip.as_deref(), Some("missing"));
    let cell = window
        .scrolling
        .iter()
        .chain(&window.fixed)
        .find(|c| c.column.as_deref() == Some("col2"))
        .unwrap();
    assert!(cell.highlighted);
}

#[test]
fn scroll_chunks_merge_into_loaded_rows() {
    let mut grid = load(sample_response(5));
    let token = grid.begin_request(RequestKind::Data);
    let chunk = ResponseBuilder::chunk(&["col1", "col2", "col3", "col4", "col5"], 40)
        .row(vec![
            RawValue::Int(40),
            RawValue::Float(100.0),
            RawValue::String("late".into()),
            RawValue::Null,
            RawValue::String("even".into()),
        ])
        .total(100)
        .build();
    grid.apply_data_response(token, chunk).unwrap();

    assert_eq!(grid.row_count, 100);
    assert_eq!(grid.data[&41]["col3"].view.text(), "late");
    assert_eq!(grid.data[&1]["col3"].view.text(), "row 0");
    assert_eq!(grid.data.len(), 6);
}

#[test]
fn final_query_is_remembered() {
    let mut grid = load(sample_response(1));
    let token = grid.begin_request(RequestKind::Data);
    let mut response = sample_response(1);
    response.final_query = "col1 > 3".into();
    grid.apply_data_response(token, response).unwrap();
    assert_eq!(grid.settings.query.as_deref(), Some("col1 > 3"));
}
