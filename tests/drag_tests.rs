//! Header drag-resize tests for dtview
//!
//! Moves only update the preview; release (anywhere) commits the width,
//! marks the column resized and triggers one resize.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use std::cell::RefCell;
use std::rc::Rc;

use common::{load, width_of};
use dtview::grid::{ColumnAction, DragPosition, DragState};
use dtview::i18n::Untranslated;
use dtview::layout::Viewport;
use dtview::view::render_window;
use fixtures::sample_response;

#[test]
fn moves_do_not_relayout() {
    let mut grid = load(sample_response(5));
    let start = width_of(&grid, "col3");
    let generation = grid.resize_generation;
    let misses = grid.cache.misses;

    grid.drag_start("col3", 400.0).unwrap();
    for x in [410.0, 450.0, 390.0, 480.0] {
        grid.drag_move(x);
    }
    assert_eq!(width_of(&grid, "col3"), start);
    assert_eq!(grid.resize_generation, generation);
    assert_eq!(grid.cache.misses, misses);
    assert_eq!(grid.drag.preview_width("col3"), Some(start + 80.0));

    assert_eq!(grid.drag_stop(), Some(start + 80.0));
    assert_eq!(width_of(&grid, "col3"), start + 80.0);
    assert_eq!(grid.resize_generation, generation + 1);
}

#[test]
fn drag_width_has_a_floor() {
    let mut grid = load(sample_response(5));
    grid.drag_start("col1", 300.0).unwrap();
    let position = grid.drag_move(-1000.0).unwrap();
    assert_eq!(position.width, 10.0);
    assert_eq!(grid.pointer_up(), Some(10.0));
    assert_eq!(width_of(&grid, "col1"), 10.0);
}

#[test]
fn listener_receives_positions() {
    let mut grid = load(sample_response(5));
    let seen: Rc<RefCell<Vec<DragPosition>>> = Rc::default();
    let sink = Rc::clone(&seen);
    grid.set_drag_listener(move |pos| sink.borrow_mut().push(pos.clone()));

    let start = width_of(&grid, "col2");
    grid.drag_start("col2", 100.0).unwrap();
    grid.drag_move(120.0);
    grid.drag_move(130.0);
    grid.pointer_up();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].column, "col2");
    assert_eq!(seen[1].x, 130.0);
    assert_eq!(seen[1].width, start + 30.0);
}

#[test]
fn pointer_up_outside_window_ends_drag() {
    let mut grid = load(sample_response(5));
    grid.drag_start("col4", 10.0).unwrap();
    grid.drag_move(25.0);
    // no stop event; the global pointer-up handler still fires
    assert!(grid.pointer_up().is_some());
    assert_eq!(grid.drag, DragState::Idle);
    assert!(grid.column("col4").unwrap().resized);
    assert_eq!(grid.pointer_up(), None);
}

#[test]
fn new_drag_commits_the_previous_one() {
    let mut grid = load(sample_response(5));
    let col1 = width_of(&grid, "col1");
    grid.drag_start("col1", 0.0).unwrap();
    grid.drag_move(40.0);
    grid.drag_start("col2", 0.0).unwrap();
    assert_eq!(width_of(&grid, "col1"), col1 + 40.0);
    assert!(grid.drag.preview_width("col2").is_some());
}

#[test]
fn unknown_column_cannot_be_dragged() {
    let mut grid = load(sample_response(2));
    assert!(grid.drag_start("missing", 0.0).is_err());
    assert!(!grid.drag.is_dragging());
}

#[test]
fn window_shows_preview_while_dragging() {
    let mut grid = load(sample_response(5));
    let start = width_of(&grid, "col2");
    grid.drag_start("col2", 0.0).unwrap();
    grid.drag_move(60.0);

    let window = render_window(&grid, &Viewport::new(2000.0, 400.0), &Untranslated);
    let header = window
        .header
        .iter()
        .find(|h| h.column.as_deref() == Some("col2"))
        .unwrap();
    assert_eq!(header.width, start + 60.0);
    assert_eq!(window.drag.as_ref().unwrap().width, start + 60.0);
    // body cells keep the committed width
    let cell = window
        .scrolling
        .iter()
        .find(|c| c.column.as_deref() == Some("col2"))
        .unwrap();
    assert_eq!(cell.width, start);
}

#[test]
fn resized_width_survives_reset_of_other_columns() {
    let mut grid = load(sample_response(5));
    grid.drag_start("col2", 0.0).unwrap();
    grid.drag_move(100.0);
    let committed = grid.pointer_up().unwrap();
    grid.apply_column_action(ColumnAction::ResetWidth { column: "col1".into() })
        .unwrap();
    assert_eq!(width_of(&grid, "col2"), committed);
}
