//! Composition of the visible window of the virtualized grid.
//!
//! Row 0 is rendered by the header renderer; layout column 0 (the index)
//! and the visible locked columns go to the fixed pane; the rest come from
//! the viewport's horizontal window. Only rows inside the vertical window
//! (plus overscan) are produced.

use std::ops::Range;

use serde::Serialize;

use crate::background::{compute_style, header_icon};
use crate::grid::{DragPosition, GridState};
use crate::i18n::Translate;
use crate::layout::{header_label, GridLayout, Viewport};
use crate::types::{sort_direction, CellStyle, CellView, DataRecord, SortDirection};

/// One header cell
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCell {
    pub col: usize,
    /// `None` for the index column
    pub column: Option<String>,
    pub label: String,
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub vertical: bool,
    pub locked: bool,
    pub sort: Option<SortDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

/// One body cell, positioned in screen coordinates
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderCell {
    pub row: usize,
    pub col: usize,
    pub column: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub view: CellView,
    /// Raw value when it differs from the displayed text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
    pub highlighted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<&'static str>,
}

/// Everything needed to paint one frame
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderWindow {
    pub header: Vec<HeaderCell>,
    pub fixed: Vec<RenderCell>,
    pub scrolling: Vec<RenderCell>,
    /// Grid rows covered (overscan included)
    pub rows: Range<usize>,
    /// Scrolling layout columns covered (overscan included)
    pub cols: Range<usize>,
    /// Index + every locked column, hidden ones included. This is the
    /// persisted lock count, not a paint boundary.
    pub fixed_column_count: usize,
    /// Layout columns painted in the fixed pane (index + visible locked
    /// columns). Use this as the frozen boundary when drawing.
    pub frozen_cols: usize,
    pub total_width: f32,
    pub total_height: f32,
    /// Server rows in the window that are not loaded yet
    pub unloaded_rows: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drag: Option<DragPosition>,
}

fn expand(range: Range<usize>, by: usize, floor: usize, ceil: usize) -> Range<usize> {
    if range.is_empty() {
        return range;
    }
    range.start.saturating_sub(by).max(floor)..(range.end + by).min(ceil)
}

fn header_cell(
    state: &GridState,
    layout: &GridLayout,
    viewport: &Viewport,
    col: usize,
    translator: &dyn Translate,
) -> HeaderCell {
    let rect = layout.cell_rect(0, col);
    let (x, _) = viewport.to_screen_frozen(rect.x, rect.y, 0, col, layout);
    let column = layout.column_name(col).and_then(|name| state.column(name));
    let mode = &state.settings.background_mode;

    let (label, locked, sort, tooltip) = match column {
        Some(def) => (
            header_label(def, &state.settings.sort_info, mode),
            def.locked,
            sort_direction(&state.settings.sort_info, &def.name),
            header_icon(def, mode).map(|_| translator.translate(&mode.to_string(), "background")),
        ),
        None => (String::new(), true, None, None),
    };

    let width = column
        .and_then(|def| state.drag.preview_width(&def.name))
        .unwrap_or(rect.width);

    HeaderCell {
        col,
        column: column.map(|def| def.name.clone()),
        label,
        x,
        width,
        height: rect.height,
        vertical: state.settings.vertical_headers && column.is_some(),
        locked,
        sort,
        tooltip,
    }
}

fn body_cell(state: &GridState, layout: &GridLayout, viewport: &Viewport, row: usize, col: usize) -> RenderCell {
    let rect = layout.cell_rect(row, col);
    let (x, y) = viewport.to_screen_frozen(rect.x, rect.y, row, col, layout);
    let name = layout.column_name(col);

    let mut cell = RenderCell {
        row,
        col,
        column: name.map(str::to_string),
        x,
        y,
        width: rect.width,
        height: rect.height,
        view: CellView::Text(String::new()),
        title: None,
        style: None,
        highlighted: false,
        class: None,
    };

    let Some(name) = name else {
        cell.view = CellView::Text(row.saturating_sub(1).to_string());
        return cell;
    };

    let empty = DataRecord::empty();
    let loaded = state.data.get(&row).and_then(|r| r.get(name));
    let record = loaded.unwrap_or(&empty);
    if let Some(def) = state.column(name) {
        if loaded.is_some() {
            let result = compute_style(def, record, row, &state.settings.background_mode, &state.bounds);
            cell.highlighted = result.highlighted;
            cell.class = result.class;
            cell.style = Some(result.style).filter(|s| !s.is_empty());
        }
    }
    cell.view = record.view.clone();
    cell.title = record.title();
    cell
}

/// Compose the visible window for `viewport`
pub fn render_window(state: &GridState, viewport: &Viewport, translator: &dyn Translate) -> RenderWindow {
    let layout = state.layout();
    let overscan = state.config.overscan;

    let rows = expand(viewport.visible_rows(&layout), overscan, 1, state.row_count + 1);
    let cols = expand(viewport.visible_cols(&layout), overscan, layout.frozen_cols, layout.col_count());
    let fixed_cols = 0..layout.frozen_cols.min(layout.col_count());

    let header = fixed_cols
        .clone()
        .chain(cols.clone())
        .map(|col| header_cell(state, &layout, viewport, col, translator))
        .collect();

    let mut fixed = Vec::with_capacity(rows.len() * fixed_cols.len());
    let mut scrolling = Vec::with_capacity(rows.len() * cols.len());
    for row in rows.clone() {
        for col in fixed_cols.clone() {
            fixed.push(body_cell(state, &layout, viewport, row, col));
        }
        for col in cols.clone() {
            scrolling.push(body_cell(state, &layout, viewport, row, col));
        }
    }

    let unloaded_rows = rows
        .clone()
        .filter(|row| !state.data.contains_key(row))
        .map(|row| row - 1)
        .collect();

    RenderWindow {
        header,
        fixed,
        scrolling,
        rows,
        cols,
        fixed_column_count: state.fixed_column_count,
        frozen_cols: fixed_cols.len(),
        total_width: layout.total_width(),
        total_height: layout.total_height(),
        unloaded_rows,
        drag: match &state.drag {
            crate::grid::DragState::Dragging { column, preview, .. } => Some(DragPosition {
                column: column.clone(),
                x: layout
                    .column_index(column)
                    .map_or(0.0, |c| layout.cell_rect(0, c).x + preview),
                width: *preview,
            }),
            crate::grid::DragState::Idle => None,
        },
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
    use crate::grid::{RequestKind, StateUpdate};
    use crate::i18n::Untranslated;
    use crate::types::{ColumnDef, DataResponse, RawRows, RawValue};

    fn state(rows: usize) -> GridState {
        let mut state = GridState::default();
        let columns: Vec<ColumnDef> = (0..6).map(|i| ColumnDef::new(format!("c{i}"), "int64")).collect();
        let mut results = RawRows::new();
        for r in 0..rows.min(20) {
            results.insert(
                r,
                columns
                    .iter()
                    .map(|c| (c.name.clone(), RawValue::Int(i64::try_from(r).unwrap())))
                    .collect(),
            );
        }
        let token = state.begin_request(RequestKind::Data);
        state
            .apply_data_response(
                token,
                DataResponse {
                    columns: Some(columns),
                    results,
                    total: rows,
                    final_query: String::new(),
                },
            )
            .unwrap();
        state
    }

    #[test]
    fn test_window_partitions() {
        let mut st = state(100);
        let mut columns = st.columns.clone();
        columns[2].locked = true;
        st.propagate(StateUpdate::columns(columns));

        let mut vp = Viewport::new(300.0, 200.0);
        vp.clamp_scroll(&st.layout());
        let window = render_window(&st, &vp, &Untranslated);

        assert_eq!(window.fixed_column_count, 2);
        assert_eq!(window.rows.start, 1);
        // index + c2 in the fixed pane for every row
        assert_eq!(window.fixed.len(), window.rows.len() * 2);
        assert_eq!(window.header[0].column, None);
        assert_eq!(window.header[1].column.as_deref(), Some("c2"));
        assert!(window.header[1].locked);
        assert!(window.scrolling.iter().all(|c| c.column.as_deref() != Some("c2")));
        assert_eq!(window.fixed[0].view, CellView::Text("0".into()));
    }

    #[test]
    fn test_hidden_locked_column_leaves_pane() {
        let mut st = state(10);
        for column in ["c1", "c3"] {
            st.apply_column_action(crate::grid::ColumnAction::LockColumn { column: column.into() })
                .unwrap();
        }
        st.apply_column_action(crate::grid::ColumnAction::HideColumn { column: "c3".into() })
            .unwrap();

        let window = render_window(&st, &Viewport::new(300.0, 200.0), &Untranslated);
        assert_eq!(window.fixed_column_count, 3);
        assert_eq!(window.frozen_cols, 2);
        assert_eq!(window.fixed.len(), window.rows.len() * window.frozen_cols);
        assert_eq!(window.cols.start, window.frozen_cols);
    }

    #[test]
    fn test_unloaded_rows_reported() {
        let st = state(100);
        let mut vp = Viewport::new(300.0, 2000.0);
        vp.clamp_scroll(&st.layout());
        let window = render_window(&st, &vp, &Untranslated);
        assert!(window.unloaded_rows.contains(&20));
        assert!(!window.unloaded_rows.contains(&19));
    }

    #[test]
    fn test_hidden_sorted_column_has_no_header() {
        let mut st = state(5);
        st.apply_column_action(crate::grid::ColumnAction::SortColumn {
            column: "c1".into(),
            direction: Some(SortDirection::Asc),
        })
        .unwrap();
        st.apply_column_action(crate::grid::ColumnAction::HideColumn { column: "c1".into() })
            .unwrap();
        let vp = Viewport::new(2000.0, 400.0);
        let window = render_window(&st, &vp, &Untranslated);
        assert!(window.header.iter().all(|h| h.column.as_deref() != Some("c1")));
        assert_eq!(st.settings.sort_info, vec![("c1".to_string(), SortDirection::Asc)]);
    }
}
