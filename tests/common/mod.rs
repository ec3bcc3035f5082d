//! Common test utilities and assertion helpers.
//!
//! Grid construction with deterministic text measurement, plus helpers for
//! checking layout invariants after each propagated update.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::collections::HashMap;

use dtview::grid::{GridState, RequestKind};
use dtview::layout::{Font, TextMeasure};
use dtview::{DataResponse, GridConfig};

// Re-export fixtures for convenience
pub use super::fixtures::*;

// ============================================================================
// Text measurement
// ============================================================================

/// Measurer with fixed widths for chosen strings and a per-char fallback
#[derive(Debug, Clone, Default)]
pub struct FixedMeasure {
    widths: HashMap<String, f32>,
    /// Width returned for every cell text not listed
    pub cell_width: Option<f32>,
    pub per_char: f32,
}

impl FixedMeasure {
    pub fn new() -> Self {
        Self {
            per_char: 7.0,
            ..Self::default()
        }
    }

    pub fn with(mut self, text: &str, width: f32) -> Self {
        self.widths.insert(text.to_string(), width);
        self
    }

    /// Every cell text not listed measures `width`
    pub fn cells(mut self, width: f32) -> Self {
        self.cell_width = Some(width);
        self
    }
}

impl TextMeasure for FixedMeasure {
    fn measure(&self, text: &str, font: Font) -> f32 {
        if let Some(w) = self.widths.get(text) {
            return *w;
        }
        match (font, self.cell_width) {
            (Font::Cell, Some(w)) => w,
            _ => text.chars().count() as f32 * self.per_char,
        }
    }
}

// ============================================================================
// Grid helpers
// ============================================================================

/// Apply `response` to a fresh grid with the default measurer
pub fn load(response: DataResponse) -> GridState {
    load_with(GridState::default(), response)
}

/// Apply `response` to `grid` under a fresh token
pub fn load_with(mut grid: GridState, response: DataResponse) -> GridState {
    let token = grid.begin_request(RequestKind::Data);
    grid.apply_data_response(token, response)
        .expect("data response applies");
    grid
}

/// Grid measuring text with `measure`
pub fn grid_with(config: GridConfig, measure: FixedMeasure) -> GridState {
    GridState::with_measure(config, Box::new(measure))
}

pub fn width_of(grid: &GridState, column: &str) -> f32 {
    grid.column(column)
        .unwrap_or_else(|| panic!("no column {column}"))
        .width
}

pub fn column_names(grid: &GridState) -> Vec<&str> {
    grid.columns.iter().map(|c| c.name.as_str()).collect()
}

/// `fixed_column_count` must always be locked + 1
pub fn assert_fixed_count(grid: &GridState) {
    let locked = grid.columns.iter().filter(|c| c.locked).count();
    assert_eq!(
        grid.fixed_column_count,
        locked + 1,
        "fixed_column_count out of sync with {locked} locked columns"
    );
}
