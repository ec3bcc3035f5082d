//! Column sizing, pixel layout and viewport management.
//!
//! - Measuring header and cell text
//! - Content-driven column widths and header/row heights
//! - Cumulative column positions with binary-search hit testing
//! - Viewport state (scroll position, visible window, frozen panes)

mod grid_layout;
pub mod measure;
mod sizing;
mod viewport;

pub use grid_layout::{CellRect, GridLayout};
#[cfg(target_arch = "wasm32")]
pub use measure::CanvasMeasure;
pub use measure::{CharWidthMeasure, Font, TextMeasure};
pub use sizing::{
    auto_width, fixed_column_count, header_label, index_width, recompute_layout, row_height,
    SizingContext,
};
pub use viewport::Viewport;
