//! Viewport state and virtualization math.

use std::ops::Range;

use super::GridLayout;

/// The visible area of the grid.
///
/// Scroll positions are in grid coordinates and start at the frozen boundary:
/// `scroll_x == frozen_cols_width()` shows the first unlocked column right
/// after the fixed pane.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
        }
    }

    /// Visible data rows (grid rows, header excluded)
    pub fn visible_rows(&self, layout: &GridLayout) -> Range<usize> {
        if layout.row_count == 0 {
            return 1..1;
        }
        let scrollable_height = (self.height - layout.frozen_rows_height()).max(0.0);
        let top = self.scroll_y.max(layout.frozen_rows_height());
        let start = layout.row_at_y(top).max(1);
        let end = layout.row_at_y(top + scrollable_height).max(start);
        start..end + 1
    }

    /// Visible scrolling layout columns (frozen columns excluded)
    pub fn visible_cols(&self, layout: &GridLayout) -> Range<usize> {
        let col_count = layout.col_count();
        if layout.frozen_cols >= col_count {
            return col_count..col_count;
        }
        let frozen_width = layout.frozen_cols_width();
        let scrollable_width = (self.width - frozen_width).max(0.0);
        let left = self.scroll_x.max(frozen_width);
        let start = layout
            .col_at_x(left)
            .unwrap_or(layout.frozen_cols)
            .max(layout.frozen_cols);
        let end = layout
            .col_at_x(left + scrollable_width)
            .unwrap_or(col_count - 1)
            .max(start);
        start..end + 1
    }

    /// Grid coordinates of a cell to screen coordinates, honoring frozen panes.
    ///
    /// Frozen cells render at their natural position; scrolling cells render
    /// at `frozen_size + (pos - scroll)`.
    pub fn to_screen_frozen(&self, x: f32, y: f32, row: usize, col: usize, layout: &GridLayout) -> (f32, f32) {
        let screen_x = if col < layout.frozen_cols {
            x
        } else {
            layout.frozen_cols_width() + (x - self.scroll_x)
        };
        let screen_y = if row == 0 {
            y
        } else {
            layout.frozen_rows_height() + (y - self.scroll_y)
        };
        (screen_x, screen_y)
    }

    /// Clamp scroll position to the scrollable range
    pub fn clamp_scroll(&mut self, layout: &GridLayout) {
        let frozen_width = layout.frozen_cols_width();
        let frozen_height = layout.frozen_rows_height();

        let scrollable_width = layout.total_width() - frozen_width;
        let scrollable_height = layout.total_height() - frozen_height;
        let viewport_content_width = self.width - frozen_width;
        let viewport_content_height = self.height - frozen_height;

        let max_x = frozen_width + (scrollable_width - viewport_content_width).max(0.0);
        let max_y = frozen_height + (scrollable_height - viewport_content_height).max(0.0);

        self.scroll_x = self.scroll_x.clamp(frozen_width, max_x);
        self.scroll_y = self.scroll_y.clamp(frozen_height, max_y);
    }

    pub fn scroll_by(&mut self, delta_x: f32, delta_y: f32, layout: &GridLayout) {
        self.scroll_x += delta_x;
        self.scroll_y += delta_y;
        self.clamp_scroll(layout);
    }

    pub fn set_scroll(&mut self, x: f32, y: f32, layout: &GridLayout) {
        self.scroll_x = x;
        self.scroll_y = y;
        self.clamp_scroll(layout);
    }

    /// Scroll so grid row `row` is the first visible data row
    pub fn scroll_to_row(&mut self, row: usize, layout: &GridLayout) {
        self.scroll_y = layout.row_top(row.max(1));
        self.clamp_scroll(layout);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
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
    use crate::types::ColumnDef;

    fn layout(n_cols: usize, locked: usize, rows: usize) -> GridLayout {
        let cols: Vec<ColumnDef> = (0..n_cols)
            .map(|i| {
                let mut c = ColumnDef::new(format!("c{i}"), "int64");
                c.width = 100.0;
                c.locked = i < locked;
                c
            })
            .collect();
        GridLayout::new(&cols, 50.0, 25.0, 25.0, rows)
    }

    #[test]
    fn test_visible_window_at_origin() {
        let layout = layout(20, 1, 1000);
        let mut vp = Viewport::new(400.0, 125.0);
        vp.clamp_scroll(&layout);
        assert_eq!(vp.scroll_x, 150.0);
        assert_eq!(vp.scroll_y, 25.0);
        assert_eq!(vp.visible_rows(&layout), 1..6);
        // 250px of scrolling room after the 150px fixed pane
        assert_eq!(vp.visible_cols(&layout), 2..5);
    }

    #[test]
    fn test_scrolled_window() {
        let layout = layout(20, 1, 1000);
        let mut vp = Viewport::new(400.0, 125.0);
        vp.set_scroll(350.0, 25.0 + 25.0 * 10.0, &layout);
        assert_eq!(vp.visible_rows(&layout).start, 11);
        assert_eq!(vp.visible_cols(&layout).start, 4);
        let (sx, sy) = vp.to_screen_frozen(350.0, 275.0, 11, 4, &layout);
        assert_eq!((sx, sy), (150.0, 25.0));
        let (sx, _) = vp.to_screen_frozen(50.0, 0.0, 0, 1, &layout);
        assert_eq!(sx, 50.0);
    }

    #[test]
    fn test_empty_grid() {
        let layout = layout(3, 3, 0);
        let vp = Viewport::new(400.0, 300.0);
        assert!(vp.visible_rows(&layout).is_empty());
        assert!(vp.visible_cols(&layout).is_empty());
    }

    #[test]
    fn test_clamp_to_end() {
        let layout = layout(5, 0, 10);
        let mut vp = Viewport::new(300.0, 100.0);
        vp.set_scroll(1e6, 1e6, &layout);
        // total 550 wide, 50 frozen; 250 of content room
        assert_eq!(vp.scroll_x, 300.0);
        // total 275 tall, 25 frozen; 75 of content room
        assert_eq!(vp.scroll_y, 200.0);
    }
}
