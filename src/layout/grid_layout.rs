//! Pre-computed pixel layout for the grid.
//!
//! Layout column 0 is the implicit index column, followed by the visible
//! columns in column-list order. Grid row 0 is the header. Column positions
//! are cumulative so hit testing is a binary search; rows have uniform height
//! below the header, so row math is arithmetic.

use crate::types::ColumnDef;

/// Pixel layout of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    /// Cumulative column positions (`col_positions[i]` = x of column i's left edge)
    pub col_positions: Vec<f32>,
    pub col_widths: Vec<f32>,
    /// Column names per layout column; `None` for the index column
    pub col_names: Vec<Option<String>>,
    pub header_height: f32,
    pub row_height: f32,
    /// Data rows (header excluded)
    pub row_count: usize,
    /// Index column plus visible locked columns
    pub frozen_cols: usize,
}

/// Rectangle of one cell in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl GridLayout {
    /// Build from the column list; hidden columns are left out
    pub fn new(
        columns: &[ColumnDef],
        index_width: f32,
        header_height: f32,
        row_height: f32,
        row_count: usize,
    ) -> Self {
        let visible: Vec<&ColumnDef> = columns.iter().filter(|c| c.visible).collect();

        let mut col_positions = Vec::with_capacity(visible.len() + 2);
        let mut col_widths = Vec::with_capacity(visible.len() + 1);
        let mut col_names = Vec::with_capacity(visible.len() + 1);
        let mut x: f32 = 0.0;

        col_positions.push(x);
        col_widths.push(index_width);
        col_names.push(None);
        x += index_width;

        for col in &visible {
            col_positions.push(x);
            col_widths.push(col.width);
            col_names.push(Some(col.name.clone()));
            x += col.width;
        }
        col_positions.push(x); // Final edge

        let frozen_cols = visible.iter().filter(|c| c.locked).count() + 1;

        Self {
            col_positions,
            col_widths,
            col_names,
            header_height,
            row_height,
            row_count,
            frozen_cols,
        }
    }

    /// Layout columns including the index column
    pub fn col_count(&self) -> usize {
        self.col_widths.len()
    }

    pub fn column_name(&self, col: usize) -> Option<&str> {
        self.col_names.get(col).and_then(|n| n.as_deref())
    }

    /// Layout column of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.col_names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// Top edge of grid row `row`
    #[allow(clippy::cast_precision_loss)]
    pub fn row_top(&self, row: usize) -> f32 {
        if row == 0 {
            0.0
        } else {
            self.header_height + (row - 1) as f32 * self.row_height
        }
    }

    pub fn row_height(&self, row: usize) -> f32 {
        if row == 0 {
            self.header_height
        } else {
            self.row_height
        }
    }

    pub fn col_width(&self, col: usize) -> f32 {
        self.col_widths.get(col).copied().unwrap_or(0.0)
    }

    /// Cell bounds in grid coordinates
    pub fn cell_rect(&self, row: usize, col: usize) -> CellRect {
        CellRect {
            x: self.col_positions.get(col).copied().unwrap_or(0.0),
            y: self.row_top(row),
            width: self.col_width(col),
            height: self.row_height(row),
        }
    }

    /// Grid row at y position; clamped to the last data row
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn row_at_y(&self, y: f32) -> usize {
        if y < self.header_height || self.row_count == 0 || self.row_height <= 0.0 {
            return 0;
        }
        let offset = ((y - self.header_height) / self.row_height).floor() as usize;
        (offset + 1).min(self.row_count)
    }

    /// Find column at x position (binary search)
    pub fn col_at_x(&self, x: f32) -> Option<usize> {
        if self.col_widths.is_empty() {
            return None;
        }
        let last = self.col_widths.len() - 1;
        let idx = match self
            .col_positions
            .binary_search_by(|pos| pos.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        Some(idx.min(last))
    }

    pub fn total_width(&self) -> f32 {
        self.col_positions.last().copied().unwrap_or(0.0)
    }

    pub fn total_height(&self) -> f32 {
        self.row_top(self.row_count + 1)
    }

    /// Width of the index column plus visible locked columns
    pub fn frozen_cols_width(&self) -> f32 {
        self.col_positions
            .get(self.frozen_cols)
            .copied()
            .unwrap_or_else(|| self.total_width())
    }

    /// The header row is always frozen
    pub fn frozen_rows_height(&self) -> f32 {
        self.header_height
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

    fn columns() -> Vec<ColumnDef> {
        let mut cols: Vec<ColumnDef> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| {
                let mut c = ColumnDef::new(*n, "int64");
                c.width = 100.0;
                c
            })
            .collect();
        cols[0].locked = true;
        cols[2].visible = false;
        cols
    }

    #[test]
    fn test_positions_skip_hidden() {
        let layout = GridLayout::new(&columns(), 40.0, 30.0, 25.0, 10);
        assert_eq!(layout.col_count(), 4);
        assert_eq!(layout.col_positions, vec![0.0, 40.0, 140.0, 240.0, 340.0]);
        assert_eq!(layout.column_name(0), None);
        assert_eq!(layout.column_name(3), Some("d"));
        assert_eq!(layout.column_index("c"), None);
        assert_eq!(layout.frozen_cols, 2);
        assert_eq!(layout.frozen_cols_width(), 140.0);
    }

    #[test]
    fn test_rows() {
        let layout = GridLayout::new(&columns(), 40.0, 30.0, 25.0, 10);
        assert_eq!(layout.row_top(0), 0.0);
        assert_eq!(layout.row_top(1), 30.0);
        assert_eq!(layout.row_top(3), 80.0);
        assert_eq!(layout.total_height(), 280.0);
        assert_eq!(layout.row_at_y(10.0), 0);
        assert_eq!(layout.row_at_y(30.0), 1);
        assert_eq!(layout.row_at_y(79.0), 2);
        assert_eq!(layout.row_at_y(10_000.0), 10);
    }

    #[test]
    fn test_col_at_x() {
        let layout = GridLayout::new(&columns(), 40.0, 30.0, 25.0, 10);
        assert_eq!(layout.col_at_x(0.0), Some(0));
        assert_eq!(layout.col_at_x(39.0), Some(0));
        assert_eq!(layout.col_at_x(140.0), Some(2));
        assert_eq!(layout.col_at_x(5_000.0), Some(3));
    }
}
