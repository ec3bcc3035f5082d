//! Content-driven column widths and row heights.
//!
//! Widths come from the widest of the header label (including the sort glyph
//! and background-mode icon) and a sample of formatted cells. Columns a user
//! has resized, and hidden columns, keep their width.

use tracing::trace;

use super::measure::{Font, TextMeasure};
use crate::background::header_icon;
use crate::config::GridConfig;
use crate::types::{
    sort_direction, BackgroundMode, ColumnDef, DataViewerData, InstanceSettings, SortDirection,
};

/// Everything sizing reads besides columns and data
#[derive(Clone, Copy)]
pub struct SizingContext<'a> {
    pub sort_info: &'a [(String, SortDirection)],
    pub background_mode: &'a BackgroundMode,
    pub vertical_headers: bool,
    pub config: &'a GridConfig,
    pub measure: &'a dyn TextMeasure,
}

impl<'a> SizingContext<'a> {
    pub fn new(
        settings: &'a InstanceSettings,
        config: &'a GridConfig,
        measure: &'a dyn TextMeasure,
    ) -> Self {
        Self {
            sort_info: &settings.sort_info,
            background_mode: &settings.background_mode,
            vertical_headers: settings.vertical_headers,
            config,
            measure,
        }
    }
}

/// Header text: mode icon, name, sort glyph
pub fn header_label(
    column: &ColumnDef,
    sort_info: &[(String, SortDirection)],
    mode: &BackgroundMode,
) -> String {
    let mut label = String::with_capacity(column.name.len() + 4);
    if let Some(icon) = header_icon(column, mode) {
        label.push(icon);
        label.push(' ');
    }
    label.push_str(&column.name);
    if let Some(dir) = sort_direction(sort_info, &column.name) {
        label.push(' ');
        label.push(dir.glyph());
    }
    label
}

/// Widest formatted cell among the first `sample_rows` loaded rows
fn sampled_content_width(
    column: &ColumnDef,
    data: &DataViewerData,
    row_count: usize,
    ctx: &SizingContext<'_>,
) -> f32 {
    if row_count == 0 {
        return 0.0;
    }
    data.range(1..=row_count)
        .take(ctx.config.sample_rows)
        .filter_map(|(_, row)| row.get(&column.name))
        .map(|record| ctx.measure.measure(record.view.text(), Font::Cell))
        .fold(0.0, f32::max)
}

/// Auto width for one column
pub fn auto_width(
    column: &ColumnDef,
    data: &DataViewerData,
    row_count: usize,
    ctx: &SizingContext<'_>,
) -> f32 {
    let config = ctx.config;
    let header = if ctx.vertical_headers {
        // rotated labels only take one line of horizontal space
        config.header_line_height
    } else {
        let label = header_label(column, ctx.sort_info, ctx.background_mode);
        ctx.measure.measure(&label, Font::Header)
    };
    let content = sampled_content_width(column, data, row_count, ctx);

    let mut width = (header.max(content) + config.cell_padding).max(config.min_column_width);
    if let Some(max) = config.max_column_width {
        width = width.min(max);
    }
    width.max(config.resize_floor).ceil()
}

/// Recompute widths for every auto-sized visible column.
///
/// Resized and hidden columns come back unchanged. Running it twice on the
/// same inputs gives the same widths.
pub fn recompute_layout(
    columns: &[ColumnDef],
    data: &DataViewerData,
    row_count: usize,
    ctx: &SizingContext<'_>,
) -> Vec<ColumnDef> {
    let recomputed: Vec<ColumnDef> = columns
        .iter()
        .map(|col| {
            if col.resized || !col.visible {
                return col.clone();
            }
            ColumnDef {
                width: auto_width(col, data, row_count, ctx),
                ..col.clone()
            }
        })
        .collect();
    trace!(columns = recomputed.len(), row_count, "recomputed column widths");
    recomputed
}

/// Width of the implicit index column, sized for the largest row number
#[allow(clippy::cast_precision_loss)]
pub fn index_width(row_count: usize, config: &GridConfig, measure: &dyn TextMeasure) -> f32 {
    let digits = row_count.saturating_sub(1).to_string();
    (measure.measure(&digits, Font::Cell) + config.cell_padding)
        .max(config.index_min_width)
        .ceil()
}

/// Height of grid row `row` (0 is the header)
#[allow(clippy::cast_precision_loss)]
pub fn row_height(row: usize, columns: &[ColumnDef], ctx: &SizingContext<'_>) -> f32 {
    let config = ctx.config;
    if row > 0 {
        return config.row_height;
    }

    let labels = columns.iter().filter(|c| c.visible).map(|c| {
        let label = header_label(c, ctx.sort_info, ctx.background_mode);
        (c, ctx.measure.measure(&label, Font::Header))
    });

    let height = if ctx.vertical_headers {
        let longest = labels.map(|(_, w)| w).fold(0.0, f32::max);
        (longest + config.vertical_header_padding).max(config.row_height)
    } else {
        let lines = labels
            .map(|(c, w)| {
                let room = (c.width - config.cell_padding).max(1.0);
                (w / room).ceil().max(1.0)
            })
            .fold(1.0, f32::max);
        config.row_height + (lines - 1.0) * config.header_line_height
    };

    let bounded = match config.max_row_height {
        Some(max) => height.min(max).max(config.row_height.min(max)),
        None => height,
    };
    bounded.ceil()
}

/// Frozen-pane boundary: locked columns plus the index column
pub fn fixed_column_count(columns: &[ColumnDef]) -> usize {
    columns.iter().filter(|c| c.locked).count() + 1
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
    use crate::layout::measure::CharWidthMeasure;
    use crate::types::{CellView, DataRecord, RawValue};

    fn data_for(col: &str, texts: &[&str]) -> DataViewerData {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let record = DataRecord {
                    raw: RawValue::String((*t).to_string()),
                    view: CellView::Text((*t).to_string()),
                    style: None,
                };
                (i + 1, [(col.to_string(), record)].into_iter().collect())
            })
            .collect()
    }

    #[test]
    fn test_header_label_glyphs() {
        let mut col = ColumnDef::new("col4", "float64");
        col.has_missing = Some(1);
        let sort = vec![("col4".to_string(), SortDirection::Desc)];
        assert_eq!(header_label(&col, &sort, &BackgroundMode::None), "col4 ▼");
        assert_eq!(header_label(&col, &sort, &BackgroundMode::Missing), "⚠ col4 ▼");
    }

    #[test]
    fn test_content_drives_width() {
        let config = GridConfig::default();
        let measure = CharWidthMeasure::new(7.0, 8.0);
        let settings = InstanceSettings::default();
        let ctx = SizingContext::new(&settings, &config, &measure);
        let cols = vec![ColumnDef::new("a", "object")];
        let data = data_for("a", &["x", "twenty characters!!!"]);
        let out = recompute_layout(&cols, &data, 2, &ctx);
        // 20 chars * 7 + 16 padding
        assert_eq!(out[0].width, 156.0);
    }

    #[test]
    fn test_sort_glyph_widens_header() {
        let config = GridConfig::default();
        let measure = CharWidthMeasure::new(7.0, 8.0);
        let mut settings = InstanceSettings::default();
        let cols = vec![ColumnDef::new("a_long_header_name", "int64")];
        let data = data_for("a_long_header_name", &["1"]);
        let before = recompute_layout(&cols, &data, 1, &SizingContext::new(&settings, &config, &measure));
        settings.sort_info = vec![("a_long_header_name".to_string(), SortDirection::Asc)];
        let after = recompute_layout(&cols, &data, 1, &SizingContext::new(&settings, &config, &measure));
        assert_eq!(after[0].width - before[0].width, 16.0);
    }

    #[test]
    fn test_vertical_header_height() {
        let config = GridConfig {
            max_row_height: Some(100.0),
            ..GridConfig::default()
        };
        let measure = CharWidthMeasure::new(7.0, 8.0);
        let settings = InstanceSettings {
            vertical_headers: true,
            ..InstanceSettings::default()
        };
        let ctx = SizingContext::new(&settings, &config, &measure);
        let cols = vec![ColumnDef::new("abcdef", "int64")];
        // 6 * 8 + 15
        assert_eq!(row_height(0, &cols, &ctx), 63.0);
        assert_eq!(row_height(5, &cols, &ctx), 25.0);

        let cols = vec![ColumnDef::new("x".repeat(40), "int64")];
        assert_eq!(row_height(0, &cols, &ctx), 100.0);
    }

    #[test]
    fn test_wrapped_header_height() {
        let config = GridConfig::default();
        let measure = CharWidthMeasure::new(7.0, 8.0);
        let settings = InstanceSettings::default();
        let ctx = SizingContext::new(&settings, &config, &measure);
        let mut col = ColumnDef::new("abcdefghij", "int64");
        col.width = 56.0; // 40px of room for an 80px label
        assert_eq!(row_height(0, &[col], &ctx), 40.0);
    }

    #[test]
    fn test_index_width() {
        let config = GridConfig::default();
        let measure = CharWidthMeasure::new(7.0, 8.0);
        assert_eq!(index_width(0, &config, &measure), 35.0);
        assert_eq!(index_width(100_001, &config, &measure), 58.0);
    }
}
