//! Cell background styles for the active background mode.
//!
//! Bounds for heatmaps are computed eagerly whenever the mode or the column
//! list changes and carry the mode they were computed for. Styling a cell
//! with bounds stamped for a different mode yields no heatmap color.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::color::{min_max, normalize_value, ColorRamp, Rgb};
use crate::types::{
    BackgroundMode, CellStyle, ColumnDef, ColumnKind, DataRecord, DataViewerData, OutlierScale,
};

/// Result of styling one cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleResult {
    pub style: CellStyle,
    /// Column is flagged under the active mode
    pub highlighted: bool,
    /// CSS class for flagged cells
    pub class: Option<&'static str>,
}

/// Min/max ranges for the heatmap modes, stamped with their mode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackgroundBounds {
    pub mode: BackgroundMode,
    pub table: Option<(f64, f64)>,
    pub columns: BTreeMap<String, (f64, f64)>,
    pub rows: BTreeMap<usize, (f64, f64)>,
}

fn heatmap_candidates(columns: &[ColumnDef]) -> impl Iterator<Item = &ColumnDef> {
    columns.iter().filter(|c| c.visible && c.kind.is_numeric())
}

/// Column range: server statistics when both are present, else loaded values
fn column_range(column: &ColumnDef, data: &DataViewerData) -> Option<(f64, f64)> {
    if let (Some(min), Some(max)) = (column.min, column.max) {
        if min.is_finite() && max.is_finite() {
            return Some((min, max));
        }
    }
    min_max(
        data.values()
            .filter_map(|row| row.get(&column.name))
            .filter_map(|record| record.raw.as_f64()),
    )
}

impl BackgroundBounds {
    /// Compute the bounds `mode` needs
    pub fn compute(mode: &BackgroundMode, columns: &[ColumnDef], data: &DataViewerData) -> Self {
        let mut bounds = Self {
            mode: mode.clone(),
            ..Self::default()
        };

        match mode {
            BackgroundMode::HeatmapCol => {
                for col in heatmap_candidates(columns) {
                    if let Some(range) = column_range(col, data) {
                        bounds.columns.insert(col.name.clone(), range);
                    }
                }
            }
            BackgroundMode::HeatmapColumn(name) => {
                if let Some(col) = heatmap_candidates(columns).find(|c| &c.name == name) {
                    if let Some(range) = column_range(col, data) {
                        bounds.columns.insert(col.name.clone(), range);
                    }
                }
            }
            BackgroundMode::HeatmapTable => {
                let ranges: Vec<(f64, f64)> = heatmap_candidates(columns)
                    .filter_map(|col| column_range(col, data))
                    .collect();
                bounds.table = min_max(ranges.iter().flat_map(|(lo, hi)| [*lo, *hi]));
            }
            BackgroundMode::HeatmapRow => {
                let names: Vec<&str> = heatmap_candidates(columns).map(|c| c.name.as_str()).collect();
                for (row_index, row) in data {
                    let values = names
                        .iter()
                        .filter_map(|name| row.get(*name))
                        .filter_map(|record| record.raw.as_f64());
                    if let Some(range) = min_max(values) {
                        bounds.rows.insert(*row_index, range);
                    }
                }
            }
            _ => {}
        }

        debug!(
            mode = %mode,
            columns = bounds.columns.len(),
            rows = bounds.rows.len(),
            "computed background bounds"
        );
        bounds
    }

    /// Range that applies to one cell under `mode`
    pub fn range_for(&self, mode: &BackgroundMode, column: &str, row: usize) -> Option<(f64, f64)> {
        if &self.mode != mode {
            warn!(stamped = %self.mode, active = %mode, "ignoring bounds computed for another mode");
            return None;
        }
        match mode {
            BackgroundMode::HeatmapCol => self.columns.get(column).copied(),
            BackgroundMode::HeatmapColumn(name) if name == column => self.columns.get(column).copied(),
            BackgroundMode::HeatmapTable => self.table,
            BackgroundMode::HeatmapRow => self.rows.get(&row).copied(),
            _ => None,
        }
    }
}

/// Static palette used by the dtypes mode
pub fn dtype_color(kind: ColumnKind) -> Rgb {
    match kind {
        ColumnKind::Int => Rgb::new(0xD4, 0xE6, 0xF9),
        ColumnKind::Float => Rgb::new(0xD9, 0xEA, 0xD3),
        ColumnKind::Date => Rgb::new(0xFC, 0xE5, 0xCD),
        ColumnKind::Bool => Rgb::new(0xEA, 0xD1, 0xDC),
        ColumnKind::Category => Rgb::new(0xFF, 0xF2, 0xCC),
        ColumnKind::String => Rgb::new(0xEF, 0xEF, 0xEF),
        ColumnKind::Unknown => Rgb::WHITE,
    }
}

/// Header flag glyph for a column under `mode`
pub fn header_icon(column: &ColumnDef, mode: &BackgroundMode) -> Option<char> {
    match mode {
        BackgroundMode::Missing if column.has_missing() => Some('⚠'),
        BackgroundMode::Outliers if column.has_outliers() => Some('★'),
        BackgroundMode::LowVariance if column.low_variance => Some('≈'),
        _ => None,
    }
}

const OUTLIER_HIGH: Rgb = Rgb::new(0xE0, 0x3C, 0x3C);
const OUTLIER_LOW: Rgb = Rgb::new(0x3C, 0x6E, 0xE0);

/// Attach outlier scales to every column with server outlier fences
pub fn compute_outlier_scales(columns: &mut [ColumnDef], data: &DataViewerData) {
    for i in 0..columns.len() {
        let Some(col) = columns.get(i) else { continue };
        let scale = col.outlier_range.and_then(|range| {
            let (min, max) = column_range(col, data)?;
            Some(OutlierScale {
                lower: range.lower,
                upper: range.upper,
                min: min.min(range.lower),
                max: max.max(range.upper),
            })
        });
        if let Some(col) = columns.get_mut(i) {
            col.outlier_scale = scale;
        }
    }
}

/// Shade for a value beyond the fences, stronger the further out it lies
fn outlier_color(value: f64, scale: &OutlierScale) -> Option<Rgb> {
    if value > scale.upper {
        let t = normalize_value(value, scale.upper, scale.max);
        Some(Rgb::WHITE.mix(OUTLIER_HIGH, 0.25 + 0.75 * t))
    } else if value < scale.lower {
        let t = 1.0 - normalize_value(value, scale.min, scale.lower);
        Some(Rgb::WHITE.mix(OUTLIER_LOW, 0.25 + 0.75 * t))
    } else {
        None
    }
}

fn flag(class: &'static str) -> StyleResult {
    StyleResult {
        style: CellStyle::default(),
        highlighted: true,
        class: Some(class),
    }
}

/// Style one cell under the active background mode
pub fn compute_style(
    column: &ColumnDef,
    record: &DataRecord,
    row: usize,
    mode: &BackgroundMode,
    bounds: &BackgroundBounds,
) -> StyleResult {
    match mode {
        BackgroundMode::None => StyleResult::default(),
        BackgroundMode::Dtypes => StyleResult {
            style: CellStyle::background(dtype_color(column.kind).to_hex()),
            ..StyleResult::default()
        },
        BackgroundMode::Missing if column.has_missing() => flag("missing"),
        BackgroundMode::LowVariance if column.low_variance => flag("lowVariance"),
        BackgroundMode::Outliers if column.has_outliers() => {
            let mut result = flag("outliers");
            let shade = column
                .outlier_scale
                .as_ref()
                .zip(record.raw.as_f64())
                .and_then(|(scale, value)| outlier_color(value, scale));
            if let Some(shade) = shade {
                result.style = CellStyle::background(shade.to_hex());
            }
            result
        }
        m if m.is_heatmap() => {
            if !column.kind.is_numeric() || record.raw.is_missing() {
                return StyleResult::default();
            }
            let Some(value) = record.raw.as_f64() else {
                return StyleResult::default();
            };
            let Some((min, max)) = bounds.range_for(mode, &column.name, row) else {
                return StyleResult::default();
            };
            let color = ColorRamp::heatmap().at(normalize_value(value, min, max));
            StyleResult {
                style: CellStyle {
                    background: Some(color.to_hex()),
                    color: Some(color.contrast_text().to_hex()),
                },
                ..StyleResult::default()
            }
        }
        _ => StyleResult::default(),
    }
}

/// Restyle every stored cell; previous styles are dropped wholesale
pub fn apply_styles(
    data: &mut DataViewerData,
    columns: &[ColumnDef],
    mode: &BackgroundMode,
    bounds: &BackgroundBounds,
) {
    for (row_index, row) in data.iter_mut() {
        for col in columns {
            if let Some(record) = row.get_mut(&col.name) {
                let result = compute_style(col, record, *row_index, mode, bounds);
                record.style = Some(result.style).filter(|s| !s.is_empty());
            }
        }
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
    use crate::types::{CellView, OutlierRange, RawValue};

    fn record(v: f64) -> DataRecord {
        DataRecord {
            raw: RawValue::Float(v),
            view: CellView::Text(v.to_string()),
            style: None,
        }
    }

    fn data_with(col: &str, values: &[f64]) -> DataViewerData {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i + 1, [(col.to_string(), record(*v))].into_iter().collect()))
            .collect()
    }

    #[test]
    fn test_heatmap_col_ends() {
        let col = ColumnDef::new("x", "float64");
        let data = data_with("x", &[0.0, 5.0, 10.0]);
        let mode = BackgroundMode::HeatmapCol;
        let bounds = BackgroundBounds::compute(&mode, std::slice::from_ref(&col), &data);
        assert_eq!(bounds.columns["x"], (0.0, 10.0));

        let low = compute_style(&col, &record(0.0), 1, &mode, &bounds);
        assert_eq!(low.style.background.as_deref(), Some("#F8696B"));
        let high = compute_style(&col, &record(10.0), 3, &mode, &bounds);
        assert_eq!(high.style.background.as_deref(), Some("#63BE7B"));
    }

    #[test]
    fn test_server_stats_preferred() {
        let mut col = ColumnDef::new("x", "int64");
        col.min = Some(-100.0);
        col.max = Some(100.0);
        let data = data_with("x", &[1.0, 2.0]);
        let bounds = BackgroundBounds::compute(&BackgroundMode::HeatmapCol, &[col], &data);
        assert_eq!(bounds.columns["x"], (-100.0, 100.0));
    }

    #[test]
    fn test_stale_bounds_ignored() {
        let col = ColumnDef::new("x", "float64");
        let data = data_with("x", &[0.0, 10.0]);
        let bounds = BackgroundBounds::compute(&BackgroundMode::HeatmapCol, std::slice::from_ref(&col), &data);
        let result = compute_style(&col, &record(10.0), 1, &BackgroundMode::HeatmapTable, &bounds);
        assert!(result.style.is_empty());
    }

    #[test]
    fn test_non_numeric_unstyled() {
        let col = ColumnDef::new("s", "object");
        let mode = BackgroundMode::HeatmapTable;
        let bounds = BackgroundBounds {
            mode: mode.clone(),
            table: Some((0.0, 1.0)),
            ..BackgroundBounds::default()
        };
        assert!(compute_style(&col, &record(0.5), 1, &mode, &bounds).style.is_empty());

        let num = ColumnDef::new("n", "float64");
        let missing = DataRecord {
            raw: RawValue::Null,
            ..DataRecord::default()
        };
        assert!(compute_style(&num, &missing, 1, &mode, &bounds).style.is_empty());
    }

    #[test]
    fn test_flag_modes() {
        let mut col = ColumnDef::new("x", "float64");
        col.has_missing = Some(3);
        let result = compute_style(&col, &record(1.0), 1, &BackgroundMode::Missing, &BackgroundBounds::default());
        assert!(result.highlighted);
        assert_eq!(header_icon(&col, &BackgroundMode::Missing), Some('⚠'));
        assert_eq!(header_icon(&col, &BackgroundMode::Outliers), None);

        col.has_missing = Some(0);
        let result = compute_style(&col, &record(1.0), 1, &BackgroundMode::Missing, &BackgroundBounds::default());
        assert!(!result.highlighted);
    }

    #[test]
    fn test_outlier_shading() {
        let mut col = ColumnDef::new("x", "float64");
        col.has_outliers = Some(2);
        col.outlier_range = Some(OutlierRange { lower: 0.0, upper: 10.0 });
        let mut columns = vec![col];
        let data = data_with("x", &[-20.0, 5.0, 30.0]);
        compute_outlier_scales(&mut columns, &data);
        let col = &columns[0];
        let scale = col.outlier_scale.unwrap();
        assert_eq!((scale.min, scale.max), (-20.0, 30.0));

        let mode = BackgroundMode::Outliers;
        let bounds = BackgroundBounds::default();
        let inside = compute_style(col, &record(5.0), 2, &mode, &bounds);
        assert!(inside.highlighted);
        assert!(inside.style.is_empty());
        let high = compute_style(col, &record(30.0), 3, &mode, &bounds);
        assert_eq!(high.style.background.as_deref(), Some(&OUTLIER_HIGH.to_hex()[..]));
        let low = compute_style(col, &record(-20.0), 1, &mode, &bounds);
        assert_eq!(low.style.background.as_deref(), Some(&OUTLIER_LOW.to_hex()[..]));
    }

    #[test]
    fn test_switch_heatmap_to_dtypes_clears_heatmap() {
        let col = ColumnDef::new("x", "float64");
        let columns = vec![col];
        let mut data = data_with("x", &[0.0, 10.0]);
        let mode = BackgroundMode::HeatmapCol;
        let bounds = BackgroundBounds::compute(&mode, &columns, &data);
        apply_styles(&mut data, &columns, &mode, &bounds);
        assert!(data[&1]["x"].style.is_some());

        let mode = BackgroundMode::Dtypes;
        let bounds = BackgroundBounds::compute(&mode, &columns, &data);
        apply_styles(&mut data, &columns, &mode, &bounds);
        let expected = dtype_color(ColumnKind::Float).to_hex();
        for row in data.values() {
            let style = row["x"].style.as_ref().unwrap();
            assert_eq!(style.background.as_deref(), Some(expected.as_str()));
            assert_eq!(style.color, None);
        }
    }
}
