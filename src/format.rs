//! Raw cell value -> display record
//!
//! Formatting is total: a value that cannot be formatted under the column's
//! settings (non-numeric text in a float column, an unparseable date, a bad
//! format code) is shown as its raw text.

use tracing::trace;

use crate::config::GridConfig;
use crate::numfmt::{format_date_default, parse_date, DateFormat, NumericFormat};
use crate::types::{
    CellView, ColumnDef, ColumnFormat, ColumnKind, DataRecord, DataRow, DataViewerData,
    InstanceSettings, RawRows, RawValue, StringDisplay,
};

/// Settings shared by every cell of one formatting run
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    /// Shown for null/NaN cells unless the column overrides it
    pub nan_display: &'a str,
}

impl<'a> FormatContext<'a> {
    /// Instance setting first, then the configured default
    pub fn new(settings: &'a InstanceSettings, config: &'a GridConfig) -> Self {
        Self {
            nan_display: settings
                .nan_display
                .as_deref()
                .unwrap_or(&config.nan_display),
        }
    }
}

impl Default for FormatContext<'_> {
    fn default() -> Self {
        Self { nan_display: "-" }
    }
}

const ELLIPSIS: char = '…';

/// Format one cell. `raw` is cloned into the record untouched.
pub fn format(
    raw: &RawValue,
    kind: ColumnKind,
    column_format: Option<&ColumnFormat>,
    ctx: &FormatContext<'_>,
) -> DataRecord {
    let default_format = ColumnFormat::default();
    let fmt = column_format.unwrap_or(&default_format);

    let view = if raw.is_missing_for(kind) {
        CellView::Text(fmt.nan_display.as_deref().unwrap_or(ctx.nan_display).to_string())
    } else {
        match kind {
            ColumnKind::Int | ColumnKind::Float => CellView::Text(format_number(raw, kind, fmt)),
            ColumnKind::Date => CellView::Text(format_date(raw, fmt)),
            ColumnKind::String | ColumnKind::Category | ColumnKind::Unknown | ColumnKind::Bool => {
                format_string(raw, &fmt.display)
            }
        }
    };

    DataRecord {
        raw: raw.clone(),
        view,
        style: None,
    }
}

fn format_number(raw: &RawValue, kind: ColumnKind, fmt: &ColumnFormat) -> String {
    let Some(value) = raw.as_f64() else {
        return raw.to_text();
    };

    let compiled = match &fmt.fmt {
        Some(code) => match NumericFormat::parse(code) {
            Some(compiled) => compiled,
            None => {
                trace!(code = %code, "unparseable number format; showing raw value");
                return raw.to_text();
            }
        },
        None => {
            let default_precision = if kind == ColumnKind::Int { 0 } else { 2 };
            let mut compiled = NumericFormat::fixed(fmt.precision.unwrap_or(default_precision));
            compiled.thousands = fmt.thousands;
            compiled.notation = fmt.notation;
            compiled
        }
    };
    compiled.format(value)
}

fn format_date(raw: &RawValue, fmt: &ColumnFormat) -> String {
    let Some(dt) = parse_date(raw) else {
        return raw.to_text();
    };
    match &fmt.fmt {
        Some(code) => match DateFormat::parse(code) {
            Some(compiled) => compiled.format(&dt),
            None => {
                trace!(code = %code, "unparseable date format; showing raw value");
                raw.to_text()
            }
        },
        None => format_date_default(&dt),
    }
}

fn format_string(raw: &RawValue, display: &StringDisplay) -> CellView {
    let text = raw.to_text();
    match display {
        StringDisplay::Plain => CellView::Text(text),
        StringDisplay::Truncate { length } => CellView::Text(truncate(&text, *length)),
        StringDisplay::Link => CellView::Link {
            href: text.clone(),
            text,
        },
        StringDisplay::Html => CellView::Html(text),
    }
}

/// Cut to `length` characters plus an ellipsis; `0` disables truncation
fn truncate(text: &str, length: usize) -> String {
    if length == 0 || text.chars().count() <= length {
        return text.to_string();
    }
    let mut out: String = text.chars().take(length).collect();
    out.push(ELLIPSIS);
    out
}

/// Format one server row into a grid row covering every column
pub fn format_row(
    raw_row: Option<&std::collections::BTreeMap<String, RawValue>>,
    columns: &[ColumnDef],
    settings: &InstanceSettings,
    ctx: &FormatContext<'_>,
) -> DataRow {
    columns
        .iter()
        .map(|col| {
            let record = raw_row
                .and_then(|row| row.get(&col.name))
                .map_or_else(DataRecord::empty, |raw| {
                    format(raw, col.kind, settings.column_format(&col.name), ctx)
                });
            (col.name.clone(), record)
        })
        .collect()
}

/// Format a whole response; server row `i` lands at grid row `i + 1`
pub fn format_rows(
    results: &RawRows,
    columns: &[ColumnDef],
    settings: &InstanceSettings,
    ctx: &FormatContext<'_>,
) -> DataViewerData {
    results
        .iter()
        .map(|(row, raw_row)| (row + 1, format_row(Some(raw_row), columns, settings, ctx)))
        .collect()
}

/// Re-format the cells of one column in place, leaving other cells alone
pub fn reformat_column(
    data: &mut DataViewerData,
    column: &ColumnDef,
    settings: &InstanceSettings,
    ctx: &FormatContext<'_>,
) {
    let column_format = settings.column_format(&column.name);
    for row in data.values_mut() {
        if let Some(record) = row.get_mut(&column.name) {
            let style = record.style.take();
            *record = format(&record.raw, column.kind, column_format, ctx);
            record.style = style;
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
    use crate::numfmt::Notation;

    fn text(record: &DataRecord) -> &str {
        record.view.text()
    }

    #[test]
    fn test_default_precision() {
        let ctx = FormatContext::default();
        let r = format(&RawValue::Float(1.23456), ColumnKind::Float, None, &ctx);
        assert_eq!(text(&r), "1.23");
        let r = format(&RawValue::Int(42), ColumnKind::Int, None, &ctx);
        assert_eq!(text(&r), "42");
    }

    #[test]
    fn test_nan_token() {
        let ctx = FormatContext::default();
        assert_eq!(text(&format(&RawValue::Float(f64::NAN), ColumnKind::Float, None, &ctx)), "-");
        assert_eq!(text(&format(&RawValue::Null, ColumnKind::Int, None, &ctx)), "-");
        let ctx = FormatContext { nan_display: "nan" };
        assert_eq!(
            text(&format(&RawValue::String("NaN".into()), ColumnKind::Float, None, &ctx)),
            "nan"
        );
        let fmt = ColumnFormat {
            nan_display: Some("?".into()),
            ..ColumnFormat::default()
        };
        assert_eq!(text(&format(&RawValue::Null, ColumnKind::Float, Some(&fmt), &ctx)), "?");
    }

    #[test]
    fn test_notation_and_thousands() {
        let ctx = FormatContext::default();
        let fmt = ColumnFormat {
            precision: Some(1),
            thousands: true,
            ..ColumnFormat::default()
        };
        let r = format(&RawValue::Float(1_234_567.21), ColumnKind::Float, Some(&fmt), &ctx);
        assert_eq!(text(&r), "1,234,567.2");

        let fmt = ColumnFormat {
            precision: Some(2),
            notation: Notation::Scientific,
            ..ColumnFormat::default()
        };
        let r = format(&RawValue::Int(1_500_000), ColumnKind::Int, Some(&fmt), &ctx);
        assert_eq!(text(&r), "1.50e+6");
    }

    #[test]
    fn test_bad_number_format_passthrough() {
        let ctx = FormatContext::default();
        let fmt = ColumnFormat {
            fmt: Some("garbage".into()),
            ..ColumnFormat::default()
        };
        let r = format(&RawValue::Float(1.5), ColumnKind::Float, Some(&fmt), &ctx);
        assert_eq!(text(&r), "1.5");
        let r = format(&RawValue::String("abc".into()), ColumnKind::Float, None, &ctx);
        assert_eq!(text(&r), "abc");
    }

    #[test]
    fn test_date_passthrough() {
        let ctx = FormatContext::default();
        let r = format(&RawValue::String("soon".into()), ColumnKind::Date, None, &ctx);
        assert_eq!(text(&r), "soon");
        assert_eq!(r.raw, RawValue::String("soon".into()));
    }

    #[test]
    fn test_truncate_link_html() {
        let ctx = FormatContext::default();
        let raw = RawValue::String("abcdefgh".into());
        let fmt = ColumnFormat {
            display: StringDisplay::Truncate { length: 3 },
            ..ColumnFormat::default()
        };
        let r = format(&raw, ColumnKind::String, Some(&fmt), &ctx);
        assert_eq!(text(&r), "abc…");
        assert_eq!(r.title().as_deref(), Some("abcdefgh"));

        let fmt = ColumnFormat {
            display: StringDisplay::Link,
            ..ColumnFormat::default()
        };
        let r = format(&RawValue::String("https://x.io".into()), ColumnKind::String, Some(&fmt), &ctx);
        assert_eq!(
            r.view,
            CellView::Link {
                href: "https://x.io".into(),
                text: "https://x.io".into()
            }
        );
        // link display is ignored for numeric columns
        let r = format(&RawValue::Int(7), ColumnKind::Int, Some(&fmt), &ctx);
        assert_eq!(r.view, CellView::Text("7".into()));
    }

    #[test]
    fn test_rows_shift_and_fill() {
        let columns = vec![ColumnDef::new("a", "int64"), ColumnDef::new("b", "object")];
        let mut results = RawRows::new();
        results.insert(0, [("a".to_string(), RawValue::Int(1))].into_iter().collect());
        let data = format_rows(
            &results,
            &columns,
            &InstanceSettings::default(),
            &FormatContext::default(),
        );
        assert!(!data.contains_key(&0));
        let row = &data[&1];
        assert_eq!(row["a"].view.text(), "1");
        assert_eq!(row["b"], DataRecord::empty());
    }
}
