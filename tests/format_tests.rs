//! Cell formatting tests for dtview
//!
//! Tests for numeric precision, numeral-style format strings, NaN tokens,
//! moment-style date formats and string display modes.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use dtview::format::{format, FormatContext};
use dtview::numfmt::{NumericFormat, MAX_DECIMALS};
use dtview::{CellView, ColumnFormat, ColumnKind, RawValue, StringDisplay};
use test_case::test_case;

fn text(raw: RawValue, kind: ColumnKind, fmt: &ColumnFormat) -> String {
    format(&raw, kind, Some(fmt), &FormatContext::default())
        .view
        .text()
        .to_string()
}

fn precision(n: usize) -> ColumnFormat {
    ColumnFormat {
        precision: Some(n),
        ..ColumnFormat::default()
    }
}

fn code(fmt: &str) -> ColumnFormat {
    ColumnFormat {
        fmt: Some(fmt.to_string()),
        ..ColumnFormat::default()
    }
}

// ============================================================================
// Numbers
// ============================================================================

mod numbers {
    use super::*;
    use test_case::test_case;

    #[test]
    fn fixed_precision_gives_exact_decimals() {
        let values = [0.0, 1.5, -2.25, 1234.5678, 0.000_000_1, 98_765.432_1];
        for n in 0..5 {
            for value in values {
                let out = text(RawValue::Float(value), ColumnKind::Float, &precision(n));
                let decimals = out.split_once('.').map_or(0, |(_, frac)| frac.len());
                assert_eq!(decimals, n, "{value} at precision {n} gave {out}");
            }
        }
    }

    #[test]
    fn precision_clamped_to_max_decimals() {
        let out = text(RawValue::Float(1.5), ColumnKind::Float, &precision(25));
        let decimals = out.split_once('.').map_or(0, |(_, frac)| frac.len());
        assert_eq!(decimals, MAX_DECIMALS);
    }

    #[test]
    fn nan_token_replaces_missing() {
        for raw in [
            RawValue::Null,
            RawValue::Float(f64::NAN),
            RawValue::String("nan".into()),
            RawValue::String("NaT".into()),
        ] {
            assert_eq!(text(raw, ColumnKind::Float, &precision(3)), "-");
        }
        let ctx = FormatContext { nan_display: "N/A" };
        let rec = format(&RawValue::Null, ColumnKind::Int, None, &ctx);
        assert_eq!(rec.view.text(), "N/A");
    }

    #[test_case("0,0.00", 1_234_567.891, "1,234,567.89" ; "thousands")]
    #[test_case("0.000%", 0.125, "12.500%" ; "percent")]
    #[test_case("$0,0.00", 1234.5, "$1,234.50" ; "currency")]
    #[test_case("0.00e+0", 1_234_567.0, "1.23e+6" ; "scientific")]
    #[test_case("0", 41.6, "42" ; "integer")]
    fn numeral_codes(fmt: &str, value: f64, expected: &str) {
        assert_eq!(text(RawValue::Float(value), ColumnKind::Float, &code(fmt)), expected);
    }

    #[test]
    fn bad_code_degrades_to_raw() {
        assert!(NumericFormat::parse("0.0.0").is_none());
        assert_eq!(text(RawValue::Float(1.5), ColumnKind::Float, &code("0.0.0")), "1.5");
    }

    #[test]
    fn int_default_has_no_decimals() {
        let rec = format(&RawValue::Int(1_000_000), ColumnKind::Int, None, &FormatContext::default());
        assert_eq!(rec.view.text(), "1000000");
        let thousands = ColumnFormat {
            thousands: true,
            ..ColumnFormat::default()
        };
        assert_eq!(text(RawValue::Int(1_000_000), ColumnKind::Int, &thousands), "1,000,000");
    }
}

// ============================================================================
// Dates
// ============================================================================

mod dates {
    use super::*;
    use test_case::test_case;

    #[test]
    fn epoch_millis_with_compact_format() {
        let out = text(RawValue::Int(946_684_800_000), ColumnKind::Date, &code("YYYYMMDD"));
        assert_eq!(out, "20000101");
    }

    #[test_case("YYYY-MM-DD", "2021-03-04" ; "iso date")]
    #[test_case("DD/MM/YY HH:mm", "04/03/21 05:06" ; "short")]
    #[test_case("MMM D, YYYY", "Mar 4, 2021" ; "month name")]
    #[test_case("dddd [at] h:mm A", "Thursday at 5:06 AM" ; "literal")]
    fn moment_tokens(fmt: &str, expected: &str) {
        let raw = RawValue::String("2021-03-04 05:06:07".into());
        assert_eq!(text(raw, ColumnKind::Date, &code(fmt)), expected);
    }

    #[test]
    fn default_format_depends_on_time() {
        let ctx = FormatContext::default();
        let midnight = format(&RawValue::String("2000-01-01".into()), ColumnKind::Date, None, &ctx);
        assert_eq!(midnight.view.text(), "2000-01-01");
        let later = format(
            &RawValue::String("2000-01-01T13:30:00Z".into()),
            ColumnKind::Date,
            None,
            &ctx,
        );
        assert_eq!(later.view.text(), "2000-01-01 13:30:00");
    }

    #[test]
    fn unparseable_date_passes_through() {
        let raw = RawValue::String("sometime".into());
        assert_eq!(text(raw, ColumnKind::Date, &code("YYYY")), "sometime");
    }
}

// ============================================================================
// Strings and raw preservation
// ============================================================================

#[test]
fn string_display_modes() {
    let raw = RawValue::String("https://example.com/data".into());
    let ctx = FormatContext::default();
    let link = ColumnFormat {
        display: StringDisplay::Link,
        ..ColumnFormat::default()
    };
    assert_eq!(
        format(&raw, ColumnKind::String, Some(&link), &ctx).view,
        CellView::Link {
            href: "https://example.com/data".into(),
            text: "https://example.com/data".into(),
        }
    );

    let truncate = ColumnFormat {
        display: StringDisplay::Truncate { length: 5 },
        ..ColumnFormat::default()
    };
    let rec = format(&raw, ColumnKind::String, Some(&truncate), &ctx);
    assert_eq!(rec.view.text(), "https…");
    assert_eq!(rec.title().as_deref(), Some("https://example.com/data"));
}

#[test]
fn text_columns_keep_token_like_strings() {
    let plain = ColumnFormat::default();
    for token in ["None", "null", "NaT", "<NA>"] {
        let raw = RawValue::String(token.into());
        assert_eq!(text(raw.clone(), ColumnKind::String, &plain), token);
        assert_eq!(text(raw, ColumnKind::Category, &plain), token);
    }
    assert_eq!(text(RawValue::String("nan".into()), ColumnKind::String, &plain), "-");
    assert_eq!(text(RawValue::Null, ColumnKind::Category, &plain), "-");
    assert_eq!(text(RawValue::String("None".into()), ColumnKind::Date, &plain), "-");
}

#[test]
fn raw_is_never_modified() {
    let ctx = FormatContext::default();
    let cases = [
        (RawValue::Float(1.234_56), ColumnKind::Float),
        (RawValue::Int(-7), ColumnKind::Int),
        (RawValue::Int(946_684_800_000), ColumnKind::Date),
        (RawValue::String("x".repeat(50)), ColumnKind::String),
        (RawValue::Bool(true), ColumnKind::Bool),
        (RawValue::Null, ColumnKind::Float),
    ];
    for (raw, kind) in cases {
        for fmt in [precision(0), code("0.0%"), code("YYYY"), ColumnFormat::default()] {
            assert_eq!(format(&raw, kind, Some(&fmt), &ctx).raw, raw);
        }
    }
}
