//! Raw dtype string -> semantic column kind
//!
//! Dtypes arrive as pandas/numpy names (`int64`, `datetime64[ns]`,
//! `float32`, `object`). Matching is a case-insensitive prefix test on the
//! trimmed string; anything unrecognized maps to [`ColumnKind::Unknown`] so a
//! cell can always be rendered.

use crate::types::ColumnKind;

/// Prefix table; first match wins, so `datetime` must precede `date`.
const PREFIXES: &[(&str, ColumnKind)] = &[
    ("int", ColumnKind::Int),
    ("uint", ColumnKind::Int),
    ("float", ColumnKind::Float),
    ("datetime", ColumnKind::Date),
    ("timestamp", ColumnKind::Date),
    ("date", ColumnKind::Date),
    ("bool", ColumnKind::Bool),
    ("category", ColumnKind::Category),
    ("object", ColumnKind::String),
    ("string", ColumnKind::String),
    ("str", ColumnKind::String),
    ("unicode", ColumnKind::String),
    ("mixed", ColumnKind::String),
];

/// Classify a dtype string. Total and deterministic.
pub fn classify(dtype: &str) -> ColumnKind {
    // pandas nullable dtypes are capitalized (`Int64`, `Float64`)
    let lower = dtype.trim().to_ascii_lowercase();
    PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map_or(ColumnKind::Unknown, |(_, kind)| *kind)
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

    #[test]
    fn test_known_prefixes() {
        assert_eq!(classify("int64"), ColumnKind::Int);
        assert_eq!(classify("uint8"), ColumnKind::Int);
        assert_eq!(classify("Int64"), ColumnKind::Int);
        assert_eq!(classify("float32"), ColumnKind::Float);
        assert_eq!(classify("datetime64[ns]"), ColumnKind::Date);
        assert_eq!(classify("datetime64[ns, UTC]"), ColumnKind::Date);
        assert_eq!(classify("date"), ColumnKind::Date);
        assert_eq!(classify("bool"), ColumnKind::Bool);
        assert_eq!(classify("boolean"), ColumnKind::Bool);
        assert_eq!(classify("category"), ColumnKind::Category);
        assert_eq!(classify("object"), ColumnKind::String);
        assert_eq!(classify("string"), ColumnKind::String);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(classify(""), ColumnKind::Unknown);
        assert_eq!(classify("timedelta64[ns]"), ColumnKind::Unknown);
        assert_eq!(classify("complex128"), ColumnKind::Unknown);
        assert_eq!(classify("period[M]"), ColumnKind::Unknown);
    }

    #[test]
    fn test_idempotent() {
        for dtype in ["int64", "weird", "  Float64 "] {
            assert_eq!(classify(dtype), classify(dtype));
        }
        assert_eq!(classify("  Float64 "), ColumnKind::Float);
    }
}
