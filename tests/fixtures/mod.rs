//! Test fixtures for building server payloads in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::ResponseBuilder;
//!
//! let response = ResponseBuilder::new()
//!     .column("id", "int64")
//!     .column("label", "object")
//!     .row(vec![RawValue::Int(1), RawValue::String("a".into())])
//!     .build();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use dtview::{ColumnDef, DataResponse, DtypesResponse, RawRows, RawValue};

// ============================================================================
// Data response builder
// ============================================================================

/// Builder for a `DataResponse` with positional rows
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<RawValue>>,
    total: Option<usize>,
    first_row: usize,
    with_columns: bool,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            with_columns: true,
            ..Self::default()
        }
    }

    /// Chunk response: rows only, starting at server row `first_row`
    pub fn chunk(columns: &[&str], first_row: usize) -> Self {
        Self {
            columns: columns.iter().map(|n| ColumnDef::new(*n, "object")).collect(),
            first_row,
            ..Self::default()
        }
    }

    pub fn column(mut self, name: &str, dtype: &str) -> Self {
        let mut col = ColumnDef::new(name, dtype);
        col.index = self.columns.len();
        self.columns.push(col);
        self
    }

    /// Add a column with server statistics
    pub fn stats_column(mut self, name: &str, dtype: &str, min: f64, max: f64) -> Self {
        let mut col = ColumnDef::new(name, dtype);
        col.index = self.columns.len();
        col.min = Some(min);
        col.max = Some(max);
        self.columns.push(col);
        self
    }

    pub fn row(mut self, values: Vec<RawValue>) -> Self {
        self.rows.push(values);
        self
    }

    /// Add `count` rows produced by `f(row_index)`
    pub fn rows(mut self, count: usize, f: impl Fn(usize) -> Vec<RawValue>) -> Self {
        self.rows.extend((0..count).map(f));
        self
    }

    /// Total row count reported by the server (defaults to the rows given)
    pub fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn build(self) -> DataResponse {
        let mut results = RawRows::new();
        for (offset, values) in self.rows.into_iter().enumerate() {
            let row = self
                .columns
                .iter()
                .zip(values)
                .map(|(col, value)| (col.name.clone(), value))
                .collect();
            results.insert(self.first_row + offset, row);
        }
        let total = self.total.unwrap_or(self.first_row + results.len());
        DataResponse {
            columns: self.with_columns.then_some(self.columns),
            results,
            total,
            final_query: String::new(),
        }
    }
}

// ============================================================================
// Dtypes response builder
// ============================================================================

/// Builder for a `DtypesResponse`
#[derive(Debug, Default)]
pub struct DtypesBuilder {
    dtypes: Vec<ColumnDef>,
}

impl DtypesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column entry; `f` fills in statistics
    pub fn column(mut self, name: &str, dtype: &str, f: impl FnOnce(&mut ColumnDef)) -> Self {
        let mut col = ColumnDef::new(name, dtype);
        col.index = self.dtypes.len();
        f(&mut col);
        self.dtypes.push(col);
        self
    }

    pub fn build(self) -> DtypesResponse {
        DtypesResponse { dtypes: self.dtypes }
    }
}

/// Five-column frame used across the suites: `col1`..`col5`
pub fn sample_response(rows: usize) -> DataResponse {
    ResponseBuilder::new()
        .column("col1", "int64")
        .column("col2", "float64")
        .column("col3", "object")
        .column("col4", "datetime64[ns]")
        .column("col5", "category")
        .rows(rows, |r| {
            let n = i64::try_from(r).unwrap();
            vec![
                RawValue::Int(n),
                RawValue::Float(n as f64 * 2.5),
                RawValue::String(format!("row {r}")),
                RawValue::Int(946_684_800_000 + n * 86_400_000),
                RawValue::String(if r % 2 == 0 { "even" } else { "odd" }.to_string()),
            ]
        })
        .build()
}
