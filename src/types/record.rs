use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ColumnKind;

/// A cell value exactly as the server sent it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Tokens the server uses for missing values in string payloads
const MISSING_TOKENS: [&str; 6] = ["nan", "NaN", "NaT", "None", "null", "<NA>"];

impl RawValue {
    /// Null, NaN, or one of the server's missing-value tokens
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            Self::String(s) => MISSING_TOKENS.contains(&s.trim()),
            Self::Bool(_) | Self::Int(_) => false,
        }
    }

    /// Missing as seen by a column of `kind`. Text columns only treat
    /// null, NaN and `"nan"` as missing; "None" or "null" there are real text.
    pub fn is_missing_for(&self, kind: ColumnKind) -> bool {
        if kind.is_numeric_or_date() {
            return self.is_missing();
        }
        match self {
            Self::String(s) => s.trim() == "nan",
            _ => self.is_missing(),
        }
    }

    /// Numeric view of the value; numeric strings count, NaN does not
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if !f.is_nan() => Some(*f),
            Self::String(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            _ => None,
        }
    }

    /// Plain text rendering, used for passthrough and tooltips
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
        }
    }
}

/// Rendered form of a cell
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum CellView {
    Text(String),
    Link { href: String, text: String },
    /// Caller-trusted markup, inserted as-is
    Html(String),
}

impl CellView {
    /// The visible text; used for width measurement
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Link { text, .. } | Self::Html(text) => text,
        }
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Inline style attached to a cell
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CellStyle {
    pub fn background(hex: impl Into<String>) -> Self {
        Self {
            background: Some(hex.into()),
            color: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.background.is_none() && self.color.is_none()
    }
}

/// One cell: raw value, formatted view and optional style
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    pub raw: RawValue,
    pub view: CellView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

impl DataRecord {
    /// Placeholder for a cell the server did not send
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tooltip text: the raw value when it differs from what is shown
    pub fn title(&self) -> Option<String> {
        let raw = self.raw.to_text();
        if raw.is_empty() || raw == self.view.text() {
            None
        } else {
            Some(raw)
        }
    }
}

/// Column name -> cell
pub type DataRow = BTreeMap<String, DataRecord>;

/// Grid row -> row; row 0 is the header and never stored
pub type DataViewerData = BTreeMap<usize, DataRow>;

/// Server row -> column name -> raw value
pub type RawRows = BTreeMap<usize, BTreeMap<String, RawValue>>;
