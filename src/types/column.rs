use serde::{Deserialize, Serialize};

use crate::classify::classify;

/// Semantic column kind derived from the raw dtype string
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    String,
    Int,
    Float,
    Bool,
    Date,
    Category,
    #[default]
    Unknown,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    pub fn is_numeric_or_date(self) -> bool {
        self.is_numeric() || self == Self::Date
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Category => "category",
            Self::Unknown => "unknown",
        }
    }
}

/// Sort direction; serialized as the server's `ASC`/`DESC`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Header glyph appended to the column label
    pub fn glyph(self) -> char {
        match self {
            Self::Asc => '▲',
            Self::Desc => '▼',
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Ordered sort list, e.g. `[["col4", "ASC"]]`
pub type SortInfo = Vec<(String, SortDirection)>;

/// Direction a column is sorted in, if any
pub fn sort_direction(sort_info: &[(String, SortDirection)], column: &str) -> Option<SortDirection> {
    sort_info
        .iter()
        .find(|(name, _)| name == column)
        .map(|(_, dir)| *dir)
}

/// Server-computed outlier fences (values outside are outliers)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct OutlierRange {
    pub lower: f64,
    pub upper: f64,
}

/// Outlier fences plus the column extremes, used to scale outlier intensity
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct OutlierScale {
    pub lower: f64,
    pub upper: f64,
    pub min: f64,
    pub max: f64,
}

fn default_true() -> bool {
    true
}

/// One data column as the grid sees it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub name: String,
    pub dtype: String,
    /// Derived from `dtype`; servers never send it
    #[serde(default)]
    pub kind: ColumnKind,
    /// Position in the server's frame
    #[serde(default)]
    pub index: usize,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub width: f32,
    /// Width was set by a drag and is left alone by auto-sizing
    #[serde(default)]
    pub resized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_missing: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_outliers: Option<u64>,
    #[serde(default)]
    pub low_variance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_ct: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_range: Option<OutlierRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_scale: Option<OutlierScale>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Self {
        let dtype = dtype.into();
        Self {
            name: name.into(),
            kind: classify(&dtype),
            dtype,
            index: 0,
            visible: true,
            locked: false,
            width: 0.0,
            resized: false,
            has_missing: None,
            has_outliers: None,
            low_variance: false,
            unique_ct: None,
            min: None,
            max: None,
            outlier_range: None,
            outlier_scale: None,
        }
    }

    /// Re-derive `kind` from `dtype`
    pub fn reclassify(&mut self) {
        self.kind = classify(&self.dtype);
    }

    pub fn has_missing(&self) -> bool {
        self.has_missing.is_some_and(|n| n > 0)
    }

    pub fn has_outliers(&self) -> bool {
        self.has_outliers.is_some_and(|n| n > 0)
    }
}

