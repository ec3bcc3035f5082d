use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SortDirection;
use crate::error::DtviewError;
use crate::numfmt::Notation;

/// Exclusive cell background mode
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "String", into = "String")]
pub enum BackgroundMode {
    #[default]
    None,
    Dtypes,
    Missing,
    Outliers,
    LowVariance,
    /// Each column scaled to its own range
    HeatmapCol,
    /// One range across every numeric column
    HeatmapTable,
    /// Each row scaled to its own range
    HeatmapRow,
    /// Only the named column is colored
    HeatmapColumn(String),
}

const HEATMAP_COLUMN_PREFIX: &str = "heatmap-col-";

impl BackgroundMode {
    pub fn is_heatmap(&self) -> bool {
        matches!(
            self,
            Self::HeatmapCol | Self::HeatmapTable | Self::HeatmapRow | Self::HeatmapColumn(_)
        )
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Dtypes => f.write_str("dtypes"),
            Self::Missing => f.write_str("missing"),
            Self::Outliers => f.write_str("outliers"),
            Self::LowVariance => f.write_str("lowVariance"),
            Self::HeatmapCol => f.write_str("heatmap-col"),
            Self::HeatmapTable => f.write_str("heatmap-all"),
            Self::HeatmapRow => f.write_str("heatmap-row"),
            Self::HeatmapColumn(name) => write!(f, "{HEATMAP_COLUMN_PREFIX}{name}"),
        }
    }
}

impl FromStr for BackgroundMode {
    type Err = DtviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "dtypes" => Ok(Self::Dtypes),
            "missing" => Ok(Self::Missing),
            "outliers" => Ok(Self::Outliers),
            "lowVariance" => Ok(Self::LowVariance),
            "heatmap-col" => Ok(Self::HeatmapCol),
            "heatmap-all" => Ok(Self::HeatmapTable),
            "heatmap-row" => Ok(Self::HeatmapRow),
            other => match other.strip_prefix(HEATMAP_COLUMN_PREFIX) {
                Some(name) if !name.is_empty() => Ok(Self::HeatmapColumn(name.to_string())),
                _ => Err(DtviewError::BackgroundMode(other.to_string())),
            },
        }
    }
}

impl TryFrom<String> for BackgroundMode {
    type Error = DtviewError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BackgroundMode> for String {
    fn from(mode: BackgroundMode) -> Self {
        mode.to_string()
    }
}

/// How string-like cells are displayed; the choices are exclusive
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum StringDisplay {
    #[default]
    Plain,
    /// Cut to `length` characters and append an ellipsis
    Truncate { length: usize },
    Link,
    Html,
}

/// Per-column format override
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnFormat {
    /// Decimal places; values above [`crate::numfmt::MAX_DECIMALS`] are clamped
    pub precision: Option<usize>,
    pub thousands: bool,
    pub notation: Notation,
    /// numeral-style code for numbers, moment-style code for dates
    pub fmt: Option<String>,
    pub display: StringDisplay,
    /// Overrides the instance-wide NaN token for this column
    pub nan_display: Option<String>,
}

/// Session-scoped settings, as the server hands them over on load
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceSettings {
    pub sort_info: Vec<(String, SortDirection)>,
    pub locked: Vec<String>,
    pub background_mode: BackgroundMode,
    pub column_formats: BTreeMap<String, ColumnFormat>,
    pub column_filters: BTreeMap<String, serde_json::Value>,
    pub outlier_filters: BTreeMap<String, serde_json::Value>,
    pub predefined_filters: BTreeMap<String, serde_json::Value>,
    pub query: Option<String>,
    pub vertical_headers: bool,
    pub nan_display: Option<String>,
}

/// Partial settings; `Some` fields replace the current value
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_info: Option<Vec<(String, SortDirection)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_mode: Option<BackgroundMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_formats: Option<BTreeMap<String, ColumnFormat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_filters: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_filters: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predefined_filters: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_headers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nan_display: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold a later update into this one; later fields win
    pub fn merge(&mut self, later: Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if later.$field.is_some() { self.$field = later.$field; })*
            };
        }
        take!(
            sort_info,
            locked,
            background_mode,
            column_formats,
            column_filters,
            outlier_filters,
            predefined_filters,
            query,
            vertical_headers,
            nan_display
        );
    }
}

impl InstanceSettings {
    /// Apply the `Some` fields of an update
    pub fn apply(&mut self, update: &SettingsUpdate) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = &update.$field { self.$field = value.clone(); })*
            };
        }
        set!(
            sort_info,
            locked,
            background_mode,
            column_formats,
            column_filters,
            outlier_filters,
            predefined_filters,
            vertical_headers
        );
        if let Some(query) = &update.query {
            self.query = Some(query.clone()).filter(|q| !q.is_empty());
        }
        if let Some(nan) = &update.nan_display {
            self.nan_display = Some(nan.clone());
        }
    }

    pub fn column_format(&self, column: &str) -> Option<&ColumnFormat> {
        self.column_formats.get(column)
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

    #[test]
    fn test_background_mode_strings() {
        for s in [
            "",
            "dtypes",
            "missing",
            "outliers",
            "lowVariance",
            "heatmap-col",
            "heatmap-all",
            "heatmap-row",
            "heatmap-col-price",
        ] {
            let mode: BackgroundMode = s.parse().unwrap();
            assert_eq!(mode.to_string(), s);
        }
        assert_eq!(
            "heatmap-col-a-b".parse::<BackgroundMode>().unwrap(),
            BackgroundMode::HeatmapColumn("a-b".into())
        );
        assert!("sparkles".parse::<BackgroundMode>().is_err());
        assert!("heatmap-col-".parse::<BackgroundMode>().is_err());
    }

    #[test]
    fn test_settings_json() {
        let json = r#"{"sortInfo":[["col4","ASC"]],"backgroundMode":"heatmap-all","locked":["a"]}"#;
        let settings: InstanceSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.sort_info, vec![("col4".to_string(), SortDirection::Asc)]);
        assert_eq!(settings.background_mode, BackgroundMode::HeatmapTable);
        assert_eq!(settings.locked, vec!["a".to_string()]);
        assert!(!settings.vertical_headers);
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = SettingsUpdate {
            vertical_headers: Some(true),
            ..SettingsUpdate::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"verticalHeaders":true}"#);
    }

    #[test]
    fn test_apply_and_merge() {
        let mut settings = InstanceSettings::default();
        let mut update = SettingsUpdate {
            query: Some("a > 1".into()),
            ..SettingsUpdate::default()
        };
        update.merge(SettingsUpdate {
            background_mode: Some(BackgroundMode::Dtypes),
            ..SettingsUpdate::default()
        });
        settings.apply(&update);
        assert_eq!(settings.query.as_deref(), Some("a > 1"));
        assert_eq!(settings.background_mode, BackgroundMode::Dtypes);

        settings.apply(&SettingsUpdate {
            query: Some(String::new()),
            ..SettingsUpdate::default()
        });
        assert_eq!(settings.query, None);
    }
}
