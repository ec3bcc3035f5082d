use serde::{Deserialize, Serialize};

use super::{ColumnDef, RawRows};

/// Payload of the data-fetch interface
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DataResponse {
    /// Present when the column set changed (first load, filter, rename)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnDef>>,
    /// Server row index -> column -> raw value
    #[serde(default)]
    pub results: RawRows,
    /// Row count after filtering
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub final_query: String,
}

/// Payload of the dtype-fetch interface
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DtypesResponse {
    #[serde(default)]
    pub dtypes: Vec<ColumnDef>,
}
