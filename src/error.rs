//! Structured error types for dtview.
//!
//! The formatting and layout paths are total and never return errors; these
//! variants cover the fallible edges (decoding server payloads, user actions
//! naming unknown columns, stale responses).

/// All errors that can occur while feeding the grid engine.
#[derive(Debug, thiserror::Error)]
pub enum DtviewError {
    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An action referenced a column that is not in the column list.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A background mode string could not be parsed.
    #[error("Invalid background mode: {0}")]
    BackgroundMode(String),

    /// A response arrived for a request that has been superseded.
    #[error("Stale response for request {token} (latest issued {latest})")]
    StaleResponse {
        /// Token carried by the response.
        token: u64,
        /// Most recently issued token.
        latest: u64,
    },

    /// I/O error (CLI only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors at the JS boundary.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DtviewError>;

impl From<String> for DtviewError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for DtviewError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<DtviewError> for wasm_bindgen::JsValue {
    fn from(e: DtviewError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
