//! dtview - grid engine for a browser dataframe explorer
//!
//! Turns server responses (rows plus column metadata) into a virtualized,
//! styled and sized grid, compiled to WebAssembly:
//! - dtype classification into column kinds
//! - number and date formatting that keeps the raw value
//! - background modes (dtypes, missing, outliers, low variance, heatmaps)
//! - content-driven column widths and header heights
//! - one update surface for hide/lock/move/resize/sort/rename
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { DataViewer } from 'dtview';
//! await init();
//! const viewer = new DataViewer({ maxColumnWidth: 300 });
//! viewer.setRenderCallback(() => paint(viewer.renderWindow()));
//! const token = viewer.beginDataRequest();
//! viewer.applyDataResponse(token, await (await fetch(url)).text());
//! ```

pub mod background;
pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod grid;
pub mod i18n;
pub mod layout;
pub mod numfmt;
pub mod types;
pub mod view;
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::GridConfig;
pub use error::{DtviewError, Result};
pub use grid::{ColumnAction, GridState, RequestKind, StateUpdate};
pub use view::{render_window, RenderWindow};
pub use viewer::DataViewer;

pub use types::*;

/// Classify a raw dtype string; returns the kind's name (`"int"`, `"date"`, ...)
#[must_use]
#[wasm_bindgen(js_name = classifyDtype)]
pub fn classify_dtype(dtype: &str) -> String {
    classify::classify(dtype).as_str().to_string()
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
