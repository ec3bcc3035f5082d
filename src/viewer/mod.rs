//! Browser-facing viewer.
//!
//! [`DataViewer`] is the object the page holds. The page owns fetching and
//! painting: it asks for request tokens, hands back server payloads as JSON,
//! forwards pointer and scroll events, and paints whatever
//! [`DataViewer::window`] (or `renderWindow` from JavaScript) returns.
//! Whenever the grid layout changes the registered render callback fires.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use js_sys::Function;

use crate::config::GridConfig;
use crate::error::Result;
use crate::grid::{ColumnAction, DragPosition, GridState, RequestKind};
use crate::i18n::TranslationTable;
use crate::layout::{TextMeasure, Viewport};
use crate::types::{DataResponse, DtypesResponse, InstanceSettings, SettingsUpdate};
use crate::view::{render_window, RenderWindow};

/// The main viewer struct exported to JavaScript
#[wasm_bindgen]
pub struct DataViewer {
    grid: GridState,
    viewport: Viewport,
    translations: TranslationTable,
    /// Set by the grid's resize hook, cleared when a frame is requested
    needs_render: Rc<Cell<bool>>,
    #[cfg(target_arch = "wasm32")]
    render_callback: Option<Function>,
    #[cfg(target_arch = "wasm32")]
    settings_callback: Option<Function>,
}

impl DataViewer {
    /// Viewer over a grid measuring text with `measure`
    pub fn with_measure(config: GridConfig, measure: Box<dyn TextMeasure>) -> Self {
        let needs_render = Rc::new(Cell::new(false));
        let mut grid = GridState::with_measure(config, measure);
        let flag = Rc::clone(&needs_render);
        grid.set_resize_hook(move || flag.set(true));

        Self {
            grid,
            viewport: Viewport::default(),
            translations: TranslationTable::default(),
            needs_render,
            #[cfg(target_arch = "wasm32")]
            render_callback: None,
            #[cfg(target_arch = "wasm32")]
            settings_callback: None,
        }
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Replace the session settings
    pub fn load_instance_settings(&mut self, settings: InstanceSettings) {
        self.grid.load_settings(settings);
    }

    /// Issue a token for a data (`dtypes == false`) or dtypes fetch
    pub fn issue_token(&mut self, dtypes: bool) -> u64 {
        self.grid.begin_request(if dtypes {
            RequestKind::Dtypes
        } else {
            RequestKind::Data
        })
    }

    /// Apply a data response given as JSON
    pub fn load_data_json(&mut self, token: u64, json: &str) -> Result<()> {
        let response: DataResponse = serde_json::from_str(json)?;
        self.grid.apply_data_response(token, response)?;
        self.clamp_scroll();
        Ok(())
    }

    /// Apply a dtypes response given as JSON
    pub fn load_dtypes_json(&mut self, token: u64, json: &str) -> Result<()> {
        let response: DtypesResponse = serde_json::from_str(json)?;
        self.grid.apply_dtypes_response(token, response)?;
        self.clamp_scroll();
        Ok(())
    }

    /// Apply a partial settings update given as JSON
    pub fn update_settings_json(&mut self, json: &str) -> Result<SettingsUpdate> {
        let update: SettingsUpdate = serde_json::from_str(json)?;
        let applied = self.grid.apply_settings_update(update);
        self.needs_render.set(true);
        self.clamp_scroll();
        Ok(applied)
    }

    /// Apply a column action given as JSON (`{"type": "HIDE_COLUMN", ...}`)
    pub fn column_action_json(&mut self, json: &str) -> Result<SettingsUpdate> {
        let action: ColumnAction = serde_json::from_str(json)?;
        let update = self.grid.apply_column_action(action)?;
        self.clamp_scroll();
        Ok(update)
    }

    pub fn load_translations_json(&mut self, json: &str) -> Result<()> {
        self.translations = TranslationTable::from_json(json)?;
        self.needs_render.set(true);
        Ok(())
    }

    pub fn begin_drag(&mut self, column: &str, pointer_x: f32) -> Result<()> {
        self.grid.drag_start(column, pointer_x)?;
        self.needs_render.set(true);
        Ok(())
    }

    pub fn move_drag(&mut self, pointer_x: f32) -> Option<DragPosition> {
        let position = self.grid.drag_move(pointer_x);
        if position.is_some() {
            self.needs_render.set(true);
        }
        position
    }

    /// Pointer released anywhere; commits a drag in progress
    pub fn release_pointer(&mut self) -> Option<f32> {
        let width = self.grid.pointer_up();
        self.clamp_scroll();
        width
    }

    pub fn scroll_to(&mut self, x: f32, y: f32) {
        let layout = self.grid.layout();
        self.viewport.set_scroll(x, y, &layout);
        self.needs_render.set(true);
    }

    /// Wheel/trackpad deltas
    pub fn scroll_delta(&mut self, delta_x: f32, delta_y: f32) {
        let layout = self.grid.layout();
        self.viewport.scroll_by(delta_x, delta_y, &layout);
        self.needs_render.set(true);
    }

    /// Bring server row `row` to the top of the scrolling pane
    pub fn reveal_row(&mut self, row: usize) {
        let layout = self.grid.layout();
        self.viewport.scroll_to_row(row + 1, &layout);
        self.needs_render.set(true);
    }

    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        self.viewport.resize(width, height);
        self.clamp_scroll();
        self.needs_render.set(true);
    }

    /// Visible window for the current scroll position
    pub fn window(&self) -> RenderWindow {
        render_window(&self.grid, &self.viewport, &self.translations)
    }

    /// Returns whether a frame was requested since the last call
    pub fn take_needs_render(&self) -> bool {
        self.needs_render.replace(false)
    }

    pub fn pending_settings(&mut self) -> Option<SettingsUpdate> {
        self.grid.take_settings_update()
    }

    fn clamp_scroll(&mut self) {
        let layout = self.grid.layout();
        self.viewport.clamp_scroll(&layout);
    }
}

// ============================================================================
// WASM32 Implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl DataViewer {
    /// Create a viewer. `config` is an optional `GridConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<DataViewer, JsValue> {
        console_error_panic_hook::set_once();

        let config: GridConfig = if config.is_undefined() || config.is_null() {
            GridConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?
        };
        let measure = Box::new(crate::layout::CanvasMeasure::new(&config));
        Ok(Self::with_measure(config, measure))
    }

    /// Replace the session settings (an `InstanceSettings` object)
    #[wasm_bindgen(js_name = loadSettings)]
    pub fn load_settings(&mut self, settings: JsValue) -> std::result::Result<(), JsValue> {
        let settings: InstanceSettings = serde_wasm_bindgen::from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {e}")))?;
        self.load_instance_settings(settings);
        self.flush();
        Ok(())
    }

    /// Token to send along with a data fetch
    #[wasm_bindgen(js_name = beginDataRequest)]
    pub fn begin_data_request(&mut self) -> u64 {
        self.issue_token(false)
    }

    /// Token to send along with a dtypes fetch
    #[wasm_bindgen(js_name = beginDtypesRequest)]
    pub fn begin_dtypes_request(&mut self) -> u64 {
        self.issue_token(true)
    }

    /// Apply a data response. Fails for responses that have been superseded.
    #[wasm_bindgen(js_name = applyDataResponse)]
    pub fn apply_data_response(&mut self, token: u64, json: &str) -> std::result::Result<(), JsValue> {
        self.load_data_json(token, json)?;
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = applyDtypesResponse)]
    pub fn apply_dtypes_response(&mut self, token: u64, json: &str) -> std::result::Result<(), JsValue> {
        self.load_dtypes_json(token, json)?;
        self.flush();
        Ok(())
    }

    /// Apply a partial settings update; returns the update to persist
    #[wasm_bindgen(js_name = updateSettings)]
    pub fn update_settings(&mut self, json: &str) -> std::result::Result<JsValue, JsValue> {
        let update = self.update_settings_json(json)?;
        self.flush();
        to_js(&update)
    }

    #[wasm_bindgen(js_name = columnAction)]
    pub fn column_action(&mut self, json: &str) -> std::result::Result<JsValue, JsValue> {
        let update = self.column_action_json(json)?;
        self.flush();
        to_js(&update)
    }

    #[wasm_bindgen(js_name = setTranslations)]
    pub fn set_translations(&mut self, json: &str) -> std::result::Result<(), JsValue> {
        self.load_translations_json(json)?;
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, column: &str, pointer_x: f32) -> std::result::Result<(), JsValue> {
        self.begin_drag(column, pointer_x)?;
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&mut self, pointer_x: f32) {
        self.move_drag(pointer_x);
        self.flush();
    }

    /// Also call this for pointer releases outside the window
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> Option<f32> {
        let width = self.release_pointer();
        self.flush();
        width
    }

    #[wasm_bindgen(js_name = setScroll)]
    pub fn set_scroll(&mut self, x: f32, y: f32) {
        self.scroll_to(x, y);
        self.flush();
    }

    #[wasm_bindgen(js_name = scrollBy)]
    pub fn scroll_by(&mut self, delta_x: f32, delta_y: f32) {
        self.scroll_delta(delta_x, delta_y);
        self.flush();
    }

    /// Scroll so server row `row` is the first one visible
    #[wasm_bindgen(js_name = scrollToRow)]
    pub fn scroll_to_row(&mut self, row: usize) {
        self.reveal_row(row);
        self.flush();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.resize_viewport(width, height);
        self.flush();
    }

    /// The `RenderWindow` for the current scroll position
    #[wasm_bindgen(js_name = renderWindow)]
    pub fn render_window(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.window())
    }

    /// Current column list
    pub fn columns(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.grid.columns)
    }

    #[wasm_bindgen(js_name = rowCount)]
    pub fn row_count(&self) -> usize {
        self.grid.row_count
    }

    #[wasm_bindgen(js_name = fixedColumnCount)]
    pub fn fixed_column_count(&self) -> usize {
        self.grid.fixed_column_count
    }

    /// Settings changed since the last call, or `undefined`
    #[wasm_bindgen(js_name = takeSettingsUpdate)]
    pub fn take_settings_update(&mut self) -> std::result::Result<JsValue, JsValue> {
        match self.pending_settings() {
            Some(update) => to_js(&update),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Called (no arguments) whenever the grid needs repainting
    #[wasm_bindgen(js_name = setRenderCallback)]
    pub fn set_render_callback(&mut self, callback: Option<Function>) {
        self.render_callback = callback;
    }

    /// Called with each settings update to persist; while set, updates are
    /// not queued for `takeSettingsUpdate`
    #[wasm_bindgen(js_name = setSettingsCallback)]
    pub fn set_settings_callback(&mut self, callback: Option<Function>) {
        self.settings_callback = callback;
    }

    /// Called with a `DragPosition` on every drag move
    #[wasm_bindgen(js_name = setDragListener)]
    pub fn set_drag_listener(&mut self, callback: Function) {
        self.grid.set_drag_listener(move |position| {
            if let Ok(value) = serde_wasm_bindgen::to_value(position) {
                let _ = callback.call1(&JsValue::NULL, &value);
            }
        });
    }

    /// Deliver queued settings and request a frame if one is due
    fn flush(&mut self) {
        if let Some(callback) = self.settings_callback.clone() {
            if let Some(update) = self.pending_settings() {
                if let Ok(value) = serde_wasm_bindgen::to_value(&update) {
                    let _ = callback.call1(&JsValue::NULL, &value);
                }
            }
        }
        if self.take_needs_render() {
            if let Some(callback) = self.render_callback.clone() {
                debug!("requesting render");
                let _ = callback.call0(&JsValue::NULL);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn to_js<T: serde::Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

// ============================================================================
// Non-WASM32 Implementation (for testing)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl DataViewer {
    /// Viewer with the per-character measurer from `config`
    pub fn new(config: GridConfig) -> Self {
        let measure = Box::new(crate::layout::CharWidthMeasure::from_config(&config));
        debug!("created native viewer");
        Self::with_measure(config, measure)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for DataViewer {
    fn default() -> Self {
        Self::new(GridConfig::default())
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
    use crate::error::DtviewError;

    const RESPONSE: &str = r#"{
        "columns": [
            {"name": "id", "dtype": "int64", "index": 0},
            {"name": "price", "dtype": "float64", "index": 1},
            {"name": "label", "dtype": "object", "index": 2}
        ],
        "results": {
            "0": {"id": 1, "price": 9.5, "label": "apple"},
            "1": {"id": 2, "price": null, "label": "pear"}
        },
        "total": 2,
        "final_query": ""
    }"#;

    fn loaded() -> DataViewer {
        let mut viewer = DataViewer::default();
        let token = viewer.issue_token(false);
        viewer.load_data_json(token, RESPONSE).unwrap();
        viewer
    }

    #[test]
    fn test_load_requests_render() {
        let viewer = loaded();
        assert!(viewer.take_needs_render());
        assert!(!viewer.take_needs_render());
        assert_eq!(viewer.grid().row_count, 2);
        assert_eq!(viewer.grid().data[&2]["price"].view.text(), "-");
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let mut viewer = DataViewer::default();
        let token = viewer.issue_token(false);
        let err = viewer.load_data_json(token, "{not json").unwrap_err();
        assert!(matches!(err, DtviewError::Json(_)));
    }

    #[test]
    fn test_settings_and_actions_queue_updates() {
        let mut viewer = loaded();
        let update = viewer
            .update_settings_json(r#"{"backgroundMode": "heatmap-col"}"#)
            .unwrap();
        assert!(update.background_mode.is_some());
        viewer
            .column_action_json(r#"{"type": "LOCK_COLUMN", "column": "label"}"#)
            .unwrap();
        assert_eq!(viewer.grid().fixed_column_count, 2);

        let pending = viewer.pending_settings().unwrap();
        assert!(pending.background_mode.is_some());
        assert_eq!(pending.locked, Some(vec!["label".to_string()]));
    }

    #[test]
    fn test_drag_through_viewer() {
        let mut viewer = loaded();
        let start = viewer.grid().column("label").unwrap().width;
        viewer.begin_drag("label", 0.0).unwrap();
        assert_eq!(viewer.move_drag(25.0).unwrap().width, start + 25.0);
        assert_eq!(viewer.window().drag.unwrap().width, start + 25.0);
        assert_eq!(viewer.release_pointer(), Some(start + 25.0));
        assert!(viewer.window().drag.is_none());
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut viewer = loaded();
        viewer.resize_viewport(400.0, 300.0);
        viewer.scroll_to(-50.0, 1.0e6);
        assert!(viewer.viewport().scroll_y <= viewer.grid().layout().total_height());
        assert!(viewer.viewport().scroll_x >= 0.0);
    }

    #[test]
    fn test_reveal_row_and_wheel() {
        let mut viewer = DataViewer::default();
        let token = viewer.issue_token(false);
        let rows: Vec<String> = (0..200).map(|i| format!(r#""{i}": {{"id": {i}}}"#)).collect();
        let json = format!(
            r#"{{"columns": [{{"name": "id", "dtype": "int64"}}], "results": {{{}}}, "total": 200}}"#,
            rows.join(",")
        );
        viewer.load_data_json(token, &json).unwrap();
        viewer.resize_viewport(400.0, 300.0);

        viewer.reveal_row(50);
        assert_eq!(viewer.window().rows.start, 51 - viewer.grid().config.overscan);

        let before = viewer.viewport().scroll_y;
        viewer.scroll_delta(0.0, 50.0);
        assert_eq!(viewer.viewport().scroll_y, before + 50.0);
    }
}
