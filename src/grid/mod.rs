//! Grid state and the single update surface.
//!
//! [`GridState`] owns the column list, the formatted data, the instance
//! settings and everything derived from them (widths, header height, fixed
//! column count, background bounds). Every mutation goes through
//! [`GridState::propagate_state`] or one of the transition functions built
//! on it, so layout is never computed from a half-updated column list.

mod actions;
mod drag;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace, warn};

pub use actions::ColumnAction;
pub use drag::{DragPosition, DragState};

use crate::background::{apply_styles, compute_outlier_scales, BackgroundBounds};
use crate::config::GridConfig;
use crate::error::{DtviewError, Result};
use crate::format::{format_row, format_rows, reformat_column, FormatContext};
use crate::layout::{
    fixed_column_count, index_width, recompute_layout, row_height, CharWidthMeasure, GridLayout,
    SizingContext, TextMeasure,
};
use crate::types::{
    sort_direction, BackgroundMode, ColumnDef, DataResponse, DataViewerData, DtypesResponse,
    InstanceSettings, SettingsUpdate, SortDirection,
};

/// Partial state merged by [`GridState::propagate_state`]
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub columns: Option<Vec<ColumnDef>>,
    pub data: Option<DataViewerData>,
    pub row_count: Option<usize>,
    /// Fire the resize hook once the state settles
    pub trigger_resize: bool,
    /// Skip the width recompute; widths may lag until the next layout trigger
    pub formatting_only: bool,
}

impl StateUpdate {
    pub fn columns(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns: Some(columns),
            trigger_resize: true,
            ..Self::default()
        }
    }
}

/// Which fetch stream a request token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Data,
    Dtypes,
}

/// Last-issued-wins request sequencing, one counter per stream
#[derive(Debug, Clone, Default)]
struct RequestSequencer {
    data: u64,
    dtypes: u64,
}

impl RequestSequencer {
    fn slot(&mut self, kind: RequestKind) -> &mut u64 {
        match kind {
            RequestKind::Data => &mut self.data,
            RequestKind::Dtypes => &mut self.dtypes,
        }
    }

    fn begin(&mut self, kind: RequestKind) -> u64 {
        let slot = self.slot(kind);
        *slot += 1;
        *slot
    }

    fn check(&mut self, kind: RequestKind, token: u64) -> Result<()> {
        let latest = *self.slot(kind);
        if token == latest {
            Ok(())
        } else {
            Err(DtviewError::StaleResponse { token, latest })
        }
    }
}

/// Auto-sized output of one layout pass
#[derive(Debug, Clone, PartialEq)]
struct LayoutEntry {
    widths: HashMap<String, f32>,
    header_height: f32,
    index_width: f32,
}

/// Layout results keyed by a content hash of the sizing inputs
#[derive(Debug, Clone, Default)]
pub struct LayoutCache {
    entries: HashMap<u64, LayoutEntry>,
    pub hits: u64,
    pub misses: u64,
}

const LAYOUT_CACHE_CAPACITY: usize = 32;

impl LayoutCache {
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&mut self, key: u64) -> Option<&LayoutEntry> {
        let entry = self.entries.get(&key);
        if entry.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        entry
    }

    fn insert(&mut self, key: u64, entry: LayoutEntry) {
        if self.entries.len() >= LAYOUT_CACHE_CAPACITY {
            self.entries.clear();
        }
        self.entries.insert(key, entry);
    }
}

type ResizeHook = Box<dyn FnMut()>;
type DragListener = Box<dyn FnMut(&DragPosition)>;

/// The grid container's state
pub struct GridState {
    pub columns: Vec<ColumnDef>,
    pub data: DataViewerData,
    pub row_count: usize,
    pub settings: InstanceSettings,
    pub config: GridConfig,
    pub fixed_column_count: usize,
    pub header_height: f32,
    pub index_width: f32,
    pub bounds: BackgroundBounds,
    pub drag: DragState,
    pub cache: LayoutCache,
    /// Number of times the resize hook has fired
    pub resize_generation: u64,
    /// Bumped whenever the data map is replaced or patched
    data_generation: u64,
    requests: RequestSequencer,
    pending_settings: SettingsUpdate,
    measure: Box<dyn TextMeasure>,
    resize_hook: Option<ResizeHook>,
    drag_listener: Option<DragListener>,
}

impl std::fmt::Debug for GridState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridState")
            .field("columns", &self.columns.len())
            .field("rows", &self.data.len())
            .field("row_count", &self.row_count)
            .field("fixed_column_count", &self.fixed_column_count)
            .field("background_mode", &self.settings.background_mode)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridState {
    /// State with the per-character measurer from `config`
    pub fn new(config: GridConfig) -> Self {
        let measure = Box::new(CharWidthMeasure::from_config(&config));
        Self::with_measure(config, measure)
    }

    pub fn with_measure(config: GridConfig, measure: Box<dyn TextMeasure>) -> Self {
        Self {
            columns: Vec::new(),
            data: DataViewerData::new(),
            row_count: 0,
            settings: InstanceSettings::default(),
            header_height: config.row_height,
            index_width: config.index_min_width,
            config,
            fixed_column_count: 1,
            bounds: BackgroundBounds::default(),
            drag: DragState::Idle,
            cache: LayoutCache::default(),
            resize_generation: 0,
            data_generation: 0,
            requests: RequestSequencer::default(),
            pending_settings: SettingsUpdate::default(),
            measure,
            resize_hook: None,
            drag_listener: None,
        }
    }

    /// Forced-resize hook of the virtualized grid
    pub fn set_resize_hook(&mut self, hook: impl FnMut() + 'static) {
        self.resize_hook = Some(Box::new(hook));
    }

    /// Global listener for drag positions
    pub fn set_drag_listener(&mut self, listener: impl FnMut(&DragPosition) + 'static) {
        self.drag_listener = Some(Box::new(listener));
    }

    /// Replace the session settings (initial load); locks are applied to the columns
    pub fn load_settings(&mut self, settings: InstanceSettings) {
        self.settings = settings;
        let mut columns = self.columns.clone();
        actions::apply_locks(&mut columns, &self.settings.locked);
        self.cache.invalidate();
        self.propagate_state(StateUpdate::columns(columns), |_| {});
    }

    /// Merge a partial update, re-derive layout and run `callback` on the
    /// settled state.
    pub fn propagate_state<F>(&mut self, update: StateUpdate, callback: F)
    where
        F: FnOnce(&mut Self),
    {
        let columns_changed = update.columns.is_some();
        let data_changed = update.data.is_some();

        if let Some(mut columns) = update.columns {
            actions::partition_locked(&mut columns);
            self.columns = columns;
        }
        if let Some(data) = update.data {
            self.data = data;
            self.data_generation += 1;
        }
        if let Some(row_count) = update.row_count {
            self.row_count = row_count;
        }

        if (columns_changed || data_changed) && !update.formatting_only {
            self.relayout();
        }
        if columns_changed || data_changed {
            self.refresh_background();
        }
        self.fixed_column_count = fixed_column_count(&self.columns);

        debug!(
            columns_changed,
            data_changed,
            formatting_only = update.formatting_only,
            fixed_column_count = self.fixed_column_count,
            "propagated grid state"
        );

        if update.trigger_resize {
            self.fire_resize();
        }
        callback(self);
    }

    /// `propagate_state` without a callback
    pub fn propagate(&mut self, update: StateUpdate) {
        self.propagate_state(update, |_| {});
    }

    fn fire_resize(&mut self) {
        self.resize_generation += 1;
        if let Some(hook) = self.resize_hook.as_mut() {
            hook();
        }
    }

    fn layout_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for col in &self.columns {
            col.name.hash(&mut hasher);
            col.kind.hash(&mut hasher);
            col.visible.hash(&mut hasher);
            col.resized.hash(&mut hasher);
            if col.resized || !col.visible {
                col.width.to_bits().hash(&mut hasher);
            }
            col.has_missing.hash(&mut hasher);
            col.has_outliers.hash(&mut hasher);
            col.low_variance.hash(&mut hasher);
        }
        self.settings.sort_info.hash(&mut hasher);
        self.settings.background_mode.hash(&mut hasher);
        self.settings.vertical_headers.hash(&mut hasher);
        self.config.max_column_width.map(f32::to_bits).hash(&mut hasher);
        self.config.max_row_height.map(f32::to_bits).hash(&mut hasher);
        self.data_generation.hash(&mut hasher);
        self.row_count.hash(&mut hasher);
        hasher.finish()
    }

    /// Recompute widths, header height and index width
    fn relayout(&mut self) {
        let key = self.layout_key();
        if let Some(entry) = self.cache.get(key).cloned() {
            trace!(key, "layout cache hit");
            for col in self.columns.iter_mut().filter(|c| c.visible && !c.resized) {
                if let Some(width) = entry.widths.get(&col.name) {
                    col.width = *width;
                }
            }
            self.header_height = entry.header_height;
            self.index_width = entry.index_width;
            return;
        }

        let ctx = SizingContext::new(&self.settings, &self.config, self.measure.as_ref());
        let columns = recompute_layout(&self.columns, &self.data, self.row_count, &ctx);
        let header_height = row_height(0, &columns, &ctx);
        let index_w = index_width(self.row_count, &self.config, self.measure.as_ref());

        let widths = columns
            .iter()
            .filter(|c| c.visible && !c.resized)
            .map(|c| (c.name.clone(), c.width))
            .collect();
        self.cache.insert(
            key,
            LayoutEntry {
                widths,
                header_height,
                index_width: index_w,
            },
        );
        trace!(key, "layout cache miss");

        self.columns = columns;
        self.header_height = header_height;
        self.index_width = index_w;
    }

    /// Eagerly recompute bounds for the active mode and restyle every cell
    fn refresh_background(&mut self) {
        let mode = self.settings.background_mode.clone();
        if mode == BackgroundMode::Outliers {
            compute_outlier_scales(&mut self.columns, &self.data);
        }
        self.bounds = BackgroundBounds::compute(&mode, &self.columns, &self.data);
        apply_styles(&mut self.data, &self.columns, &mode, &self.bounds);
    }

    /// Pixel layout for the current state
    pub fn layout(&self) -> GridLayout {
        GridLayout::new(
            &self.columns,
            self.index_width,
            self.header_height,
            self.config.row_height,
            self.row_count,
        )
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Height of grid row `row`
    pub fn row_height(&self, row: usize) -> f32 {
        if row == 0 {
            self.header_height
        } else {
            self.config.row_height
        }
    }

    // ---- request sequencing -------------------------------------------

    /// Issue a token for a fetch about to be sent
    pub fn begin_request(&mut self, kind: RequestKind) -> u64 {
        let token = self.requests.begin(kind);
        trace!(?kind, token, "request issued");
        token
    }

    fn accept(&mut self, kind: RequestKind, token: u64) -> Result<()> {
        self.requests.check(kind, token).inspect_err(|e| {
            warn!(?kind, error = %e, "dropping stale response");
        })
    }

    /// Apply a data response.
    ///
    /// With `columns` the data is replaced wholesale; without, the rows are
    /// merged into what is loaded (scroll-driven chunk fetches).
    pub fn apply_data_response(&mut self, token: u64, response: DataResponse) -> Result<()> {
        self.accept(RequestKind::Data, token)?;

        if !response.final_query.is_empty() {
            self.settings.query = Some(response.final_query.clone());
        }

        let Some(incoming) = response.columns else {
            let ctx = FormatContext::new(&self.settings, &self.config);
            let mut data = self.data.clone();
            for (row, raw_row) in &response.results {
                data.insert(row + 1, format_row(Some(raw_row), &self.columns, &self.settings, &ctx));
            }
            debug!(rows = response.results.len(), total = response.total, "merged data chunk");
            self.propagate(StateUpdate {
                data: Some(data),
                row_count: Some(response.total),
                trigger_resize: true,
                ..StateUpdate::default()
            });
            return Ok(());
        };

        let columns = self.merge_columns(incoming);
        let ctx = FormatContext::new(&self.settings, &self.config);
        let data = format_rows(&response.results, &columns, &self.settings, &ctx);
        debug!(
            columns = columns.len(),
            rows = data.len(),
            total = response.total,
            "loaded data"
        );
        self.propagate(StateUpdate {
            columns: Some(columns),
            data: Some(data),
            row_count: Some(response.total),
            trigger_resize: true,
            formatting_only: false,
        });
        Ok(())
    }

    /// Server columns merged with the UI state of columns already known
    fn merge_columns(&self, incoming: Vec<ColumnDef>) -> Vec<ColumnDef> {
        let mut columns: Vec<ColumnDef> = incoming
            .into_iter()
            .map(|mut col| {
                col.reclassify();
                if let Some(existing) = self.column(&col.name) {
                    col.visible = existing.visible;
                    col.resized = existing.resized;
                    col.width = existing.width;
                }
                col
            })
            .collect();
        actions::apply_locks(&mut columns, &self.settings.locked);
        columns
    }

    /// Apply a dtypes response: reclassify and refresh column statistics
    pub fn apply_dtypes_response(&mut self, token: u64, response: DtypesResponse) -> Result<()> {
        self.accept(RequestKind::Dtypes, token)?;

        let mut columns = self.columns.clone();
        let mut changed_kinds = Vec::new();
        for dtype in response.dtypes {
            let Some(col) = columns.iter_mut().find(|c| c.name == dtype.name) else {
                continue;
            };
            let old_kind = col.kind;
            col.dtype = dtype.dtype;
            col.reclassify();
            col.has_missing = dtype.has_missing;
            col.has_outliers = dtype.has_outliers;
            col.low_variance = dtype.low_variance;
            col.unique_ct = dtype.unique_ct;
            col.min = dtype.min;
            col.max = dtype.max;
            col.outlier_range = dtype.outlier_range;
            if col.kind != old_kind {
                changed_kinds.push(col.clone());
            }
        }

        let mut data = self.data.clone();
        let ctx = FormatContext::new(&self.settings, &self.config);
        for col in &changed_kinds {
            reformat_column(&mut data, col, &self.settings, &ctx);
        }
        debug!(reclassified = changed_kinds.len(), "applied dtypes");
        self.propagate(StateUpdate {
            columns: Some(columns),
            data: (!changed_kinds.is_empty()).then_some(data),
            trigger_resize: true,
            ..StateUpdate::default()
        });
        Ok(())
    }

    // ---- settings -------------------------------------------------------

    /// Apply a settings update and return what should be persisted.
    pub fn apply_settings_update(&mut self, update: SettingsUpdate) -> SettingsUpdate {
        if update.is_empty() {
            return update;
        }
        let before = self.settings.clone();
        self.settings.apply(&update);

        let mode_changed = before.background_mode != self.settings.background_mode;
        let layout_changed = mode_changed
            || before.sort_info != self.settings.sort_info
            || before.vertical_headers != self.settings.vertical_headers
            || before.locked != self.settings.locked;
        let formats_changed = before.column_formats != self.settings.column_formats
            || before.nan_display != self.settings.nan_display;

        let mut columns = self.columns.clone();
        if before.locked != self.settings.locked {
            actions::apply_locks(&mut columns, &self.settings.locked);
        }

        if formats_changed {
            let mut data = self.data.clone();
            let ctx = FormatContext::new(&self.settings, &self.config);
            let nan_changed = before.nan_display != self.settings.nan_display;
            for col in &columns {
                if nan_changed
                    || before.column_formats.get(&col.name) != self.settings.column_formats.get(&col.name)
                {
                    reformat_column(&mut data, col, &self.settings, &ctx);
                }
            }
            // widths are left as they are until the next layout trigger
            self.propagate(StateUpdate {
                data: Some(data),
                formatting_only: true,
                ..StateUpdate::default()
            });
        }

        if layout_changed {
            debug!(
                mode = %self.settings.background_mode,
                mode_changed,
                "settings changed layout inputs"
            );
            self.propagate(StateUpdate::columns(columns));
        }

        self.pending_settings.merge(update.clone());
        update
    }

    /// Settings accumulated since the last call, for the page to persist
    pub fn take_settings_update(&mut self) -> Option<SettingsUpdate> {
        let update = std::mem::take(&mut self.pending_settings);
        (!update.is_empty()).then_some(update)
    }

    // ---- column actions -------------------------------------------------

    /// Apply a column action; returns the settings it changed (possibly empty)
    pub fn apply_column_action(&mut self, action: ColumnAction) -> Result<SettingsUpdate> {
        let mut columns = self.columns.clone();
        let idx = actions::position(&columns, action.column())?;
        debug!(?action, "column action");

        match action {
            ColumnAction::HideColumn { .. } => self.set_visible(columns, idx, false),
            ColumnAction::ShowColumn { .. } => self.set_visible(columns, idx, true),
            ColumnAction::LockColumn { column } => {
                actions::lock(&mut columns, &column)?;
                let mut locked = self.settings.locked.clone();
                if !locked.contains(&column) {
                    locked.push(column);
                }
                Ok(self.set_locked(columns, locked))
            }
            ColumnAction::UnlockColumn { column } => {
                actions::unlock(&mut columns, &column)?;
                let mut locked = self.settings.locked.clone();
                locked.retain(|n| n != &column);
                Ok(self.set_locked(columns, locked))
            }
            ColumnAction::MoveColumn { column, to } => {
                actions::move_to(&mut columns, &column, to)?;
                self.propagate(StateUpdate::columns(columns));
                Ok(SettingsUpdate::default())
            }
            ColumnAction::ResizeColumn { width, .. } => {
                if let Some(col) = columns.get_mut(idx) {
                    col.width = width.max(self.config.resize_floor);
                    col.resized = true;
                }
                self.propagate(StateUpdate::columns(columns));
                Ok(SettingsUpdate::default())
            }
            ColumnAction::ResetWidth { .. } => {
                if let Some(col) = columns.get_mut(idx) {
                    col.resized = false;
                }
                self.propagate(StateUpdate::columns(columns));
                Ok(SettingsUpdate::default())
            }
            ColumnAction::RenameColumn { column, to } => self.rename(columns, &column, to),
            ColumnAction::ToggleSort { column } => {
                let direction = sort_direction(&self.settings.sort_info, &column)
                    .map_or(SortDirection::Asc, SortDirection::toggled);
                self.apply_column_action(ColumnAction::SortColumn {
                    column,
                    direction: Some(direction),
                })
            }
            ColumnAction::SortColumn { column, direction } => {
                let mut sort_info = self.settings.sort_info.clone();
                match direction {
                    Some(dir) => match sort_info.iter_mut().find(|(name, _)| name == &column) {
                        Some(entry) => entry.1 = dir,
                        None => sort_info.push((column, dir)),
                    },
                    None => sort_info.retain(|(name, _)| name != &column),
                }
                Ok(self.apply_settings_update(SettingsUpdate {
                    sort_info: Some(sort_info),
                    ..SettingsUpdate::default()
                }))
            }
        }
    }

    /// Hiding leaves the sort list alone; a hidden column keeps its entry
    fn set_visible(&mut self, mut columns: Vec<ColumnDef>, idx: usize, visible: bool) -> Result<SettingsUpdate> {
        if let Some(col) = columns.get_mut(idx) {
            col.visible = visible;
        }
        self.propagate(StateUpdate::columns(columns));
        Ok(SettingsUpdate::default())
    }

    fn set_locked(&mut self, columns: Vec<ColumnDef>, locked: Vec<String>) -> SettingsUpdate {
        self.settings.locked.clone_from(&locked);
        self.propagate(StateUpdate::columns(columns));
        self.record(SettingsUpdate {
            locked: Some(locked),
            ..SettingsUpdate::default()
        })
    }

    fn record(&mut self, update: SettingsUpdate) -> SettingsUpdate {
        self.pending_settings.merge(update.clone());
        update
    }

    fn rename(&mut self, mut columns: Vec<ColumnDef>, from: &str, to: String) -> Result<SettingsUpdate> {
        if to.is_empty() || columns.iter().any(|c| c.name == to) {
            return Err(DtviewError::Other(format!("cannot rename {from} to {to:?}")));
        }
        for col in columns.iter_mut().filter(|c| c.name == from) {
            col.name.clone_from(&to);
        }

        let mut data = self.data.clone();
        for row in data.values_mut() {
            if let Some(record) = row.remove(from) {
                row.insert(to.clone(), record);
            }
        }

        let mut update = SettingsUpdate::default();
        let rename = |name: &mut String| {
            if name.as_str() == from {
                name.clone_from(&to);
            }
        };
        if self.settings.sort_info.iter().any(|(n, _)| n == from) {
            let mut sort_info = self.settings.sort_info.clone();
            sort_info.iter_mut().for_each(|(n, _)| rename(n));
            update.sort_info = Some(sort_info);
        }
        if self.settings.locked.iter().any(|n| n == from) {
            let mut locked = self.settings.locked.clone();
            locked.iter_mut().for_each(rename);
            update.locked = Some(locked);
        }
        if let Some(fmt) = self.settings.column_formats.get(from) {
            let mut formats = self.settings.column_formats.clone();
            formats.remove(from);
            formats.insert(to.clone(), fmt.clone());
            update.column_formats = Some(formats);
        }
        if let Some(filter) = self.settings.column_filters.get(from) {
            let mut filters = self.settings.column_filters.clone();
            filters.remove(from);
            filters.insert(to.clone(), filter.clone());
            update.column_filters = Some(filters);
        }
        if let Some(filter) = self.settings.outlier_filters.get(from) {
            let mut filters = self.settings.outlier_filters.clone();
            filters.remove(from);
            filters.insert(to.clone(), filter.clone());
            update.outlier_filters = Some(filters);
        }
        if let BackgroundMode::HeatmapColumn(name) = &self.settings.background_mode {
            if name == from {
                update.background_mode = Some(BackgroundMode::HeatmapColumn(to.clone()));
            }
        }

        self.settings.apply(&update);
        self.propagate(StateUpdate {
            columns: Some(columns),
            data: Some(data),
            trigger_resize: true,
            ..StateUpdate::default()
        });
        Ok(self.record(update))
    }

    // ---- drag resize ----------------------------------------------------

    /// Begin dragging the right edge of `column`'s header
    pub fn drag_start(&mut self, column: &str, pointer_x: f32) -> Result<()> {
        let width = self
            .column(column)
            .map(|c| c.width)
            .ok_or_else(|| DtviewError::UnknownColumn(column.to_string()))?;
        if self.drag.is_dragging() {
            self.drag_stop();
        }
        self.drag = DragState::start(column, width, pointer_x);
        debug!(column, width, "drag start");
        Ok(())
    }

    /// Update the preview width; the column list is not touched
    pub fn drag_move(&mut self, pointer_x: f32) -> Option<DragPosition> {
        let position = self.drag.update(pointer_x, self.config.resize_floor)?;
        if let Some(listener) = self.drag_listener.as_mut() {
            listener(&position);
        }
        Some(position)
    }

    /// Commit the preview width, mark the column resized and relayout
    pub fn drag_stop(&mut self) -> Option<f32> {
        let (column, width) = self.drag.finish()?;
        let mut columns = self.columns.clone();
        if let Some(col) = columns.iter_mut().find(|c| c.name == column) {
            col.width = width;
            col.resized = true;
        }
        debug!(column = %column, width, "drag stop");
        self.propagate(StateUpdate::columns(columns));
        Some(width)
    }

    /// Pointer released anywhere (including outside the window); always ends a drag
    pub fn pointer_up(&mut self) -> Option<f32> {
        if self.drag.is_dragging() {
            self.drag_stop()
        } else {
            None
        }
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
    use crate::types::RawValue;

    fn response() -> DataResponse {
        let columns = vec![ColumnDef::new("a", "int64"), ColumnDef::new("b", "object")];
        let mut results = crate::types::RawRows::new();
        for i in 0..3_i64 {
            results.insert(
                usize::try_from(i).unwrap(),
                [
                    ("a".to_string(), RawValue::Int(i)),
                    ("b".to_string(), RawValue::String(format!("row{i}"))),
                ]
                .into_iter()
                .collect(),
            );
        }
        DataResponse {
            columns: Some(columns),
            results,
            total: 3,
            final_query: String::new(),
        }
    }

    fn loaded() -> GridState {
        let mut state = GridState::default();
        let token = state.begin_request(RequestKind::Data);
        state.apply_data_response(token, response()).unwrap();
        state
    }

    #[test]
    fn test_load_shifts_rows() {
        let state = loaded();
        assert_eq!(state.row_count, 3);
        assert!(!state.data.contains_key(&0));
        assert_eq!(state.data[&3]["b"].view.text(), "row2");
        assert_eq!(state.fixed_column_count, 1);
        assert!(state.columns.iter().all(|c| c.width > 0.0));
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut state = GridState::default();
        let first = state.begin_request(RequestKind::Data);
        let second = state.begin_request(RequestKind::Data);
        state.apply_data_response(second, response()).unwrap();
        let err = state.apply_data_response(first, DataResponse::default()).unwrap_err();
        assert!(matches!(err, DtviewError::StaleResponse { token: 1, latest: 2 }));
        assert_eq!(state.row_count, 3);
    }

    #[test]
    fn test_callback_sees_settled_state() {
        let mut state = loaded();
        let mut columns = state.columns.clone();
        columns[0].locked = true;
        let mut seen = None;
        state.propagate_state(StateUpdate::columns(columns), |s| {
            seen = Some(s.fixed_column_count);
        });
        assert_eq!(seen, Some(2));
    }

    #[test]
    fn test_resize_hook_fires() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut state = loaded();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        state.set_resize_hook(move || counter.set(counter.get() + 1));
        state
            .apply_column_action(ColumnAction::HideColumn { column: "a".into() })
            .unwrap();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_layout_cache_hit_on_repeat() {
        let mut state = loaded();
        let columns = state.columns.clone();
        let misses = state.cache.misses;
        state.propagate(StateUpdate::columns(columns.clone()));
        state.propagate(StateUpdate::columns(columns));
        assert_eq!(state.cache.misses, misses);
        assert!(state.cache.hits >= 2);
    }

    #[test]
    fn test_drag_commits_on_pointer_up() {
        let mut state = loaded();
        let start = state.column("b").unwrap().width;
        state.drag_start("b", 100.0).unwrap();
        state.drag_move(150.0);
        // moves do not touch the column list
        assert_eq!(state.column("b").unwrap().width, start);
        assert_eq!(state.pointer_up(), Some(start + 50.0));
        let col = state.column("b").unwrap();
        assert!(col.resized);
        assert_eq!(col.width, start + 50.0);
        assert!(!state.drag.is_dragging());
        assert_eq!(state.pointer_up(), None);
    }

    #[test]
    fn test_sort_action_persists() {
        let mut state = loaded();
        let update = state
            .apply_column_action(ColumnAction::SortColumn {
                column: "a".into(),
                direction: Some(SortDirection::Desc),
            })
            .unwrap();
        assert_eq!(update.sort_info, Some(vec![("a".to_string(), SortDirection::Desc)]));
        let pending = state.take_settings_update().unwrap();
        assert_eq!(pending.sort_info, update.sort_info);
        assert!(state.take_settings_update().is_none());
    }

    #[test]
    fn test_toggle_sort_cycles() {
        let mut state = loaded();
        let toggle = || ColumnAction::ToggleSort { column: "b".into() };
        state.apply_column_action(toggle()).unwrap();
        assert_eq!(state.settings.sort_info, vec![("b".to_string(), SortDirection::Asc)]);
        state.apply_column_action(toggle()).unwrap();
        assert_eq!(state.settings.sort_info, vec![("b".to_string(), SortDirection::Desc)]);
    }

    #[test]
    fn test_rename_carries_settings() {
        let mut state = loaded();
        state
            .settings
            .outlier_filters
            .insert("a".into(), serde_json::json!({"query": "a > 3"}));
        state
            .apply_column_action(ColumnAction::SortColumn {
                column: "a".into(),
                direction: Some(SortDirection::Asc),
            })
            .unwrap();
        let update = state
            .apply_column_action(ColumnAction::RenameColumn {
                column: "a".into(),
                to: "alpha".into(),
            })
            .unwrap();
        assert_eq!(update.sort_info, Some(vec![("alpha".to_string(), SortDirection::Asc)]));
        let outliers = update.outlier_filters.unwrap();
        assert!(outliers.contains_key("alpha") && !outliers.contains_key("a"));
        assert!(state.settings.outlier_filters.contains_key("alpha"));
        assert!(!state.settings.outlier_filters.contains_key("a"));
        assert!(state.column("alpha").is_some());
        assert!(state.data[&1].contains_key("alpha"));
        assert!(!state.data[&1].contains_key("a"));

        let err = state
            .apply_column_action(ColumnAction::RenameColumn {
                column: "alpha".into(),
                to: "b".into(),
            })
            .unwrap_err();
        assert!(matches!(err, DtviewError::Other(_)));
    }

    #[test]
    fn test_chunk_merge_keeps_rows() {
        let mut state = loaded();
        let token = state.begin_request(RequestKind::Data);
        let mut results = crate::types::RawRows::new();
        results.insert(
            10,
            [("a".to_string(), RawValue::Int(10))].into_iter().collect(),
        );
        state
            .apply_data_response(
                token,
                DataResponse {
                    columns: None,
                    results,
                    total: 50,
                    final_query: String::new(),
                },
            )
            .unwrap();
        assert_eq!(state.row_count, 50);
        assert!(state.data.contains_key(&1));
        assert_eq!(state.data[&11]["a"].view.text(), "10");
        assert_eq!(state.data[&11]["b"].view.text(), "");
    }
}
