//! Header drag-resize state machine.
//!
//! `Idle -> Dragging` on start (captures the starting width),
//! `Dragging -> Dragging` on move (updates only the preview width),
//! `Dragging -> Idle` on stop (hands back the width to commit).
//!
//! Moves never touch the column list; only the stop commits.

use serde::Serialize;

/// Position broadcast to global listeners while dragging
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DragPosition {
    pub column: String,
    /// Pointer x in page coordinates
    pub x: f32,
    /// Preview width of the column
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        column: String,
        start_width: f32,
        start_x: f32,
        preview: f32,
    },
}

impl DragState {
    pub fn start(column: impl Into<String>, start_width: f32, start_x: f32) -> Self {
        Self::Dragging {
            column: column.into(),
            start_width,
            start_x,
            preview: start_width,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Move the pointer; width never drops below `floor`
    pub fn update(&mut self, pointer_x: f32, floor: f32) -> Option<DragPosition> {
        match self {
            Self::Idle => None,
            Self::Dragging {
                column,
                start_width,
                start_x,
                preview,
            } => {
                *preview = (*start_width + (pointer_x - *start_x)).max(floor);
                Some(DragPosition {
                    column: column.clone(),
                    x: pointer_x,
                    width: *preview,
                })
            }
        }
    }

    /// End the drag, returning the column and width to commit
    pub fn finish(&mut self) -> Option<(String, f32)> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Dragging {
                column, preview, ..
            } => Some((column, preview)),
        }
    }

    /// Preview width for `column` while it is being dragged
    pub fn preview_width(&self, column: &str) -> Option<f32> {
        match self {
            Self::Dragging {
                column: dragged,
                preview,
                ..
            } if dragged == column => Some(*preview),
            _ => None,
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

    #[test]
    fn test_drag_cycle() {
        let mut drag = DragState::start("a", 100.0, 500.0);
        assert!(drag.is_dragging());
        let pos = drag.update(530.0, 10.0).unwrap();
        assert_eq!(pos.width, 130.0);
        assert_eq!(drag.preview_width("a"), Some(130.0));
        assert_eq!(drag.preview_width("b"), None);
        assert_eq!(drag.finish(), Some(("a".to_string(), 130.0)));
        assert_eq!(drag, DragState::Idle);
        assert_eq!(drag.finish(), None);
    }

    #[test]
    fn test_floor() {
        let mut drag = DragState::start("a", 100.0, 500.0);
        let pos = drag.update(0.0, 10.0).unwrap();
        assert_eq!(pos.width, 10.0);
    }

    #[test]
    fn test_idle_update_is_noop() {
        let mut drag = DragState::Idle;
        assert_eq!(drag.update(5.0, 10.0), None);
    }
}
