//! User actions on columns.

use serde::{Deserialize, Serialize};

use crate::error::{DtviewError, Result};
use crate::types::{ColumnDef, SortDirection};

/// A column action coming from a header menu, drag or keyboard shortcut
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnAction {
    HideColumn { column: String },
    ShowColumn { column: String },
    LockColumn { column: String },
    UnlockColumn { column: String },
    /// Move within the column's partition (locked or unlocked)
    MoveColumn { column: String, to: usize },
    ResizeColumn { column: String, width: f32 },
    /// Drop a manual width so auto-sizing applies again
    ResetWidth { column: String },
    RenameColumn { column: String, to: String },
    /// `None` removes the column from the sort list
    SortColumn {
        column: String,
        direction: Option<SortDirection>,
    },
    /// Header click: unsorted -> ascending, otherwise flip
    ToggleSort { column: String },
}

impl ColumnAction {
    pub fn column(&self) -> &str {
        match self {
            Self::HideColumn { column }
            | Self::ShowColumn { column }
            | Self::LockColumn { column }
            | Self::UnlockColumn { column }
            | Self::MoveColumn { column, .. }
            | Self::ResizeColumn { column, .. }
            | Self::ResetWidth { column }
            | Self::RenameColumn { column, .. }
            | Self::SortColumn { column, .. }
            | Self::ToggleSort { column } => column,
        }
    }
}

pub(crate) fn position(columns: &[ColumnDef], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| DtviewError::UnknownColumn(name.to_string()))
}

fn locked_count(columns: &[ColumnDef]) -> usize {
    columns.iter().take_while(|c| c.locked).count()
}

/// Lock a column, moving it to the end of the locked partition.
/// Already-locked columns stay where they are.
pub(crate) fn lock(columns: &mut Vec<ColumnDef>, name: &str) -> Result<()> {
    let from = position(columns, name)?;
    if columns.get(from).is_some_and(|c| c.locked) {
        return Ok(());
    }
    let mut col = columns.remove(from);
    col.locked = true;
    let to = locked_count(columns);
    columns.insert(to, col);
    Ok(())
}

/// Unlock a column, moving it to the front of the unlocked partition.
/// Already-unlocked columns stay where they are.
pub(crate) fn unlock(columns: &mut Vec<ColumnDef>, name: &str) -> Result<()> {
    let from = position(columns, name)?;
    if columns.get(from).is_some_and(|c| !c.locked) {
        return Ok(());
    }
    let mut col = columns.remove(from);
    col.locked = false;
    let to = locked_count(columns);
    columns.insert(to, col);
    Ok(())
}

/// Move a column to `to`, clamped to its own partition
pub(crate) fn move_to(columns: &mut Vec<ColumnDef>, name: &str, to: usize) -> Result<()> {
    let from = position(columns, name)?;
    let col = columns.remove(from);
    let locked = locked_count(columns);
    let target = if col.locked {
        to.min(locked)
    } else {
        to.clamp(locked, columns.len())
    };
    columns.insert(target, col);
    Ok(())
}

/// Stable-partition locked columns to the front, honoring a lock list
pub(crate) fn apply_locks(columns: &mut Vec<ColumnDef>, locked: &[String]) {
    for col in columns.iter_mut() {
        col.locked = locked.contains(&col.name);
    }
    let (mut front, back): (Vec<ColumnDef>, Vec<ColumnDef>) =
        std::mem::take(columns).into_iter().partition(|c| c.locked);
    front.sort_by_key(|c| locked.iter().position(|n| n == &c.name));
    front.extend(back);
    *columns = front;
}

/// Keep locked columns ahead of unlocked ones, preserving relative order
pub(crate) fn partition_locked(columns: &mut Vec<ColumnDef>) {
    if columns.iter().skip(locked_count(columns)).any(|c| c.locked) {
        let (mut front, back): (Vec<ColumnDef>, Vec<ColumnDef>) =
            std::mem::take(columns).into_iter().partition(|c| c.locked);
        front.extend(back);
        *columns = front;
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

    fn names(columns: &[ColumnDef]) -> Vec<&str> {
        columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn cols() -> Vec<ColumnDef> {
        ["a", "b", "c", "d"]
            .iter()
            .map(|n| ColumnDef::new(*n, "int64"))
            .collect()
    }

    #[test]
    fn test_lock_moves_to_front() {
        let mut columns = cols();
        lock(&mut columns, "c").unwrap();
        lock(&mut columns, "d").unwrap();
        assert_eq!(names(&columns), vec!["c", "d", "a", "b"]);
        unlock(&mut columns, "c").unwrap();
        assert_eq!(names(&columns), vec!["d", "c", "a", "b"]);
        assert!(!columns[1].locked);
    }

    #[test]
    fn test_lock_unlock_idempotent() {
        let mut columns = cols();
        lock(&mut columns, "b").unwrap();
        lock(&mut columns, "d").unwrap();
        lock(&mut columns, "b").unwrap();
        assert_eq!(names(&columns), vec!["b", "d", "a", "c"]);
        unlock(&mut columns, "c").unwrap();
        assert_eq!(names(&columns), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_move_clamped_to_partition() {
        let mut columns = cols();
        lock(&mut columns, "a").unwrap();
        move_to(&mut columns, "d", 0).unwrap();
        assert_eq!(names(&columns), vec!["a", "d", "b", "c"]);
        move_to(&mut columns, "a", 3).unwrap();
        assert_eq!(names(&columns), vec!["a", "d", "b", "c"]);
        move_to(&mut columns, "d", 99).unwrap();
        assert_eq!(names(&columns), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_apply_locks_order() {
        let mut columns = cols();
        apply_locks(&mut columns, &["d".to_string(), "b".to_string()]);
        assert_eq!(names(&columns), vec!["d", "b", "a", "c"]);
        assert!(columns[0].locked && columns[1].locked && !columns[2].locked);
    }

    #[test]
    fn test_partition_locked_is_stable() {
        let mut columns = cols();
        columns[1].locked = true;
        columns[3].locked = true;
        partition_locked(&mut columns);
        assert_eq!(names(&columns), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_unknown_column() {
        let mut columns = cols();
        assert!(matches!(
            lock(&mut columns, "zz"),
            Err(DtviewError::UnknownColumn(name)) if name == "zz"
        ));
    }

    #[test]
    fn test_action_json() {
        let action: ColumnAction =
            serde_json::from_str(r#"{"type":"HIDE_COLUMN","column":"col4"}"#).unwrap();
        assert_eq!(action, ColumnAction::HideColumn { column: "col4".into() });
        assert_eq!(action.column(), "col4");

        let action: ColumnAction =
            serde_json::from_str(r#"{"type":"TOGGLE_SORT","column":"b"}"#).unwrap();
        assert_eq!(action, ColumnAction::ToggleSort { column: "b".into() });
    }
}
