//! Serializable snapshots of view state.
//!
//! A [`TableViewState`] captures the parts of a table view a user shaped
//! by hand: column order and widths, sort keys, selection, and row
//! heights. Row state is stored in model coordinates so a snapshot stays
//! meaningful when it is restored under a different sort order.
//!
//! The types here are plain data; capture and restore live on
//! [`TableView`](super::TableView).

use serde::{Deserialize, Serialize};

use crate::error::ViewError;
use crate::model::{ModelColumn, SortKey, SortOrder};

/// One column's persisted layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnState {
    /// The model column this entry describes.
    pub model_index: usize,
    pub width: i32,
    pub preferred_width: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

/// Direction of a persisted sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One persisted sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKeyState {
    pub column: usize,
    pub direction: SortDirection,
}

impl From<SortKey> for SortKeyState {
    fn from(key: SortKey) -> Self {
        Self {
            column: key.column.get(),
            direction: match key.order {
                SortOrder::Ascending => SortDirection::Ascending,
                SortOrder::Descending => SortDirection::Descending,
            },
        }
    }
}

impl From<SortKeyState> for SortKey {
    fn from(state: SortKeyState) -> Self {
        SortKey::new(
            ModelColumn::new(state.column),
            match state.direction {
                SortDirection::Ascending => SortOrder::Ascending,
                SortDirection::Descending => SortOrder::Descending,
            },
        )
    }
}

/// A full view-state snapshot.
///
/// Row-axis entries (`selected_rows`, `row_heights`) are keyed by model
/// row; column entries appear in view order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableViewState {
    /// Columns in their displayed order.
    pub columns: Vec<ColumnState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_keys: Vec<SortKeyState>,
    /// Selected model rows.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_rows: Vec<usize>,
    pub default_row_height: i32,
    /// One height per model row.
    pub row_heights: Vec<i32>,
}

impl TableViewState {
    /// Serializes the snapshot as JSON.
    pub fn to_json(&self) -> Result<String, ViewError> {
        serde_json::to_string(self).map_err(|e| ViewError::InvalidSnapshot(e.to_string()))
    }

    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        serde_json::from_str(json).map_err(|e| ViewError::InvalidSnapshot(e.to_string()))
    }
}
