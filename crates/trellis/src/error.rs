//! Error types for the view layer.
//!
//! Index arguments to view operations are validated, never clamped: a
//! caller asking for row 10 of a 5-row table has a bug, and silently
//! answering for row 4 would hide it.

use thiserror::Error;

/// Errors reported by table and combo box operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// A row index was outside the valid range.
    #[error("row index {index} out of bounds (row count {len})")]
    RowOutOfBounds { index: usize, len: usize },

    /// A column index was outside the valid range.
    #[error("column index {index} out of bounds (column count {len})")]
    ColumnOutOfBounds { index: usize, len: usize },

    /// A combo box item index was outside the valid range.
    #[error("item index {index} out of bounds (item count {len})")]
    ItemOutOfBounds { index: usize, len: usize },

    /// A row height of zero or less was requested.
    #[error("row height must be positive, got {0}")]
    InvalidRowHeight(i32),

    /// The row sorter's idea of the model disagrees with the model itself.
    #[error("sorter covers {sorter_rows} model rows but model has {model_rows}")]
    SorterMismatch {
        sorter_rows: usize,
        model_rows: usize,
    },

    /// A persisted view-state snapshot failed validation on restore.
    #[error("invalid view state snapshot: {0}")]
    InvalidSnapshot(String),
}
