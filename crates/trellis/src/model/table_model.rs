//! Table data model: trait, change events, and an in-memory implementation.
//!
//! A [`TableModel`] is a flat 2-D grid addressed entirely in model
//! coordinates. It never knows about sorting, filtering, or column
//! reordering; those live in the view layer. When its data changes it
//! emits a [`TableModelEvent`] on [`TableModelSignals::table_changed`],
//! and every view showing the model reconciles against the event.
//!
//! # Example
//!
//! ```
//! use trellis::model::{CellValue, TableModel, VecTableModel};
//!
//! let model = VecTableModel::new(3, 2);
//! model.set_value_at(CellValue::from("hello"), 0, 0);
//! assert_eq!(model.value_at(0, 0), CellValue::from("hello"));
//! assert_eq!(model.column_name(27), "AB");
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use trellis_core::Signal;

use super::cell::{CellValue, ColumnClass};

/// The rows a [`TableModelEvent`] covers, in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSpan {
    /// Every row is affected (or the row structure is unknown).
    All,
    /// The inclusive range `first..=last`.
    Range { first: usize, last: usize },
}

impl RowSpan {
    /// Single-row span.
    pub fn row(index: usize) -> Self {
        RowSpan::Range {
            first: index,
            last: index,
        }
    }
}

/// What kind of change a [`TableModelEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableModelEventKind {
    /// Rows were inserted at the span.
    Insert,
    /// Rows in the span were removed.
    Delete,
    /// Values in the span changed; row structure is unchanged.
    Update,
    /// Column structure changed. Views discard column state.
    HeaderChanged,
}

/// Describes a change to a table model.
///
/// `column` is `None` when every column is affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableModelEvent {
    pub kind: TableModelEventKind,
    pub rows: RowSpan,
    pub column: Option<usize>,
}

impl TableModelEvent {
    /// Values changed in `first..=last`, all columns.
    pub fn update(first: usize, last: usize) -> Self {
        Self {
            kind: TableModelEventKind::Update,
            rows: RowSpan::Range { first, last },
            column: None,
        }
    }

    /// One cell changed.
    pub fn cell_update(row: usize, column: usize) -> Self {
        Self {
            kind: TableModelEventKind::Update,
            rows: RowSpan::row(row),
            column: Some(column),
        }
    }

    /// Rows `first..=last` were inserted.
    pub fn insert(first: usize, last: usize) -> Self {
        Self {
            kind: TableModelEventKind::Insert,
            rows: RowSpan::Range { first, last },
            column: None,
        }
    }

    /// Rows `first..=last` were removed.
    pub fn delete(first: usize, last: usize) -> Self {
        Self {
            kind: TableModelEventKind::Delete,
            rows: RowSpan::Range { first, last },
            column: None,
        }
    }

    /// Everything may have changed, including the row count.
    pub fn all_data_changed() -> Self {
        Self {
            kind: TableModelEventKind::Update,
            rows: RowSpan::All,
            column: None,
        }
    }

    /// The column structure changed.
    pub fn header_changed() -> Self {
        Self {
            kind: TableModelEventKind::HeaderChanged,
            rows: RowSpan::All,
            column: None,
        }
    }
}

/// Signals emitted by table models.
#[derive(Debug, Default)]
pub struct TableModelSignals {
    /// Emitted after any change to the model's data or structure.
    pub table_changed: Signal<TableModelEvent>,
}

impl TableModelSignals {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared handle to a table model.
pub type TableModelHandle = Arc<dyn TableModel>;

/// The data source behind a table view.
///
/// All indices are model coordinates. Implementations must emit a
/// [`TableModelEvent`] after every mutation, with the model already in
/// its new state when slots run.
pub trait TableModel: Send + Sync {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Number of columns.
    fn column_count(&self) -> usize;

    /// The value at `(row, column)`.
    ///
    /// Out-of-range coordinates return [`CellValue::None`].
    fn value_at(&self, row: usize, column: usize) -> CellValue;

    /// Attempts to store `value` at `(row, column)`.
    ///
    /// Returns `true` if the model accepted the value. The default
    /// implementation rejects all writes.
    fn set_value_at(&self, value: CellValue, row: usize, column: usize) -> bool {
        let _ = (value, row, column);
        false
    }

    /// Whether the cell at `(row, column)` accepts edits.
    fn is_editable(&self, row: usize, column: usize) -> bool {
        let _ = (row, column);
        false
    }

    /// The value class of `column`.
    fn column_class(&self, column: usize) -> ColumnClass {
        let _ = column;
        ColumnClass::Text
    }

    /// The display name of `column`.
    ///
    /// The default produces spreadsheet-style names: `A`, `B`, ... `Z`,
    /// `AA`, `AB`, and so on.
    fn column_name(&self, column: usize) -> String {
        spreadsheet_column_name(column)
    }

    /// The model's change signals.
    fn signals(&self) -> &TableModelSignals;
}

/// Spreadsheet-style column naming: 0 is `A`, 25 is `Z`, 26 is `AA`.
pub(crate) fn spreadsheet_column_name(column: usize) -> String {
    let mut name = Vec::new();
    let mut index = column as i64;
    while index >= 0 {
        name.push(b'A' + (index % 26) as u8);
        index = index / 26 - 1;
    }
    name.reverse();
    // Only ASCII letters are pushed.
    String::from_utf8(name).unwrap_or_default()
}

/// An in-memory table model backed by a row-major `Vec` grid.
///
/// Cheap to clone behind an `Arc`; interior mutability lets several
/// views share one instance.
pub struct VecTableModel {
    rows: RwLock<Vec<Vec<CellValue>>>,
    column_count: usize,
    column_names: RwLock<Vec<Option<String>>>,
    column_classes: RwLock<Vec<ColumnClass>>,
    editable_columns: RwLock<Vec<bool>>,
    signals: TableModelSignals,
}

impl VecTableModel {
    /// Creates a model of `rows` x `columns` cells, all [`CellValue::None`].
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: RwLock::new(vec![vec![CellValue::None; columns]; rows]),
            column_count: columns,
            column_names: RwLock::new(vec![None; columns]),
            column_classes: RwLock::new(vec![ColumnClass::Text; columns]),
            editable_columns: RwLock::new(vec![false; columns]),
            signals: TableModelSignals::new(),
        }
    }

    /// Creates a model from existing row data.
    ///
    /// Short rows are padded with [`CellValue::None`] to `columns`.
    pub fn from_rows(data: Vec<Vec<CellValue>>, columns: usize) -> Self {
        let rows = data
            .into_iter()
            .map(|mut row| {
                row.resize(columns, CellValue::None);
                row
            })
            .collect();
        Self {
            rows: RwLock::new(rows),
            column_count: columns,
            column_names: RwLock::new(vec![None; columns]),
            column_classes: RwLock::new(vec![ColumnClass::Text; columns]),
            editable_columns: RwLock::new(vec![false; columns]),
            signals: TableModelSignals::new(),
        }
    }

    /// Sets a custom display name for `column`.
    pub fn set_column_name(&self, column: usize, name: impl Into<String>) {
        if let Some(slot) = self.column_names.write().get_mut(column) {
            *slot = Some(name.into());
            self.signals.table_changed.emit(TableModelEvent::header_changed());
        }
    }

    /// Declares the value class of `column`.
    pub fn set_column_class(&self, column: usize, class: ColumnClass) {
        if let Some(slot) = self.column_classes.write().get_mut(column) {
            *slot = class;
        }
    }

    /// Makes every cell of `column` editable or read-only.
    pub fn set_column_editable(&self, column: usize, editable: bool) {
        if let Some(slot) = self.editable_columns.write().get_mut(column) {
            *slot = editable;
        }
    }

    /// Inserts `rows` before `index`. `index == row_count()` appends.
    pub fn insert_rows(&self, index: usize, rows: Vec<Vec<CellValue>>) {
        if rows.is_empty() {
            return;
        }
        let count = rows.len();
        let index = {
            let mut data = self.rows.write();
            let index = index.min(data.len());
            for (offset, mut row) in rows.into_iter().enumerate() {
                row.resize(self.column_count, CellValue::None);
                data.insert(index + offset, row);
            }
            index
        };
        self.signals
            .table_changed
            .emit(TableModelEvent::insert(index, index + count - 1));
    }

    /// Inserts one empty row before `index`.
    pub fn insert_row(&self, index: usize) {
        self.insert_rows(index, vec![vec![CellValue::None; self.column_count]]);
    }

    /// Removes rows `first..=last`. Out-of-range portions are ignored.
    pub fn remove_rows(&self, first: usize, last: usize) {
        let removed = {
            let mut data = self.rows.write();
            if first >= data.len() || last < first {
                return;
            }
            let last = last.min(data.len() - 1);
            data.drain(first..=last);
            last
        };
        self.signals
            .table_changed
            .emit(TableModelEvent::delete(first, removed));
    }
}

impl TableModel for VecTableModel {
    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn value_at(&self, row: usize, column: usize) -> CellValue {
        self.rows
            .read()
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or(CellValue::None)
    }

    fn set_value_at(&self, value: CellValue, row: usize, column: usize) -> bool {
        {
            let mut data = self.rows.write();
            let Some(cell) = data.get_mut(row).and_then(|r| r.get_mut(column)) else {
                return false;
            };
            *cell = value;
        }
        self.signals
            .table_changed
            .emit(TableModelEvent::cell_update(row, column));
        true
    }

    fn is_editable(&self, row: usize, column: usize) -> bool {
        row < self.row_count()
            && self
                .editable_columns
                .read()
                .get(column)
                .copied()
                .unwrap_or(false)
    }

    fn column_class(&self, column: usize) -> ColumnClass {
        self.column_classes
            .read()
            .get(column)
            .copied()
            .unwrap_or_default()
    }

    fn column_name(&self, column: usize) -> String {
        if let Some(Some(name)) = self.column_names.read().get(column) {
            return name.clone();
        }
        spreadsheet_column_name(column)
    }

    fn signals(&self) -> &TableModelSignals {
        &self.signals
    }
}
