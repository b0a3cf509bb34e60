//! Model layer: data, selection, and ordering.
//!
//! Everything here is headless and view-agnostic. The types split along
//! coordinate-space lines:
//!
//! - [`TableModel`] holds the data, addressed purely in model coordinates
//! - [`RowSorter`] owns the model-order to view-order permutation
//! - [`ListSelectionModel`] tracks selection along one axis
//! - [`SizeSequence`] is the prefix-sum ledger behind variable row heights
//!
//! The typed coordinates in [`coords`] keep the two row spaces from
//! mixing: a sorted table's `ViewRow(0)` is whatever the sorter put
//! first, not the model's row 0.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::model::{
//!     CellValue, ModelColumn, ModelRow, RowSorter, SortKey, SortOrder, TableRowSorter,
//!     VecTableModel, ViewRow,
//! };
//!
//! let model = Arc::new(VecTableModel::from_rows(
//!     vec![
//!         vec![CellValue::from("banana")],
//!         vec![CellValue::from("apple")],
//!     ],
//!     1,
//! ));
//! let sorter = TableRowSorter::new(model.clone());
//! sorter.set_sort_keys(vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]);
//!
//! // "apple" (model row 1) now shows first.
//! assert_eq!(
//!     sorter.convert_row_index_to_model(ViewRow::new(0)),
//!     Some(ModelRow::new(1)),
//! );
//! ```

mod cell;
mod coords;
mod row_sorter;
mod selection;
mod size_sequence;
mod table_model;

pub use cell::{CellValue, ColumnClass, compare_cell_values};
pub use coords::{ModelColumn, ModelRow, ViewColumn, ViewRow};
pub use row_sorter::{
    CellCompareFn, MAX_SORT_KEYS, RowFilterFn, RowSorter, RowSorterEvent, RowSorterSignals,
    SortKey, SortOrder, TableRowSorter,
};
pub use selection::{ListSelectionModel, SelectionEvent, SelectionMode};
pub use size_sequence::SizeSequence;
pub use table_model::{
    RowSpan, TableModel, TableModelEvent, TableModelEventKind, TableModelHandle,
    TableModelSignals, VecTableModel,
};
