//! Trellis: headless model/view widget coordination.
//!
//! Trellis implements the data-facing half of table and combo-box
//! widgets: models, selection, sorting, column layout, and editing,
//! with no painting or input handling. An embedder supplies those and
//! drives the widgets through their public APIs and signals.
//!
//! The crate splits in two:
//!
//! - [`model`]: data and bookkeeping types, addressed in model or view
//!   coordinates but never both at once
//! - [`widget`]: the coordinators ([`widget::TableView`],
//!   [`widget::ComboBox`]) that hold the cross-model invariants
//!
//! # Coordinate spaces
//!
//! Rows have two addresses: where the data lives in the model and where
//! the row currently shows in the view. With a sorter or filter
//! installed the two diverge, so every row index in the API is typed as
//! [`model::ModelRow`] or [`model::ViewRow`] and conversion is explicit.
//! Columns work the same way through [`model::ModelColumn`] and
//! [`model::ViewColumn`]; a column's model identity never changes when
//! the user reorders columns.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::model::{CellValue, TableRowSorter, VecTableModel, ViewColumn, ViewRow};
//! use trellis::widget::TableView;
//!
//! let model = Arc::new(VecTableModel::from_rows(
//!     vec![
//!         vec![CellValue::from("cherry")],
//!         vec![CellValue::from("apple")],
//!         vec![CellValue::from("banana")],
//!     ],
//!     1,
//! ));
//! let sorter = Arc::new(TableRowSorter::new(model.clone()));
//! let mut table = TableView::new(model).with_row_sorter(sorter);
//!
//! // Select "banana", then sort; the selection follows the row.
//! table.set_row_selection_interval(ViewRow::new(2), ViewRow::new(2))?;
//! table.toggle_sort_order(ViewColumn::new(0))?;
//! assert_eq!(
//!     table.value_at(table.selected_rows()[0], ViewColumn::new(0))?,
//!     CellValue::from("banana"),
//! );
//! # Ok::<(), trellis::ViewError>(())
//! ```

pub mod model;
pub mod widget;

mod error;

pub use error::ViewError;
