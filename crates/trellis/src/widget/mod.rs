//! Widget layer: the coordinators built on the model types.
//!
//! [`TableView`] is the centrepiece: it binds a
//! [`TableModel`](crate::model::TableModel) to columns, selection,
//! sorting, row geometry, and editing, keeping the view/model coordinate
//! boundary honest. [`ComboBox`] does the same job for a single-selection
//! item list. Neither paints anything; an embedder reads their geometry
//! and dirty regions and draws however it likes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::model::{CellValue, VecTableModel, ViewColumn, ViewRow};
//! use trellis::widget::{AutoResizeMode, TableView};
//!
//! let model = Arc::new(VecTableModel::from_rows(
//!     vec![
//!         vec![CellValue::from("ada"), CellValue::Int(36)],
//!         vec![CellValue::from("grace"), CellValue::Int(85)],
//!     ],
//!     2,
//! ));
//! let mut table = TableView::new(model)
//!     .with_auto_resize_mode(AutoResizeMode::AllColumns)
//!     .with_view_width(400);
//!
//! table.change_selection(ViewRow::new(0), ViewColumn::new(1), false, false)?;
//! assert_eq!(
//!     table.value_at(ViewRow::new(0), ViewColumn::new(1))?,
//!     CellValue::Int(36),
//! );
//! # Ok::<(), trellis::ViewError>(())
//! ```

mod column;
mod combo_box;
mod editor;
mod state;
mod table_view;

pub use column::{
    ColumnModelSignals, DEFAULT_COLUMN_WIDTH, DEFAULT_MIN_COLUMN_WIDTH, EditorFactory,
    TableColumn, TableColumnModel,
};
pub use combo_box::{
    ComboBox, ComboBoxModel, ComboModelSignals, DefaultComboBoxModel, ItemEvent, ListEvent,
};
pub use editor::{CellEditor, CellRenderer, EditingSession, TextCellEditor, TextCellRenderer};
pub use state::{ColumnState, SortDirection, SortKeyState, TableViewState};
pub use table_view::{
    AutoResizeMode, DEFAULT_ROW_HEIGHT, DirtyRegion, TableView, TableViewSignals,
};
