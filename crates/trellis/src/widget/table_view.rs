//! The table view coordinator.
//!
//! [`TableView`] ties the pieces together: a [`TableModel`] for data, a
//! [`TableColumnModel`] for column order and widths, two
//! [`ListSelectionModel`]s for the row and column axes, an optional
//! [`RowSorter`] for view ordering, a row-height ledger, and the editing
//! session. It owns the invariants between them:
//!
//! - every row index crossing the sorter boundary is converted, and the
//!   sorter is treated as untrusted: a mapping that disagrees with the
//!   model's row count is reported, never silently used
//! - selection lives in view coordinates; across a re-sort the view
//!   caches it in model coordinates and restores it, so sorting never
//!   changes *what* is selected, only where it appears
//! - column widths always sum to the view width under any auto-resize
//!   mode other than [`AutoResizeMode::Off`]
//!
//! The view is a plain struct driven by its embedder: model and sorter
//! notifications arrive through [`table_changed`](TableView::table_changed)
//! and [`sorter_changed`](TableView::sorter_changed), which the embedder
//! calls with the events it receives from the respective signals.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::model::{CellValue, VecTableModel, ViewColumn, ViewRow};
//! use trellis::widget::TableView;
//!
//! let model = Arc::new(VecTableModel::new(4, 2));
//! let mut table = TableView::new(model);
//!
//! table.change_selection(ViewRow::new(1), ViewColumn::new(0), false, false)?;
//! assert!(table.is_row_selected(ViewRow::new(1)));
//! # Ok::<(), trellis::ViewError>(())
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};
use trellis_core::{Point, Rect, ReentryFlag, Signal};

use super::column::{TableColumn, TableColumnModel};
use super::editor::{CellEditor, EditingSession, TextCellEditor};
use super::state::{ColumnState, SortKeyState, TableViewState};
use crate::error::ViewError;
use crate::model::{
    CellValue, ListSelectionModel, ModelColumn, ModelRow, RowSorter, RowSorterEvent, RowSpan,
    SizeSequence, SortKey, TableModel, TableModelEvent, TableModelEventKind, TableRowSorter,
    ViewColumn, ViewRow,
};

/// Default height of a row in pixels, spacing included.
pub const DEFAULT_ROW_HEIGHT: i32 = 16;

/// A dirty span wider than this collapses to [`DirtyRegion::All`].
const DIRTY_ROW_COALESCE_LIMIT: usize = 256;

/// How column widths react when the view or a column changes size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoResizeMode {
    /// Columns keep their widths; the table grows past the view.
    Off,
    /// A resize delta is absorbed by the next column only.
    NextColumn,
    /// A resize delta spreads over all columns after the resized one
    /// (default).
    #[default]
    SubsequentColumns,
    /// A resize delta is absorbed by the last column only.
    LastColumn,
    /// A resize delta spreads over every column.
    AllColumns,
}

/// The rows a repaint pass needs to revisit, in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirtyRegion {
    #[default]
    None,
    /// Rows `first..=last` (and everything below them if structure
    /// shifted; callers treat the span as a lower bound for repaint).
    Rows { first: usize, last: usize },
    All,
}

/// Signals emitted by [`TableView`].
///
/// Selection and column signals live on the respective models; the view
/// itself only announces editor lifecycle, with `(view_row, view_column)`
/// payloads.
#[derive(Debug, Default)]
pub struct TableViewSignals {
    pub editing_started: Signal<(usize, usize)>,
    pub editing_stopped: Signal<(usize, usize)>,
    pub editing_cancelled: Signal<(usize, usize)>,
}

/// View-coordinate state parked in model coordinates while the row
/// order changes underneath it.
struct SortManager {
    /// Entered while restored selection is written back, so selection
    /// listeners can tell a sync from a user gesture.
    syncing_selection: ReentryFlag,
}

/// Selection, row heights, and the edited row translated to model
/// coordinates.
struct ModelStateCache {
    selected: Vec<usize>,
    anchor: Option<usize>,
    lead: Option<usize>,
    /// One height per model row; filtered rows carry the default.
    heights: Vec<i32>,
    /// Model row of the in-flight edit, if any.
    editing: Option<usize>,
}

impl ModelStateCache {
    fn splice_insert(&mut self, first: usize, count: usize, default_height: i32) {
        for row in self
            .selected
            .iter_mut()
            .chain(&mut self.anchor)
            .chain(&mut self.lead)
            .chain(&mut self.editing)
        {
            if *row >= first {
                *row += count;
            }
        }
        let at = first.min(self.heights.len());
        self.heights
            .splice(at..at, std::iter::repeat_n(default_height, count));
    }

    fn splice_delete(&mut self, first: usize, last: usize) {
        let count = last - first + 1;
        self.selected.retain(|&row| row < first || row > last);
        for row in &mut self.selected {
            if *row > last {
                *row -= count;
            }
        }
        let adjust = |row: usize| -> Option<usize> {
            if row > last {
                Some(row - count)
            } else if row >= first {
                first.checked_sub(1)
            } else {
                Some(row)
            }
        };
        self.anchor = self.anchor.and_then(adjust);
        self.lead = self.lead.and_then(adjust);
        // A deleted edited row has no position left to remap to.
        self.editing = self.editing.and_then(|row| {
            if row > last {
                Some(row - count)
            } else if row >= first {
                None
            } else {
                Some(row)
            }
        });
        if first < self.heights.len() {
            let end = (last + 1).min(self.heights.len());
            self.heights.drain(first..end);
        }
    }
}

/// The widget coordination core for tabular data.
pub struct TableView {
    model: Arc<dyn TableModel>,
    column_model: TableColumnModel,
    row_selection: ListSelectionModel,
    sorter: Option<Arc<dyn RowSorter>>,
    sort_manager: Option<SortManager>,
    /// View-order row heights, spacing included.
    row_heights: SizeSequence,
    default_row_height: i32,
    row_margin: i32,
    row_selection_allowed: bool,
    /// Recreate columns from the model when its structure changes.
    auto_create_columns: bool,
    /// Remap selection across re-sorts; when off, the selection keeps
    /// its view indices.
    update_selection_on_sort: bool,
    auto_resize_mode: AutoResizeMode,
    resizing_column: Option<ViewColumn>,
    /// The width the column layout distributes over.
    view_width: i32,
    /// Cells whose selected state is flipped relative to the row and
    /// column axis selections. Only populated by single-cell toggles in
    /// cell-selection mode; cleared by every other selection change.
    toggled_cells: HashSet<(usize, usize)>,
    editing: Option<EditingSession>,
    dirty: DirtyRegion,
    /// Entered while this view drives its own sorter, so the sorter's
    /// announcement of that change is not processed twice.
    ignore_sort_change: ReentryFlag,
    pub signals: TableViewSignals,
}

impl TableView {
    /// Creates a view over `model` with one default column per model
    /// column and no sorter.
    pub fn new(model: Arc<dyn TableModel>) -> Self {
        let mut view = Self {
            row_heights: SizeSequence::new_uniform(model.row_count(), DEFAULT_ROW_HEIGHT),
            model,
            column_model: TableColumnModel::new(),
            row_selection: ListSelectionModel::new(),
            sorter: None,
            sort_manager: None,
            default_row_height: DEFAULT_ROW_HEIGHT,
            row_margin: 1,
            row_selection_allowed: true,
            auto_create_columns: true,
            update_selection_on_sort: true,
            auto_resize_mode: AutoResizeMode::default(),
            resizing_column: None,
            view_width: 0,
            toggled_cells: HashSet::new(),
            editing: None,
            dirty: DirtyRegion::All,
            ignore_sort_change: ReentryFlag::new(),
            signals: TableViewSignals::default(),
        };
        view.create_default_columns();
        view.view_width = view.column_model.total_column_width();
        view
    }

    /// Installs a sorter (builder style).
    pub fn with_row_sorter(mut self, sorter: Arc<dyn RowSorter>) -> Self {
        self.set_row_sorter(Some(sorter));
        self
    }

    /// Sets the auto-resize mode (builder style).
    pub fn with_auto_resize_mode(mut self, mode: AutoResizeMode) -> Self {
        self.auto_resize_mode = mode;
        self
    }

    /// Enables cell-level selection (builder style).
    pub fn with_cell_selection(mut self) -> Self {
        self.set_cell_selection_enabled(true);
        self
    }

    /// Sets the layout width (builder style).
    pub fn with_view_width(mut self, width: i32) -> Self {
        self.set_view_width(width);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn model(&self) -> &Arc<dyn TableModel> {
        &self.model
    }

    pub fn column_model(&self) -> &TableColumnModel {
        &self.column_model
    }

    pub fn column_model_mut(&mut self) -> &mut TableColumnModel {
        &mut self.column_model
    }

    pub fn selection_model(&self) -> &ListSelectionModel {
        &self.row_selection
    }

    pub fn selection_model_mut(&mut self) -> &mut ListSelectionModel {
        &mut self.row_selection
    }

    pub fn row_sorter(&self) -> Option<&Arc<dyn RowSorter>> {
        self.sorter.as_ref()
    }

    /// Installs or removes a default [`TableRowSorter`] over the model.
    pub fn set_auto_create_row_sorter(&mut self, enable: bool) {
        if enable {
            let sorter: Arc<dyn RowSorter> = Arc::new(TableRowSorter::new(self.model.clone()));
            self.set_row_sorter(Some(sorter));
        } else {
            self.set_row_sorter(None);
        }
    }

    pub fn auto_create_columns(&self) -> bool {
        self.auto_create_columns
    }

    /// Whether a model structure change rebuilds the columns. Turn this
    /// off to keep a hand-built column arrangement.
    pub fn set_auto_create_columns(&mut self, auto: bool) {
        self.auto_create_columns = auto;
    }

    pub fn update_selection_on_sort(&self) -> bool {
        self.update_selection_on_sort
    }

    /// Whether selection is carried across re-sorts. When off, the
    /// selection keeps its view indices across a re-order, so it may end
    /// up covering different logical rows.
    pub fn set_update_selection_on_sort(&mut self, update: bool) {
        self.update_selection_on_sort = update;
    }

    /// Installs or removes the sorter. Selection and per-row heights are
    /// discarded; the new mapping has no relation to the old order.
    pub fn set_row_sorter(&mut self, sorter: Option<Arc<dyn RowSorter>>) {
        self.cancel_editing();
        self.sort_manager = sorter.as_ref().map(|_| SortManager {
            syncing_selection: ReentryFlag::new(),
        });
        self.sorter = sorter;
        self.row_selection.clear_selection();
        self.row_selection.set_anchor_and_lead(None, None);
        self.toggled_cells.clear();
        self.row_heights = SizeSequence::new_uniform(self.row_count(), self.default_row_height);
        self.mark_dirty_all();
    }

    /// Number of rows the view shows.
    pub fn row_count(&self) -> usize {
        match &self.sorter {
            Some(sorter) => sorter.view_row_count(),
            None => self.model.row_count(),
        }
    }

    /// Number of columns the view shows.
    pub fn column_count(&self) -> usize {
        self.column_model.column_count()
    }

    pub fn auto_resize_mode(&self) -> AutoResizeMode {
        self.auto_resize_mode
    }

    pub fn set_auto_resize_mode(&mut self, mode: AutoResizeMode) {
        self.auto_resize_mode = mode;
        self.do_layout();
    }

    /// The column being dragged by the user, if any. Its width is
    /// authoritative during [`do_layout`](Self::do_layout).
    pub fn resizing_column(&self) -> Option<ViewColumn> {
        self.resizing_column
    }

    pub fn set_resizing_column(&mut self, column: Option<ViewColumn>) {
        self.resizing_column = column;
    }

    pub fn view_width(&self) -> i32 {
        self.view_width
    }

    /// Sets the width the column layout fills and re-lays-out.
    pub fn set_view_width(&mut self, width: i32) {
        self.view_width = width.max(0);
        self.do_layout();
    }

    /// The value shown at a view cell.
    pub fn value_at(&self, row: ViewRow, column: ViewColumn) -> Result<CellValue, ViewError> {
        let model_row = self.convert_row_index_to_model(row)?;
        let model_column = self.convert_column_index_to_model(column)?;
        Ok(self.model.value_at(model_row.get(), model_column.get()))
    }

    /// Writes `value` at a view cell. Returns `Ok(false)` when the model
    /// rejects the write.
    pub fn set_value_at(
        &mut self,
        value: CellValue,
        row: ViewRow,
        column: ViewColumn,
    ) -> Result<bool, ViewError> {
        let model_row = self.convert_row_index_to_model(row)?;
        let model_column = self.convert_column_index_to_model(column)?;
        let accepted = self
            .model
            .set_value_at(value, model_row.get(), model_column.get());
        if accepted {
            self.mark_dirty_rows(row.get(), row.get());
        }
        Ok(accepted)
    }

    /// Whether the model accepts edits for a view cell.
    pub fn is_cell_editable(&self, row: ViewRow, column: ViewColumn) -> Result<bool, ViewError> {
        let model_row = self.convert_row_index_to_model(row)?;
        let model_column = self.convert_column_index_to_model(column)?;
        Ok(self.model.is_editable(model_row.get(), model_column.get()))
    }

    // ========================================================================
    // Coordinate conversion
    // ========================================================================

    /// The model row displayed at `row`.
    ///
    /// With a sorter installed the sorter's mapping is checked against
    /// the model first; a stale mapping is an error, not an answer.
    pub fn convert_row_index_to_model(&self, row: ViewRow) -> Result<ModelRow, ViewError> {
        match &self.sorter {
            Some(sorter) => {
                self.check_sorter(&**sorter)?;
                sorter
                    .convert_row_index_to_model(row)
                    .ok_or(ViewError::RowOutOfBounds {
                        index: row.get(),
                        len: sorter.view_row_count(),
                    })
            }
            None => {
                let len = self.model.row_count();
                if row.get() < len {
                    Ok(ModelRow::new(row.get()))
                } else {
                    Err(ViewError::RowOutOfBounds {
                        index: row.get(),
                        len,
                    })
                }
            }
        }
    }

    /// Where `row` appears in the view; `Ok(None)` when filtered out.
    pub fn convert_row_index_to_view(&self, row: ModelRow) -> Result<Option<ViewRow>, ViewError> {
        let len = self.model.row_count();
        if row.get() >= len {
            return Err(ViewError::RowOutOfBounds {
                index: row.get(),
                len,
            });
        }
        match &self.sorter {
            Some(sorter) => {
                self.check_sorter(&**sorter)?;
                Ok(sorter.convert_row_index_to_view(row))
            }
            None => Ok(Some(ViewRow::new(row.get()))),
        }
    }

    /// The model column displayed at `column`.
    pub fn convert_column_index_to_model(
        &self,
        column: ViewColumn,
    ) -> Result<ModelColumn, ViewError> {
        self.column_model
            .column(column)
            .map(TableColumn::model_index)
            .ok_or(ViewError::ColumnOutOfBounds {
                index: column.get(),
                len: self.column_model.column_count(),
            })
    }

    /// Where model column `column` appears, or `None` when no view
    /// column displays it.
    pub fn convert_column_index_to_view(&self, column: ModelColumn) -> Option<ViewColumn> {
        self.column_model.view_index_of(column)
    }

    fn check_sorter(&self, sorter: &dyn RowSorter) -> Result<(), ViewError> {
        let model_rows = self.model.row_count();
        let sorter_rows = sorter.model_row_count();
        if sorter_rows != model_rows {
            return Err(ViewError::SorterMismatch {
                sorter_rows,
                model_rows,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn row_selection_allowed(&self) -> bool {
        self.row_selection_allowed
    }

    pub fn set_row_selection_allowed(&mut self, allowed: bool) {
        self.row_selection_allowed = allowed;
    }

    pub fn column_selection_allowed(&self) -> bool {
        self.column_model.column_selection_allowed()
    }

    pub fn set_column_selection_allowed(&mut self, allowed: bool) {
        self.column_model.set_column_selection_allowed(allowed);
    }

    /// `true` when both axes select, making the selected region the
    /// intersection of selected rows and columns.
    pub fn cell_selection_enabled(&self) -> bool {
        self.row_selection_allowed && self.column_model.column_selection_allowed()
    }

    pub fn set_cell_selection_enabled(&mut self, enabled: bool) {
        self.row_selection_allowed = enabled;
        self.column_model.set_column_selection_allowed(enabled);
    }

    pub fn is_row_selected(&self, row: ViewRow) -> bool {
        self.row_selection.is_selected_index(row.get())
    }

    pub fn is_column_selected(&self, column: ViewColumn) -> bool {
        self.column_model
            .selection_model()
            .is_selected_index(column.get())
    }

    /// Whether the view cell is selected under the current selection
    /// scheme.
    pub fn is_cell_selected(&self, row: ViewRow, column: ViewColumn) -> bool {
        let row_ok = self.row_selection_allowed;
        let col_ok = self.column_model.column_selection_allowed();
        if !row_ok && !col_ok {
            return false;
        }
        let base = (!row_ok || self.is_row_selected(row)) && (!col_ok || self.is_column_selected(column));
        if row_ok && col_ok {
            base ^ self.toggled_cells.contains(&(row.get(), column.get()))
        } else {
            base
        }
    }

    pub fn selected_rows(&self) -> Vec<ViewRow> {
        self.row_selection
            .selected_indices()
            .into_iter()
            .map(ViewRow::new)
            .collect()
    }

    pub fn selected_columns(&self) -> Vec<ViewColumn> {
        self.column_model
            .selection_model()
            .selected_indices()
            .into_iter()
            .map(ViewColumn::new)
            .collect()
    }

    /// Applies a selection gesture at a view cell.
    ///
    /// The four `(toggle, extend)` combinations are:
    ///
    /// - `(false, false)`: select only this cell's row/column
    /// - `(false, true)`: extend from the anchor to here
    /// - `(true, false)`: flip this cell's selected state, leaving the
    ///   rest of the selection alone
    /// - `(true, true)`: apply the anchor's selected state to everything
    ///   between the anchor and here
    ///
    /// With cell selection enabled, `(true, false)` flips exactly the
    /// one cell; the row and column selections are untouched.
    pub fn change_selection(
        &mut self,
        row: ViewRow,
        column: ViewColumn,
        toggle: bool,
        extend: bool,
    ) -> Result<(), ViewError> {
        self.check_view_row(row)?;
        self.check_view_column(column)?;
        let (r, c) = (row.get(), column.get());

        if self.cell_selection_enabled() && toggle && !extend {
            if !self.toggled_cells.remove(&(r, c)) {
                self.toggled_cells.insert((r, c));
            }
            self.row_selection.set_anchor_and_lead(Some(r), Some(r));
            self.column_model
                .selection_model_mut()
                .set_anchor_and_lead(Some(c), Some(c));
            self.mark_dirty_rows(r, r);
            return Ok(());
        }

        self.toggled_cells.clear();
        let selected = self.is_cell_selected(row, column);
        let row_anchor = self.row_selection.anchor_index().unwrap_or(r);
        change_axis(&mut self.row_selection, r, toggle, extend, selected);
        change_axis(
            self.column_model.selection_model_mut(),
            c,
            toggle,
            extend,
            selected,
        );
        self.mark_dirty_rows(row_anchor.min(r), row_anchor.max(r));
        Ok(())
    }

    /// Selects every row and column, preserving the anchor and lead of
    /// both axes.
    pub fn select_all(&mut self) {
        self.toggled_cells.clear();
        let rows = self.row_count();
        let columns = self.column_count();
        if rows == 0 || columns == 0 {
            return;
        }

        let row_anchor = self.row_selection.anchor_index();
        let row_lead = self.row_selection.lead_index();
        self.row_selection.set_value_is_adjusting(true);
        self.row_selection.set_selection_interval(0, rows - 1);
        self.row_selection.set_anchor_and_lead(row_anchor, row_lead);
        self.row_selection.set_value_is_adjusting(false);

        let columns_sm = self.column_model.selection_model_mut();
        let col_anchor = columns_sm.anchor_index();
        let col_lead = columns_sm.lead_index();
        columns_sm.set_value_is_adjusting(true);
        columns_sm.set_selection_interval(0, columns - 1);
        columns_sm.set_anchor_and_lead(col_anchor, col_lead);
        columns_sm.set_value_is_adjusting(false);

        self.mark_dirty_all();
    }

    /// Deselects everything on both axes.
    pub fn clear_selection(&mut self) {
        self.toggled_cells.clear();
        self.row_selection.clear_selection();
        self.column_model.selection_model_mut().clear_selection();
        self.mark_dirty_all();
    }

    /// Selects rows `first..=last`, replacing the row selection.
    pub fn set_row_selection_interval(
        &mut self,
        first: ViewRow,
        last: ViewRow,
    ) -> Result<(), ViewError> {
        self.check_view_row(first)?;
        self.check_view_row(last)?;
        self.toggled_cells.clear();
        self.row_selection
            .set_selection_interval(first.get(), last.get());
        self.mark_dirty_rows(first.get().min(last.get()), first.get().max(last.get()));
        Ok(())
    }

    /// Adds rows `first..=last` to the row selection.
    pub fn add_row_selection_interval(
        &mut self,
        first: ViewRow,
        last: ViewRow,
    ) -> Result<(), ViewError> {
        self.check_view_row(first)?;
        self.check_view_row(last)?;
        self.toggled_cells.clear();
        self.row_selection
            .add_selection_interval(first.get(), last.get());
        self.mark_dirty_rows(first.get().min(last.get()), first.get().max(last.get()));
        Ok(())
    }

    /// Removes rows `first..=last` from the row selection.
    pub fn remove_row_selection_interval(
        &mut self,
        first: ViewRow,
        last: ViewRow,
    ) -> Result<(), ViewError> {
        self.check_view_row(first)?;
        self.check_view_row(last)?;
        self.toggled_cells.clear();
        self.row_selection
            .remove_selection_interval(first.get(), last.get());
        self.mark_dirty_rows(first.get().min(last.get()), first.get().max(last.get()));
        Ok(())
    }

    /// Selects columns `first..=last`, replacing the column selection.
    pub fn set_column_selection_interval(
        &mut self,
        first: ViewColumn,
        last: ViewColumn,
    ) -> Result<(), ViewError> {
        self.check_view_column(first)?;
        self.check_view_column(last)?;
        self.toggled_cells.clear();
        self.column_model
            .selection_model_mut()
            .set_selection_interval(first.get(), last.get());
        self.mark_dirty_all();
        Ok(())
    }

    fn check_view_row(&self, row: ViewRow) -> Result<(), ViewError> {
        let len = self.row_count();
        if row.get() < len {
            Ok(())
        } else {
            Err(ViewError::RowOutOfBounds {
                index: row.get(),
                len,
            })
        }
    }

    fn check_view_column(&self, column: ViewColumn) -> Result<(), ViewError> {
        let len = self.column_count();
        if column.get() < len {
            Ok(())
        } else {
            Err(ViewError::ColumnOutOfBounds {
                index: column.get(),
                len,
            })
        }
    }

    // ========================================================================
    // Row geometry
    // ========================================================================

    /// The height of a view row, spacing included.
    pub fn row_height(&self, row: ViewRow) -> i32 {
        self.row_heights.size(row.get())
    }

    /// The height newly appearing rows get.
    pub fn default_row_height(&self) -> i32 {
        self.default_row_height
    }

    /// Sets the default height and resets every row to it.
    pub fn set_default_row_height(&mut self, height: i32) -> Result<(), ViewError> {
        if height <= 0 {
            return Err(ViewError::InvalidRowHeight(height));
        }
        self.default_row_height = height;
        self.row_heights = SizeSequence::new_uniform(self.row_count(), height);
        self.mark_dirty_all();
        Ok(())
    }

    /// Sets the height of one view row.
    pub fn set_row_height(&mut self, row: ViewRow, height: i32) -> Result<(), ViewError> {
        if height <= 0 {
            return Err(ViewError::InvalidRowHeight(height));
        }
        self.check_view_row(row)?;
        self.row_heights.set_size(row.get(), height);
        let last = self.row_count().saturating_sub(1);
        self.mark_dirty_rows(row.get(), last);
        Ok(())
    }

    pub fn row_margin(&self) -> i32 {
        self.row_margin
    }

    pub fn set_row_margin(&mut self, margin: i32) {
        self.row_margin = margin.max(0);
        self.mark_dirty_all();
    }

    /// The y offset of a view row.
    pub fn row_y(&self, row: ViewRow) -> i32 {
        self.row_heights.position_of(row.get())
    }

    /// The view row covering pixel `y`, or `None` below the last row.
    pub fn row_at_y(&self, y: i32) -> Option<ViewRow> {
        self.row_heights.index_at(y).map(ViewRow::new)
    }

    /// The view column covering pixel `x`.
    pub fn column_at_x(&self, x: i32) -> Option<ViewColumn> {
        self.column_model.column_at_x(x)
    }

    /// The view row under `point`.
    pub fn row_at_point(&self, point: Point) -> Option<ViewRow> {
        self.row_at_y(point.y)
    }

    /// The view column under `point`.
    pub fn column_at_point(&self, point: Point) -> Option<ViewColumn> {
        self.column_at_x(point.x)
    }

    /// The view cell under `point`, when both axes hit.
    pub fn cell_at_point(&self, point: Point) -> Option<(ViewRow, ViewColumn)> {
        Some((self.row_at_y(point.y)?, self.column_at_x(point.x)?))
    }

    /// Total pixel height of all rows.
    pub fn total_row_height(&self) -> i32 {
        self.row_heights.total_size()
    }

    /// The bounds of a view cell.
    ///
    /// With `include_spacing` the rectangle spans the full row height and
    /// column width; without it the inter-cell margins are inset, giving
    /// the rectangle the renderer actually paints.
    pub fn cell_rect(
        &self,
        row: ViewRow,
        column: ViewColumn,
        include_spacing: bool,
    ) -> Result<Rect, ViewError> {
        self.check_view_row(row)?;
        let Some(col) = self.column_model.column(column) else {
            return Err(ViewError::ColumnOutOfBounds {
                index: column.get(),
                len: self.column_model.column_count(),
            });
        };
        let rect = Rect::new(
            self.column_model.column_x(column),
            self.row_heights.position_of(row.get()),
            col.width(),
            self.row_heights.size(row.get()),
        );
        if include_spacing {
            return Ok(rect);
        }
        let cm = self.column_model.column_margin();
        let rm = self.row_margin;
        Ok(Rect::new(
            rect.x + cm / 2,
            rect.y + rm / 2,
            rect.width - cm,
            rect.height - rm,
        ))
    }

    // ========================================================================
    // Column layout
    // ========================================================================

    /// Recomputes column widths for the current view width.
    ///
    /// Without a resizing column, widths are redistributed from the
    /// columns' preferred widths. With one, the user's chosen width is
    /// authoritative: the delta is pushed onto the columns the
    /// auto-resize mode names, any remainder lands back on the resizing
    /// column (clamped to its bounds), and preferred widths are rewritten
    /// to match so the layout is stable.
    pub fn do_layout(&mut self) {
        if self.auto_resize_mode == AutoResizeMode::Off {
            // Columns answer only to their preferred widths.
            for index in 0..self.column_model.column_count() {
                let index = ViewColumn::new(index);
                if let Some(col) = self.column_model.column(index) {
                    let preferred = col.preferred_width();
                    self.column_model.set_column_width(index, preferred);
                }
            }
            self.mark_dirty_all();
            return;
        }
        match self.resizing_column {
            None => self.set_widths_from_preferred_widths(false),
            Some(index) => {
                let delta = self.view_width - self.column_model.total_column_width();
                self.accommodate_delta(index.get(), i64::from(delta));
                let delta = self.view_width - self.column_model.total_column_width();
                if delta != 0
                    && let Some(col) = self.column_model.column(index)
                {
                    let width = col.width() + delta;
                    self.column_model.set_column_width(index, width);
                }
                self.set_widths_from_preferred_widths(true);
            }
        }
        self.mark_dirty_all();
    }

    fn set_widths_from_preferred_widths(&mut self, inverse: bool) {
        let total_preferred: i64 = self
            .column_model
            .columns()
            .iter()
            .map(|c| i64::from(c.preferred_width()))
            .sum();
        let target = if inverse {
            total_preferred
        } else {
            i64::from(self.view_width)
        };
        let triples: Vec<(i64, i64, i64)> = self
            .column_model
            .columns()
            .iter()
            .map(|c| {
                let mid = if inverse { c.width() } else { c.preferred_width() };
                (i64::from(c.min_width()), i64::from(mid), i64::from(c.max_width()))
            })
            .collect();
        let sizes = adjust_sizes(target, &triples, inverse);
        for (index, size) in sizes.into_iter().enumerate() {
            let index = ViewColumn::new(index);
            if inverse {
                if let Some(col) = self.column_model.column_mut(index) {
                    col.set_preferred_width(size);
                }
            } else {
                self.column_model.set_column_width(index, size);
            }
        }
    }

    /// Pushes `delta` pixels onto the columns the auto-resize mode picks,
    /// relative to the column at `resizing_index`.
    fn accommodate_delta(&mut self, resizing_index: usize, delta: i64) {
        let column_count = self.column_model.column_count();
        let (from, to) = match self.auto_resize_mode {
            AutoResizeMode::NextColumn => {
                let from = resizing_index + 1;
                (from, (from + 1).min(column_count))
            }
            AutoResizeMode::SubsequentColumns => (resizing_index + 1, column_count),
            AutoResizeMode::LastColumn => (column_count.saturating_sub(1), column_count),
            AutoResizeMode::AllColumns => (0, column_count),
            AutoResizeMode::Off => return,
        };
        if from >= to {
            return;
        }
        let triples: Vec<(i64, i64, i64)> = self.column_model.columns()[from..to]
            .iter()
            .map(|c| {
                (
                    i64::from(c.min_width()),
                    i64::from(c.width()),
                    i64::from(c.max_width()),
                )
            })
            .collect();
        let total: i64 = triples.iter().map(|&(_, mid, _)| mid).sum();
        let sizes = adjust_sizes(total + delta, &triples, false);
        for (offset, size) in sizes.into_iter().enumerate() {
            self.column_model
                .set_column_width(ViewColumn::new(from + offset), size);
        }
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    /// Cycles the sort on the column at view position `column`,
    /// preserving selection, row heights, and the edited cell across the
    /// re-order.
    pub fn toggle_sort_order(&mut self, column: ViewColumn) -> Result<(), ViewError> {
        let model_column = self.convert_column_index_to_model(column)?;
        let Some(sorter) = self.sorter.clone() else {
            return Ok(());
        };
        let cached = self.cache_model_state(&*sorter);
        {
            let _own_change = self.ignore_sort_change.enter();
            sorter.toggle_sort_order(model_column);
        }
        self.restore_model_state(&*sorter, cached);
        self.toggled_cells.clear();
        self.mark_dirty_all();
        Ok(())
    }

    /// Reconciles against a sorter change this view did not initiate.
    ///
    /// The embedder forwards events from the sorter's signal here. For a
    /// [`RowSorterEvent::Sorted`] event, view-coordinate state is carried
    /// across using the previous mapping the event provides; rows the new
    /// mapping filters out drop out of the selection.
    pub fn sorter_changed(&mut self, event: &RowSorterEvent) {
        if self.ignore_sort_change.is_entered() {
            return;
        }
        let Some(sorter) = self.sorter.clone() else {
            return;
        };
        match event {
            RowSorterEvent::SortOrderChanged => {}
            RowSorterEvent::Sorted {
                previous_view_to_model,
            } => {
                let model_count = sorter.model_row_count();
                let cached = self.cache_model_state_with(model_count, |view| {
                    previous_view_to_model.get(view).map(|m| m.get())
                });
                self.restore_model_state(&*sorter, cached);
                self.toggled_cells.clear();
                self.mark_dirty_all();
            }
        }
    }

    /// Snapshot of selection and heights keyed by model row, taken
    /// through the sorter's current mapping.
    fn cache_model_state(&self, sorter: &dyn RowSorter) -> ModelStateCache {
        self.cache_model_state_with(sorter.model_row_count(), |view| {
            sorter
                .convert_row_index_to_model(ViewRow::new(view))
                .map(|m| m.get())
        })
    }

    fn cache_model_state_with<F>(&self, model_count: usize, to_model: F) -> ModelStateCache
    where
        F: Fn(usize) -> Option<usize>,
    {
        let selected = self
            .row_selection
            .selected_indices()
            .into_iter()
            .filter_map(&to_model)
            .collect();
        let anchor = self.row_selection.anchor_index().and_then(&to_model);
        let lead = self.row_selection.lead_index().and_then(&to_model);

        let mut heights = vec![self.default_row_height; model_count];
        for view in 0..self.row_heights.len() {
            if let Some(model) = to_model(view)
                && model < model_count
            {
                heights[model] = self.row_heights.size(view);
            }
        }
        ModelStateCache {
            selected,
            anchor,
            lead,
            heights,
            editing: self.editing.as_ref().and_then(|s| to_model(s.row.get())),
        }
    }

    /// Writes a model-coordinate snapshot back through the sorter's new
    /// mapping. An in-flight edit follows its row; when the row has no
    /// position under the new mapping the edit is cancelled.
    fn restore_model_state(&mut self, sorter: &dyn RowSorter, cache: ModelStateCache) {
        let view_count = sorter.view_row_count();
        let sizes: Vec<i32> = (0..view_count)
            .map(|view| {
                sorter
                    .convert_row_index_to_model(ViewRow::new(view))
                    .and_then(|m| cache.heights.get(m.get()).copied())
                    .unwrap_or(self.default_row_height)
            })
            .collect();
        self.row_heights = SizeSequence::from_sizes(sizes);

        // With the flag off the selection keeps its view indices; after a
        // re-order those indices may cover different logical rows.
        if self.update_selection_on_sort {
            let _syncing = self
                .sort_manager
                .as_ref()
                .and_then(|m| m.syncing_selection.enter());
            self.row_selection.set_value_is_adjusting(true);
            self.row_selection.clear_selection();
            let mut restored = 0usize;
            for model in &cache.selected {
                if let Some(view) = sorter.convert_row_index_to_view(ModelRow::new(*model)) {
                    self.row_selection
                        .add_selection_interval(view.get(), view.get());
                    restored += 1;
                }
            }
            let anchor = cache
                .anchor
                .and_then(|m| sorter.convert_row_index_to_view(ModelRow::new(m)))
                .map(ViewRow::get);
            let lead = cache
                .lead
                .and_then(|m| sorter.convert_row_index_to_view(ModelRow::new(m)))
                .map(ViewRow::get);
            self.row_selection.set_anchor_and_lead(anchor, lead);
            self.row_selection.set_value_is_adjusting(false);
            debug!(
                cached = cache.selected.len(),
                restored, "restored selection across sort"
            );
        }

        if self.editing.is_some() {
            let remapped = cache
                .editing
                .and_then(|m| sorter.convert_row_index_to_view(ModelRow::new(m)));
            match remapped {
                Some(view) => {
                    if let Some(session) = self.editing.as_mut() {
                        session.row = view;
                    }
                }
                None => self.cancel_editing(),
            }
        }
    }

    /// `true` while this view is writing restored selection back after a
    /// re-sort. Selection listeners can use this to tell a sync from a
    /// user gesture.
    pub fn is_syncing_selection(&self) -> bool {
        self.sort_manager
            .as_ref()
            .is_some_and(|m| m.syncing_selection.is_entered())
    }

    // ========================================================================
    // Model reconciliation
    // ========================================================================

    /// Reconciles against a model change. The embedder forwards events
    /// from the model's `table_changed` signal here, after the model has
    /// already changed.
    pub fn table_changed(&mut self, event: &TableModelEvent) {
        trace!(?event, "table changed");
        if event.kind == TableModelEventKind::HeaderChanged {
            self.header_changed();
            return;
        }
        if event.rows == RowSpan::All {
            self.all_rows_changed();
            return;
        }
        let RowSpan::Range { first, last } = event.rows else {
            return;
        };
        if last < first {
            return;
        }
        match &self.sorter {
            Some(_) => self.sorted_table_changed(event.kind, first, last, event.column),
            None => self.plain_table_changed(event.kind, first, last),
        }
    }

    /// Structure-preserving handling when no sorter is installed: view
    /// coordinates equal model coordinates, so splices apply directly.
    fn plain_table_changed(&mut self, kind: TableModelEventKind, first: usize, last: usize) {
        let count = last - first + 1;
        match kind {
            TableModelEventKind::Update => {
                let last = last.min(self.row_count().saturating_sub(1));
                self.mark_dirty_rows(first.min(last), last);
            }
            TableModelEventKind::Insert => {
                if let Some(session) = self.editing.as_mut()
                    && session.row.get() >= first
                {
                    session.row = ViewRow::new(session.row.get() + count);
                }
                self.row_selection.insert_index_interval(first, count, true);
                self.row_heights
                    .insert_entries(first, count, self.default_row_height);
                self.toggled_cells.clear();
                let end = self.row_count().saturating_sub(1);
                self.mark_dirty_rows(first, end);
            }
            TableModelEventKind::Delete => {
                if let Some(session) = self.editing.as_mut() {
                    let row = session.row.get();
                    if row > last {
                        session.row = ViewRow::new(row - count);
                    } else if row >= first {
                        self.cancel_editing();
                    }
                }
                self.row_selection.remove_index_interval(first, last);
                self.row_heights.remove_entries(first, count);
                self.toggled_cells.clear();
                let end = self.row_count().saturating_sub(1);
                self.mark_dirty_rows(first.min(end), end);
            }
            TableModelEventKind::HeaderChanged => {}
        }
    }

    /// Reconciliation with a sorter installed: park view state in model
    /// coordinates, splice it alongside the model change, drive the
    /// sorter, then restore through the rebuilt mapping.
    fn sorted_table_changed(
        &mut self,
        kind: TableModelEventKind,
        first: usize,
        last: usize,
        column: Option<usize>,
    ) {
        let Some(sorter) = self.sorter.clone() else {
            return;
        };
        let mut cached = self.cache_model_state(&*sorter);
        let count = last - first + 1;
        {
            let _own_change = self.ignore_sort_change.enter();
            match kind {
                TableModelEventKind::Update => sorter.rows_updated(first, last, column),
                TableModelEventKind::Insert => {
                    cached.splice_insert(first, count, self.default_row_height);
                    sorter.rows_inserted(first, last);
                }
                TableModelEventKind::Delete => {
                    cached.splice_delete(first, last);
                    sorter.rows_deleted(first, last);
                }
                TableModelEventKind::HeaderChanged => {}
            }
        }
        self.restore_model_state(&*sorter, cached);
        self.toggled_cells.clear();
        self.mark_dirty_all();
    }

    /// Everything may have changed: selection and per-row heights have
    /// no surviving referent.
    fn all_rows_changed(&mut self) {
        self.cancel_editing();
        if let Some(sorter) = self.sorter.clone() {
            let _own_change = self.ignore_sort_change.enter();
            sorter.all_rows_changed();
        }
        self.reset_row_state();
    }

    /// The model's column structure changed: rebuild columns and drop
    /// all row and column state.
    fn header_changed(&mut self) {
        self.cancel_editing();
        if self.auto_create_columns {
            self.create_default_columns();
        }
        if let Some(sorter) = self.sorter.clone() {
            let _own_change = self.ignore_sort_change.enter();
            sorter.model_structure_changed();
        }
        self.reset_row_state();
        self.do_layout();
    }

    fn reset_row_state(&mut self) {
        self.row_selection.clear_selection();
        self.row_selection.set_anchor_and_lead(None, None);
        self.toggled_cells.clear();
        self.row_heights = SizeSequence::new_uniform(self.row_count(), self.default_row_height);
        self.mark_dirty_all();
    }

    /// Discards the current columns and rebuilds one per model column.
    pub fn create_default_columns_from_model(&mut self) {
        self.create_default_columns();
        self.do_layout();
    }

    /// Replaces the columns with one default column per model column.
    fn create_default_columns(&mut self) {
        while self.column_model.column_count() > 0 {
            self.column_model.remove_column(ViewColumn::new(0));
        }
        for index in 0..self.model.column_count() {
            let column = TableColumn::new(ModelColumn::new(index))
                .with_header(self.model.column_name(index));
            self.column_model.add_column(column);
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Starts editing the cell at a view position.
    ///
    /// Returns `Ok(false)` when the model refuses edits for that cell, or
    /// when a previous editor refuses to commit. A column editor factory
    /// takes precedence over the default text editor.
    pub fn edit_cell_at(&mut self, row: ViewRow, column: ViewColumn) -> Result<bool, ViewError> {
        if self.editing.is_some() && !self.stop_editing() {
            return Ok(false);
        }
        let model_row = self.convert_row_index_to_model(row)?;
        let model_column = self.convert_column_index_to_model(column)?;
        if !self.model.is_editable(model_row.get(), model_column.get()) {
            return Ok(false);
        }
        let value = self.model.value_at(model_row.get(), model_column.get());
        let class = self.model.column_class(model_column.get());
        let editor: Box<dyn CellEditor> = match self
            .column_model
            .column(column)
            .and_then(TableColumn::editor_factory)
        {
            Some(factory) => factory(&value, class),
            None => Box::new(TextCellEditor::new(value, class)),
        };
        self.editing = Some(EditingSession {
            row,
            column,
            editor,
        });
        self.signals
            .editing_started
            .emit((row.get(), column.get()));
        Ok(true)
    }

    /// The cell being edited, if any.
    pub fn editing_cell(&self) -> Option<(ViewRow, ViewColumn)> {
        self.editing.as_ref().map(|s| (s.row, s.column))
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// The active editor, for feeding input.
    pub fn editor_mut(&mut self) -> Option<&mut (dyn CellEditor + 'static)> {
        self.editing.as_mut().map(|s| &mut *s.editor)
    }

    /// Commits the active edit into the model.
    ///
    /// Returns `false` when the editor judges its input invalid; the
    /// session stays open and the model is untouched. With no active
    /// session this is a no-op returning `true`.
    pub fn stop_editing(&mut self) -> bool {
        let Some(session) = self.editing.as_mut() else {
            return true;
        };
        if !session.editor.stop_editing() {
            trace!("editor refused to commit");
            return false;
        }
        let value = session.editor.value();
        let (row, column) = (session.row, session.column);
        self.editing = None;
        if let (Ok(model_row), Ok(model_column)) = (
            self.convert_row_index_to_model(row),
            self.convert_column_index_to_model(column),
        ) {
            self.model
                .set_value_at(value, model_row.get(), model_column.get());
        }
        self.signals
            .editing_stopped
            .emit((row.get(), column.get()));
        self.mark_dirty_rows(row.get(), row.get());
        true
    }

    /// Discards the active edit without touching the model.
    pub fn cancel_editing(&mut self) {
        if let Some(mut session) = self.editing.take() {
            session.editor.cancel_editing();
            self.signals
                .editing_cancelled
                .emit((session.row.get(), session.column.get()));
        }
    }

    // ========================================================================
    // State snapshots
    // ========================================================================

    /// Captures column layout, sort keys, selection, and row heights.
    ///
    /// Row entries are stored in model coordinates, so a snapshot taken
    /// under one sort order restores correctly under another.
    pub fn save_state(&self) -> TableViewState {
        let columns = self
            .column_model
            .columns()
            .iter()
            .map(|c| ColumnState {
                model_index: c.model_index().get(),
                width: c.width(),
                preferred_width: c.preferred_width(),
                header: c.header_value().map(str::to_owned),
            })
            .collect();
        let sort_keys = self
            .sorter
            .as_ref()
            .map(|s| s.sort_keys().into_iter().map(SortKeyState::from).collect())
            .unwrap_or_default();

        let to_model = |view: usize| -> Option<usize> {
            match &self.sorter {
                Some(sorter) => sorter
                    .convert_row_index_to_model(ViewRow::new(view))
                    .map(|m| m.get()),
                None => Some(view),
            }
        };
        let mut selected_rows: Vec<usize> = self
            .row_selection
            .selected_indices()
            .into_iter()
            .filter_map(to_model)
            .collect();
        selected_rows.sort_unstable();

        let model_count = self.model.row_count();
        let mut row_heights = vec![self.default_row_height; model_count];
        for view in 0..self.row_heights.len() {
            if let Some(model) = to_model(view)
                && model < model_count
            {
                row_heights[model] = self.row_heights.size(view);
            }
        }

        TableViewState {
            columns,
            sort_keys,
            selected_rows,
            default_row_height: self.default_row_height,
            row_heights,
        }
    }

    /// Restores a snapshot taken by [`save_state`](Self::save_state).
    ///
    /// The snapshot is validated before anything is touched: on error the
    /// view is unchanged. Selected rows past the model's end are dropped
    /// silently; a snapshot from a smaller model is still useful.
    pub fn restore_state(&mut self, state: &TableViewState) -> Result<(), ViewError> {
        if state.default_row_height <= 0 {
            return Err(ViewError::InvalidSnapshot(format!(
                "default row height {} is not positive",
                state.default_row_height
            )));
        }
        if let Some(&bad) = state.row_heights.iter().find(|&&h| h <= 0) {
            return Err(ViewError::InvalidSnapshot(format!(
                "row height {bad} is not positive"
            )));
        }
        let column_count = self.model.column_count();
        for column in &state.columns {
            if column.model_index >= column_count {
                return Err(ViewError::InvalidSnapshot(format!(
                    "column {} is outside the model's {} columns",
                    column.model_index, column_count
                )));
            }
        }

        self.cancel_editing();
        while self.column_model.column_count() > 0 {
            self.column_model.remove_column(ViewColumn::new(0));
        }
        for column in &state.columns {
            let mut col = TableColumn::new(ModelColumn::new(column.model_index));
            col.set_preferred_width(column.preferred_width);
            col.set_width(column.width);
            col.set_header_value(column.header.clone());
            self.column_model.add_column(col);
        }
        self.default_row_height = state.default_row_height;

        if let Some(sorter) = self.sorter.clone() {
            let keys = state.sort_keys.iter().copied().map(SortKey::from).collect();
            let _own_change = self.ignore_sort_change.enter();
            sorter.set_sort_keys(keys);
        }

        // Row state comes back through the freshly rebuilt mapping.
        let model_count = self.model.row_count();
        let to_view = |model: usize| -> Option<usize> {
            match &self.sorter {
                Some(sorter) => sorter
                    .convert_row_index_to_view(ModelRow::new(model))
                    .map(|v| v.get()),
                None => (model < model_count).then_some(model),
            }
        };
        let view_count = self.row_count();
        let sizes: Vec<i32> = (0..view_count)
            .map(|view| {
                let model = match &self.sorter {
                    Some(sorter) => sorter
                        .convert_row_index_to_model(ViewRow::new(view))
                        .map(|m| m.get()),
                    None => Some(view),
                };
                model
                    .and_then(|m| state.row_heights.get(m).copied())
                    .unwrap_or(self.default_row_height)
            })
            .collect();
        self.row_heights = SizeSequence::from_sizes(sizes);

        self.toggled_cells.clear();
        self.row_selection.set_value_is_adjusting(true);
        self.row_selection.clear_selection();
        for &model in &state.selected_rows {
            if model >= model_count {
                continue;
            }
            if let Some(view) = to_view(model) {
                self.row_selection.add_selection_interval(view, view);
            }
        }
        self.row_selection.set_value_is_adjusting(false);

        self.mark_dirty_all();
        Ok(())
    }

    // ========================================================================
    // Dirty tracking
    // ========================================================================

    /// The region a repaint pass must revisit, cleared on read.
    pub fn take_dirty_region(&mut self) -> DirtyRegion {
        std::mem::take(&mut self.dirty)
    }

    pub fn dirty_region(&self) -> DirtyRegion {
        self.dirty
    }

    fn mark_dirty_rows(&mut self, first: usize, last: usize) {
        self.dirty = match self.dirty {
            DirtyRegion::All => DirtyRegion::All,
            DirtyRegion::None => DirtyRegion::Rows { first, last },
            DirtyRegion::Rows { first: f, last: l } => {
                let first = f.min(first);
                let last = l.max(last);
                if last - first + 1 > DIRTY_ROW_COALESCE_LIMIT {
                    DirtyRegion::All
                } else {
                    DirtyRegion::Rows { first, last }
                }
            }
        };
    }

    fn mark_dirty_all(&mut self) {
        self.dirty = DirtyRegion::All;
    }
}

/// One axis of a selection gesture.
fn change_axis(
    sm: &mut ListSelectionModel,
    index: usize,
    toggle: bool,
    extend: bool,
    selected: bool,
) {
    if extend {
        let anchor = sm.anchor_index().unwrap_or(index);
        if toggle {
            if sm.is_selected_index(anchor) {
                sm.add_selection_interval(anchor, index);
            } else {
                sm.remove_selection_interval(anchor, index);
            }
        } else {
            sm.set_selection_interval(anchor, index);
        }
    } else if toggle {
        if selected {
            sm.remove_selection_interval(index, index);
        } else {
            sm.add_selection_interval(index, index);
        }
    } else {
        sm.set_selection_interval(index, index);
    }
}

/// Distributes `target` over elements bounded by `(lower, mid, upper)`
/// triples.
///
/// When the target sits below the mid total, sizes interpolate in
/// `[lower, mid]`; above it, in `[mid, upper]` (swapped when `inverse`).
/// The running-total form conserves the target exactly: each element
/// takes its rounded share and the remainder stays in play for the
/// elements after it.
fn adjust_sizes(target: i64, triples: &[(i64, i64, i64)], inverse: bool) -> Vec<i32> {
    let total_mid: i64 = triples.iter().map(|&(_, mid, _)| mid).sum();
    let use_lower_half = (target < total_mid) == !inverse;
    let bounds: Vec<(i64, i64)> = triples
        .iter()
        .map(|&(lower, mid, upper)| {
            if use_lower_half {
                (lower, mid)
            } else {
                (mid, upper)
            }
        })
        .collect();
    distribute(target, &bounds, !inverse)
}

/// The inner distribution over `(lower, upper)` bounds.
fn distribute(mut target: i64, bounds: &[(i64, i64)], limit_to_range: bool) -> Vec<i32> {
    let mut total_lower: i64 = bounds.iter().map(|&(lower, _)| lower).sum();
    let mut total_upper: i64 = bounds.iter().map(|&(_, upper)| upper).sum();
    if limit_to_range {
        target = target.clamp(total_lower, total_upper);
    }
    let mut sizes = Vec::with_capacity(bounds.len());
    for &(lower, upper) in bounds {
        let new_size = if total_lower == total_upper {
            lower
        } else {
            let f = (target - total_lower) as f64 / (total_upper - total_lower) as f64;
            lower + (f * (upper - lower) as f64).round() as i64
        };
        sizes.push(new_size as i32);
        target -= new_size;
        total_lower -= lower;
        total_upper -= upper;
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        SortKey, SortOrder, TableRowSorter, VecTableModel,
    };
    use proptest::prelude::*;

    fn v(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn three_by_three() -> Arc<VecTableModel> {
        Arc::new(VecTableModel::from_rows(
            vec![
                vec![v("a0"), v("a1"), v("a2")],
                vec![v("b0"), v("b1"), v("b2")],
                vec![v("c0"), v("c1"), v("c2")],
            ],
            3,
        ))
    }

    fn fruit_model() -> Arc<VecTableModel> {
        Arc::new(VecTableModel::from_rows(
            vec![
                vec![v("Cherry")],
                vec![v("Apple")],
                vec![v("Banana")],
            ],
            1,
        ))
    }

    fn sorted_table(model: Arc<VecTableModel>) -> (TableView, Arc<TableRowSorter>) {
        let sorter = Arc::new(TableRowSorter::new(model.clone()));
        let table = TableView::new(model).with_row_sorter(sorter.clone());
        (table, sorter)
    }

    // ------------------------------------------------------------------
    // Coordinate translation
    // ------------------------------------------------------------------

    #[test]
    fn test_row_round_trip_under_sort() {
        let (table, sorter) = sorted_table(fruit_model());
        sorter.set_sort_keys(vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]);

        for view in 0..table.row_count() {
            let view = ViewRow::new(view);
            let model = table.convert_row_index_to_model(view).unwrap();
            assert_eq!(table.convert_row_index_to_view(model).unwrap(), Some(view));
        }
        // Apple sorts first; it is model row 1.
        assert_eq!(
            table.convert_row_index_to_model(ViewRow::new(0)).unwrap(),
            ModelRow::new(1)
        );
    }

    #[test]
    fn test_out_of_range_row_is_rejected() {
        let table = TableView::new(three_by_three());
        assert_eq!(
            table.convert_row_index_to_model(ViewRow::new(3)),
            Err(ViewError::RowOutOfBounds { index: 3, len: 3 })
        );
        assert_eq!(
            table.convert_row_index_to_view(ModelRow::new(7)),
            Err(ViewError::RowOutOfBounds { index: 7, len: 3 })
        );
    }

    #[test]
    fn test_stale_sorter_is_reported() {
        let model = fruit_model();
        let (table, _sorter) = sorted_table(model.clone());
        // Grow the model but do not tell the sorter.
        model.insert_rows(3, vec![vec![v("Durian")]]);

        assert_eq!(
            table.convert_row_index_to_model(ViewRow::new(0)),
            Err(ViewError::SorterMismatch {
                sorter_rows: 3,
                model_rows: 4,
            })
        );
    }

    #[test]
    fn test_column_conversion_follows_moves() {
        let mut table = TableView::new(three_by_three());
        table
            .column_model_mut()
            .move_column(ViewColumn::new(0), ViewColumn::new(2));

        assert_eq!(
            table
                .convert_column_index_to_model(ViewColumn::new(2))
                .unwrap(),
            ModelColumn::new(0)
        );
        assert_eq!(
            table.convert_column_index_to_view(ModelColumn::new(0)),
            Some(ViewColumn::new(2))
        );
    }

    // ------------------------------------------------------------------
    // Selection gestures
    // ------------------------------------------------------------------

    #[test]
    fn test_plain_click_selects_single_row() {
        let mut table = TableView::new(three_by_three());
        table
            .change_selection(ViewRow::new(1), ViewColumn::new(0), false, false)
            .unwrap();
        table
            .change_selection(ViewRow::new(2), ViewColumn::new(0), false, false)
            .unwrap();
        assert_eq!(table.selected_rows(), vec![ViewRow::new(2)]);
    }

    #[test]
    fn test_extend_grows_from_anchor() {
        let mut table = TableView::new(three_by_three());
        table
            .change_selection(ViewRow::new(0), ViewColumn::new(0), false, false)
            .unwrap();
        table
            .change_selection(ViewRow::new(2), ViewColumn::new(0), false, true)
            .unwrap();
        assert_eq!(
            table.selected_rows(),
            vec![ViewRow::new(0), ViewRow::new(1), ViewRow::new(2)]
        );
        // Anchor stays put for further extension.
        assert_eq!(table.selection_model().anchor_index(), Some(0));
    }

    #[test]
    fn test_toggle_flips_row() {
        let mut table = TableView::new(three_by_three());
        table.set_row_selection_interval(ViewRow::new(0), ViewRow::new(2)).unwrap();

        table
            .change_selection(ViewRow::new(1), ViewColumn::new(0), true, false)
            .unwrap();
        assert_eq!(table.selected_rows(), vec![ViewRow::new(0), ViewRow::new(2)]);

        table
            .change_selection(ViewRow::new(1), ViewColumn::new(0), true, false)
            .unwrap();
        assert_eq!(
            table.selected_rows(),
            vec![ViewRow::new(0), ViewRow::new(1), ViewRow::new(2)]
        );
    }

    #[test]
    fn test_cell_toggle_flips_exactly_one_cell() {
        let mut table = TableView::new(three_by_three()).with_cell_selection();
        table.set_row_selection_interval(ViewRow::new(1), ViewRow::new(2)).unwrap();
        table
            .set_column_selection_interval(ViewColumn::new(1), ViewColumn::new(2))
            .unwrap();

        for r in 1..=2 {
            for c in 1..=2 {
                assert!(table.is_cell_selected(ViewRow::new(r), ViewColumn::new(c)));
            }
        }

        table
            .change_selection(ViewRow::new(1), ViewColumn::new(1), true, false)
            .unwrap();

        assert!(!table.is_cell_selected(ViewRow::new(1), ViewColumn::new(1)));
        assert!(table.is_cell_selected(ViewRow::new(1), ViewColumn::new(2)));
        assert!(table.is_cell_selected(ViewRow::new(2), ViewColumn::new(1)));
        assert!(table.is_cell_selected(ViewRow::new(2), ViewColumn::new(2)));

        // Toggling again restores it.
        table
            .change_selection(ViewRow::new(1), ViewColumn::new(1), true, false)
            .unwrap();
        assert!(table.is_cell_selected(ViewRow::new(1), ViewColumn::new(1)));

        // Any non-toggle gesture discards the per-cell flips.
        table
            .change_selection(ViewRow::new(1), ViewColumn::new(1), true, false)
            .unwrap();
        table
            .change_selection(ViewRow::new(0), ViewColumn::new(0), false, false)
            .unwrap();
        assert!(table.is_cell_selected(ViewRow::new(0), ViewColumn::new(0)));
        assert!(!table.is_cell_selected(ViewRow::new(1), ViewColumn::new(1)));
    }

    #[test]
    fn test_extend_toggle_applies_anchor_state() {
        let mut table = TableView::new(three_by_three());
        // Anchor at an unselected row: extend+toggle deselects the range.
        table.set_row_selection_interval(ViewRow::new(0), ViewRow::new(2)).unwrap();
        table
            .change_selection(ViewRow::new(0), ViewColumn::new(0), true, false)
            .unwrap();
        assert!(!table.is_row_selected(ViewRow::new(0)));

        table
            .change_selection(ViewRow::new(2), ViewColumn::new(0), true, true)
            .unwrap();
        assert_eq!(table.selected_rows(), Vec::<ViewRow>::new());
    }

    #[test]
    fn test_select_all_preserves_anchor_and_lead() {
        let mut table = TableView::new(three_by_three());
        table
            .change_selection(ViewRow::new(1), ViewColumn::new(0), false, false)
            .unwrap();
        table.select_all();

        assert_eq!(table.selected_rows().len(), 3);
        assert_eq!(table.selection_model().anchor_index(), Some(1));
        assert_eq!(table.selection_model().lead_index(), Some(1));
    }

    #[test]
    fn test_select_all_on_degenerate_table_drops_cell_toggles() {
        let mut table = TableView::new(three_by_three()).with_cell_selection();
        table
            .change_selection(ViewRow::new(1), ViewColumn::new(1), true, false)
            .unwrap();
        assert!(table.is_cell_selected(ViewRow::new(1), ViewColumn::new(1)));

        while table.column_model().column_count() > 0 {
            table.column_model_mut().remove_column(ViewColumn::new(0));
        }
        table.select_all();
        table.create_default_columns_from_model();

        // The stale per-cell flip did not survive.
        assert!(!table.is_cell_selected(ViewRow::new(1), ViewColumn::new(1)));
    }

    #[test]
    fn test_selection_rejects_out_of_bounds() {
        let mut table = TableView::new(three_by_three());
        assert!(table
            .change_selection(ViewRow::new(5), ViewColumn::new(0), false, false)
            .is_err());
        assert!(table
            .set_row_selection_interval(ViewRow::new(0), ViewRow::new(3))
            .is_err());
        // Nothing was clamped or applied.
        assert!(table.selection_model().is_selection_empty());
    }

    // ------------------------------------------------------------------
    // Sorting and reconciliation
    // ------------------------------------------------------------------

    #[test]
    fn test_selection_persists_across_sort() {
        let (mut table, _sorter) = sorted_table(fruit_model());
        // Select "Banana", at view row 2 in unsorted order.
        table.set_row_selection_interval(ViewRow::new(2), ViewRow::new(2)).unwrap();

        table.toggle_sort_order(ViewColumn::new(0)).unwrap();

        // Sorted ascending: Apple, Banana, Cherry. Banana is view row 1.
        assert_eq!(table.selected_rows(), vec![ViewRow::new(1)]);
        assert_eq!(
            table.value_at(ViewRow::new(1), ViewColumn::new(0)).unwrap(),
            v("Banana")
        );

        table.toggle_sort_order(ViewColumn::new(0)).unwrap();
        // Descending: Cherry, Banana, Apple.
        assert_eq!(table.selected_rows(), vec![ViewRow::new(1)]);
    }

    #[test]
    fn test_filtered_out_rows_leave_selection() {
        let (mut table, sorter) = sorted_table(fruit_model());
        table.set_row_selection_interval(ViewRow::new(1), ViewRow::new(2)).unwrap();

        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let e = events.clone();
        sorter.signals().sorter_changed.connect(move |event| {
            e.lock().push(event.clone());
        });

        // Hide "Apple" (model row 1). The view did not drive this.
        sorter.set_filter(Some(Arc::new(|model, row| {
            model.value_at(row, 0) != CellValue::from("Apple")
        })));
        for event in events.lock().iter() {
            table.sorter_changed(event);
        }

        // Banana (model row 2) survives at view row 1; Apple is gone.
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.selected_rows(), vec![ViewRow::new(1)]);
        assert_eq!(
            table.value_at(ViewRow::new(1), ViewColumn::new(0)).unwrap(),
            v("Banana")
        );
    }

    #[test]
    fn test_insert_with_sorter_keeps_selection() {
        let model = fruit_model();
        let (mut table, sorter) = sorted_table(model.clone());
        sorter.set_sort_keys(vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]);

        // Select "Cherry": sorted view row 2, model row 0.
        table.set_row_selection_interval(ViewRow::new(2), ViewRow::new(2)).unwrap();

        model.insert_rows(0, vec![vec![v("Apricot")]]);
        table.table_changed(&TableModelEvent::insert(0, 0));

        // Apple, Apricot, Banana, Cherry: Cherry now view row 3.
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.selected_rows(), vec![ViewRow::new(3)]);
        assert_eq!(
            table.value_at(ViewRow::new(3), ViewColumn::new(0)).unwrap(),
            v("Cherry")
        );
    }

    #[test]
    fn test_delete_with_sorter_drops_selected_row() {
        let model = fruit_model();
        let (mut table, sorter) = sorted_table(model.clone());
        sorter.set_sort_keys(vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]);

        // Select Apple (view 0, model 1) and Cherry (view 2, model 0).
        table.set_row_selection_interval(ViewRow::new(0), ViewRow::new(0)).unwrap();
        table.add_row_selection_interval(ViewRow::new(2), ViewRow::new(2)).unwrap();

        model.remove_rows(1, 1);
        table.table_changed(&TableModelEvent::delete(1, 1));

        // Banana, Cherry remain; only Cherry is still selected.
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.selected_rows(), vec![ViewRow::new(1)]);
        assert_eq!(
            table.value_at(ViewRow::new(1), ViewColumn::new(0)).unwrap(),
            v("Cherry")
        );
    }

    #[test]
    fn test_plain_insert_shifts_selection() {
        let model = three_by_three();
        let mut table = TableView::new(model.clone());
        table.set_row_selection_interval(ViewRow::new(2), ViewRow::new(2)).unwrap();

        model.insert_rows(1, vec![vec![v("x0"), v("x1"), v("x2")]]);
        table.table_changed(&TableModelEvent::insert(1, 1));

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.selected_rows(), vec![ViewRow::new(3)]);
    }

    #[test]
    fn test_plain_delete_splices_selection() {
        let model = three_by_three();
        let mut table = TableView::new(model.clone());
        table.set_row_selection_interval(ViewRow::new(1), ViewRow::new(2)).unwrap();

        model.remove_rows(1, 1);
        table.table_changed(&TableModelEvent::delete(1, 1));

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.selected_rows(), vec![ViewRow::new(1)]);
    }

    #[test]
    fn test_update_selection_on_sort_disabled_keeps_view_rows() {
        let (mut table, _sorter) = sorted_table(fruit_model());
        table.set_update_selection_on_sort(false);
        // View row 2 is "Banana" in unsorted order.
        table.set_row_selection_interval(ViewRow::new(2), ViewRow::new(2)).unwrap();

        table.toggle_sort_order(ViewColumn::new(0)).unwrap();

        // The view index stands; it now covers a different logical row.
        assert_eq!(table.selected_rows(), vec![ViewRow::new(2)]);
        assert_eq!(
            table.value_at(ViewRow::new(2), ViewColumn::new(0)).unwrap(),
            v("Cherry")
        );
    }

    #[test]
    fn test_set_value_at_through_view() {
        let model = fruit_model();
        let (mut table, sorter) = sorted_table(model.clone());
        model.set_column_editable(0, true);
        sorter.set_sort_keys(vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]);

        // View row 0 is "Apple", model row 1.
        assert!(table
            .set_value_at(v("Apricot"), ViewRow::new(0), ViewColumn::new(0))
            .unwrap());
        assert_eq!(model.value_at(1, 0), v("Apricot"));
        assert!(table.is_cell_editable(ViewRow::new(0), ViewColumn::new(0)).unwrap());
    }

    #[test]
    fn test_manual_columns_survive_header_change() {
        let model = three_by_three();
        let mut table = TableView::new(model.clone());
        table.set_auto_create_columns(false);
        table
            .column_model_mut()
            .remove_column(ViewColumn::new(2));

        table.table_changed(&TableModelEvent::header_changed());

        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_auto_create_row_sorter() {
        let mut table = TableView::new(fruit_model());
        assert!(table.row_sorter().is_none());
        table.set_auto_create_row_sorter(true);
        assert!(table.row_sorter().is_some());

        table.toggle_sort_order(ViewColumn::new(0)).unwrap();
        assert_eq!(
            table.value_at(ViewRow::new(0), ViewColumn::new(0)).unwrap(),
            v("Apple")
        );

        table.set_auto_create_row_sorter(false);
        assert!(table.row_sorter().is_none());
    }

    #[test]
    fn test_all_rows_changed_resets_state() {
        let model = three_by_three();
        let mut table = TableView::new(model.clone());
        table.set_row_selection_interval(ViewRow::new(0), ViewRow::new(1)).unwrap();
        table.set_row_height(ViewRow::new(0), 40).unwrap();

        table.table_changed(&TableModelEvent::all_data_changed());

        assert!(table.selection_model().is_selection_empty());
        assert_eq!(table.row_height(ViewRow::new(0)), DEFAULT_ROW_HEIGHT);
        assert_eq!(table.take_dirty_region(), DirtyRegion::All);
    }

    #[test]
    fn test_header_change_rebuilds_columns() {
        let model = three_by_three();
        let mut table = TableView::new(model.clone());
        table
            .column_model_mut()
            .move_column(ViewColumn::new(0), ViewColumn::new(2));
        table
            .set_column_selection_interval(ViewColumn::new(0), ViewColumn::new(0))
            .unwrap();

        table.table_changed(&TableModelEvent::header_changed());

        // Columns are back in model order with no selection.
        assert_eq!(
            table
                .convert_column_index_to_model(ViewColumn::new(0))
                .unwrap(),
            ModelColumn::new(0)
        );
        assert!(table
            .column_model()
            .selection_model()
            .is_selection_empty());
    }

    // ------------------------------------------------------------------
    // Row heights and geometry
    // ------------------------------------------------------------------

    #[test]
    fn test_row_height_validation() {
        let mut table = TableView::new(three_by_three());
        assert_eq!(
            table.set_row_height(ViewRow::new(0), 0),
            Err(ViewError::InvalidRowHeight(0))
        );
        assert_eq!(
            table.set_row_height(ViewRow::new(0), -5),
            Err(ViewError::InvalidRowHeight(-5))
        );
        assert!(table.set_row_height(ViewRow::new(0), 32).is_ok());
        assert_eq!(table.row_height(ViewRow::new(0)), 32);
        assert_eq!(table.row_y(ViewRow::new(1)), 32);
    }

    #[test]
    fn test_row_heights_follow_sort() {
        let (mut table, _) = sorted_table(fruit_model());
        // Give "Cherry" (view 0 unsorted) a tall row.
        table.set_row_height(ViewRow::new(0), 48).unwrap();

        table.toggle_sort_order(ViewColumn::new(0)).unwrap();

        // Ascending: Apple, Banana, Cherry. The tall row moved with Cherry.
        assert_eq!(table.row_height(ViewRow::new(2)), 48);
        assert_eq!(table.row_height(ViewRow::new(0)), DEFAULT_ROW_HEIGHT);
    }

    #[test]
    fn test_cell_rect_and_hit_testing() {
        let mut table = TableView::new(three_by_three());
        table.set_row_height(ViewRow::new(0), 20).unwrap();
        table.set_row_height(ViewRow::new(1), 30).unwrap();

        let rect = table
            .cell_rect(ViewRow::new(1), ViewColumn::new(1), true)
            .unwrap();
        assert_eq!(rect.y, 20);
        assert_eq!(rect.height, 30);
        assert_eq!(rect.x, 75);
        assert_eq!(rect.width, 75);

        // Without spacing the margins are inset.
        let inner = table
            .cell_rect(ViewRow::new(1), ViewColumn::new(1), false)
            .unwrap();
        assert_eq!(inner.width, 74);
        assert_eq!(inner.height, 29);

        assert_eq!(table.row_at_y(25), Some(ViewRow::new(1)));
        assert_eq!(table.column_at_x(80), Some(ViewColumn::new(1)));
        assert_eq!(table.row_at_y(1000), None);
        assert_eq!(
            table.cell_at_point(Point::new(80, 25)),
            Some((ViewRow::new(1), ViewColumn::new(1)))
        );
        assert_eq!(table.cell_at_point(Point::new(-1, 25)), None);
    }

    // ------------------------------------------------------------------
    // Column layout
    // ------------------------------------------------------------------

    fn layout_table(widths: &[i32], view_width: i32, mode: AutoResizeMode) -> TableView {
        let model = Arc::new(VecTableModel::new(1, widths.len()));
        let mut table = TableView::new(model).with_auto_resize_mode(mode);
        for (i, &w) in widths.iter().enumerate() {
            if let Some(col) = table.column_model_mut().column_mut(ViewColumn::new(i)) {
                col.set_preferred_width(w);
            }
        }
        table.set_view_width(view_width);
        table
    }

    fn widths(table: &TableView) -> Vec<i32> {
        table.column_model().columns().iter().map(|c| c.width()).collect()
    }

    #[test]
    fn test_layout_conserves_view_width() {
        for mode in [
            AutoResizeMode::NextColumn,
            AutoResizeMode::SubsequentColumns,
            AutoResizeMode::LastColumn,
            AutoResizeMode::AllColumns,
        ] {
            let table = layout_table(&[75, 75, 75], 300, mode);
            assert_eq!(
                table.column_model().total_column_width(),
                300,
                "mode {mode:?}"
            );
        }
    }

    #[test]
    fn test_resize_subsequent_columns() {
        let mut table = layout_table(&[100, 100, 100], 300, AutoResizeMode::SubsequentColumns);
        table.set_resizing_column(Some(ViewColumn::new(0)));
        table
            .column_model_mut()
            .set_column_width(ViewColumn::new(0), 140);
        table.do_layout();

        let w = widths(&table);
        assert_eq!(w[0], 140);
        assert_eq!(w.iter().sum::<i32>(), 300);
        // The 40 pixel delta came out of the following columns evenly.
        assert_eq!(w[1], 80);
        assert_eq!(w[2], 80);
    }

    #[test]
    fn test_resize_next_column_only() {
        let mut table = layout_table(&[100, 100, 100], 300, AutoResizeMode::NextColumn);
        table.set_resizing_column(Some(ViewColumn::new(0)));
        table
            .column_model_mut()
            .set_column_width(ViewColumn::new(0), 130);
        table.do_layout();

        let w = widths(&table);
        assert_eq!(w, vec![130, 70, 100]);
    }

    #[test]
    fn test_resize_last_column_absorbs() {
        let mut table = layout_table(&[100, 100, 100], 300, AutoResizeMode::LastColumn);
        table.set_resizing_column(Some(ViewColumn::new(0)));
        table
            .column_model_mut()
            .set_column_width(ViewColumn::new(0), 130);
        table.do_layout();

        let w = widths(&table);
        assert_eq!(w, vec![130, 100, 70]);
    }

    #[test]
    fn test_unabsorbable_delta_returns_to_resizing_column() {
        // The next column cannot shrink below its minimum, so most of the
        // delta bounces back.
        let model = Arc::new(VecTableModel::new(1, 2));
        let mut table =
            TableView::new(model).with_auto_resize_mode(AutoResizeMode::NextColumn);
        for i in 0..2 {
            if let Some(col) = table.column_model_mut().column_mut(ViewColumn::new(i)) {
                col.set_preferred_width(100);
            }
        }
        table.set_view_width(200);

        table.set_resizing_column(Some(ViewColumn::new(0)));
        table
            .column_model_mut()
            .set_column_width(ViewColumn::new(0), 190);
        table.do_layout();

        let w = widths(&table);
        // Column 1 stopped at its 15 pixel minimum; column 0 gave back the rest.
        assert_eq!(w[1], 15);
        assert_eq!(w.iter().sum::<i32>(), 200);
    }

    #[test]
    fn test_auto_resize_off_uses_preferred_widths() {
        let table = layout_table(&[60, 90, 120], 150, AutoResizeMode::Off);
        assert_eq!(widths(&table), vec![60, 90, 120]);
        assert_eq!(table.column_model().total_column_width(), 270);
    }

    proptest! {
        /// The distribution conserves its (clamped) target exactly and
        /// keeps every size in bounds.
        #[test]
        fn prop_distribute_conserves_target(
            target in 0i64..100_000,
            raw in prop::collection::vec((0i64..2_000, 0i64..2_000), 1..20),
        ) {
            let bounds: Vec<(i64, i64)> = raw
                .into_iter()
                .map(|(a, b)| (a.min(b), a.max(b)))
                .collect();
            let total_lower: i64 = bounds.iter().map(|b| b.0).sum();
            let total_upper: i64 = bounds.iter().map(|b| b.1).sum();
            let clamped = target.clamp(total_lower, total_upper);

            let sizes = distribute(target, &bounds, true);
            let sum: i64 = sizes.iter().map(|&s| i64::from(s)).sum();
            prop_assert_eq!(sum, clamped);
            for (size, (lower, upper)) in sizes.iter().zip(&bounds) {
                prop_assert!(i64::from(*size) >= *lower && i64::from(*size) <= *upper);
            }
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    fn editable_table() -> (TableView, Arc<VecTableModel>) {
        let model = Arc::new(VecTableModel::from_rows(
            vec![vec![v("alpha"), CellValue::Int(1)]],
            2,
        ));
        model.set_column_editable(0, true);
        model.set_column_editable(1, true);
        model.set_column_class(1, crate::model::ColumnClass::Int);
        (TableView::new(model.clone()), model)
    }

    #[test]
    fn test_edit_commit_writes_model() {
        let (mut table, model) = editable_table();
        assert!(table.edit_cell_at(ViewRow::new(0), ViewColumn::new(0)).unwrap());
        assert_eq!(
            table.editing_cell(),
            Some((ViewRow::new(0), ViewColumn::new(0)))
        );

        table.editor_mut().unwrap().set_input("beta");
        assert!(table.stop_editing());
        assert!(!table.is_editing());
        assert_eq!(model.value_at(0, 0), v("beta"));
    }

    #[test]
    fn test_invalid_edit_keeps_session_open() {
        let (mut table, model) = editable_table();
        assert!(table.edit_cell_at(ViewRow::new(0), ViewColumn::new(1)).unwrap());

        table.editor_mut().unwrap().set_input("not a number");
        assert!(!table.stop_editing());
        assert!(table.is_editing());
        assert_eq!(model.value_at(0, 1), CellValue::Int(1));

        table.editor_mut().unwrap().set_input("9");
        assert!(table.stop_editing());
        assert_eq!(model.value_at(0, 1), CellValue::Int(9));
    }

    #[test]
    fn test_cancel_discards_edit() {
        let (mut table, model) = editable_table();
        table.edit_cell_at(ViewRow::new(0), ViewColumn::new(0)).unwrap();
        table.editor_mut().unwrap().set_input("scratch");
        table.cancel_editing();
        assert!(!table.is_editing());
        assert_eq!(model.value_at(0, 0), v("alpha"));
    }

    #[test]
    fn test_non_editable_cell_refuses_editor() {
        let model = three_by_three();
        let mut table = TableView::new(model);
        assert!(!table.edit_cell_at(ViewRow::new(0), ViewColumn::new(0)).unwrap());
        assert!(!table.is_editing());
    }

    fn editable_rows() -> (TableView, Arc<VecTableModel>) {
        let model = Arc::new(VecTableModel::from_rows(
            vec![vec![v("alpha")], vec![v("beta")], vec![v("gamma")]],
            1,
        ));
        model.set_column_editable(0, true);
        (TableView::new(model.clone()), model)
    }

    #[test]
    fn test_edit_survives_insert_below() {
        let (mut table, model) = editable_rows();
        table.edit_cell_at(ViewRow::new(0), ViewColumn::new(0)).unwrap();

        model.insert_rows(2, vec![vec![v("delta")]]);
        table.table_changed(&TableModelEvent::insert(2, 2));

        assert!(table.is_editing());
        assert_eq!(
            table.editing_cell(),
            Some((ViewRow::new(0), ViewColumn::new(0)))
        );
    }

    #[test]
    fn test_edit_row_shifts_on_insert_above() {
        let (mut table, model) = editable_rows();
        table.edit_cell_at(ViewRow::new(1), ViewColumn::new(0)).unwrap();

        model.insert_rows(0, vec![vec![v("head")]]);
        table.table_changed(&TableModelEvent::insert(0, 0));

        assert_eq!(
            table.editing_cell(),
            Some((ViewRow::new(2), ViewColumn::new(0)))
        );
        // A commit after the shift still lands on the same logical row.
        table.editor_mut().unwrap().set_input("edited");
        assert!(table.stop_editing());
        assert_eq!(model.value_at(2, 0), v("edited"));
    }

    #[test]
    fn test_deleting_edited_row_cancels() {
        let (mut table, model) = editable_rows();
        table.edit_cell_at(ViewRow::new(1), ViewColumn::new(0)).unwrap();

        model.remove_rows(1, 1);
        table.table_changed(&TableModelEvent::delete(1, 1));

        assert!(!table.is_editing());
    }

    #[test]
    fn test_edit_shifts_down_on_delete_above() {
        let (mut table, model) = editable_rows();
        table.edit_cell_at(ViewRow::new(2), ViewColumn::new(0)).unwrap();

        model.remove_rows(0, 0);
        table.table_changed(&TableModelEvent::delete(0, 0));

        assert_eq!(
            table.editing_cell(),
            Some((ViewRow::new(1), ViewColumn::new(0)))
        );
    }

    #[test]
    fn test_edit_follows_sort() {
        let model = fruit_model();
        model.set_column_editable(0, true);
        let (mut table, _sorter) = sorted_table(model);
        // Edit "Cherry", view row 0 in unsorted order.
        table.edit_cell_at(ViewRow::new(0), ViewColumn::new(0)).unwrap();

        table.toggle_sort_order(ViewColumn::new(0)).unwrap();

        // Ascending: Apple, Banana, Cherry. The edit moved with its row.
        assert_eq!(
            table.editing_cell(),
            Some((ViewRow::new(2), ViewColumn::new(0)))
        );
    }

    #[test]
    fn test_sorted_delete_of_edited_row_cancels() {
        let model = fruit_model();
        model.set_column_editable(0, true);
        let (mut table, sorter) = sorted_table(model.clone());
        sorter.set_sort_keys(vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]);
        // Edit "Apple": view row 0 sorted, model row 1.
        table.edit_cell_at(ViewRow::new(0), ViewColumn::new(0)).unwrap();

        model.remove_rows(1, 1);
        table.table_changed(&TableModelEvent::delete(1, 1));

        assert!(!table.is_editing());
    }

    // ------------------------------------------------------------------
    // Dirty tracking
    // ------------------------------------------------------------------

    #[test]
    fn test_dirty_region_coalesces_and_clears() {
        let model = Arc::new(VecTableModel::new(10, 1));
        let mut table = TableView::new(model.clone());
        assert_eq!(table.take_dirty_region(), DirtyRegion::All);
        assert_eq!(table.take_dirty_region(), DirtyRegion::None);

        table.table_changed(&TableModelEvent::update(2, 3));
        table.table_changed(&TableModelEvent::update(5, 6));
        assert_eq!(table.dirty_region(), DirtyRegion::Rows { first: 2, last: 6 });

        table.clear_selection();
        assert_eq!(table.take_dirty_region(), DirtyRegion::All);
    }

    // ------------------------------------------------------------------
    // State snapshots
    // ------------------------------------------------------------------

    #[test]
    fn test_snapshot_round_trip_across_views() {
        let model = fruit_model();
        let (mut table, sorter) = sorted_table(model.clone());
        sorter.set_sort_keys(vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]);
        // Select "Cherry" (view 2 ascending, model 0) and give it a tall row.
        table.set_row_selection_interval(ViewRow::new(2), ViewRow::new(2)).unwrap();
        table.set_row_height(ViewRow::new(2), 40).unwrap();

        let json = table.save_state().to_json().unwrap();

        // A brand-new view over the same data picks the state up.
        let sorter2 = Arc::new(TableRowSorter::new(model.clone()));
        let mut restored = TableView::new(model).with_row_sorter(sorter2.clone());
        restored
            .restore_state(&TableViewState::from_json(&json).unwrap())
            .unwrap();

        assert_eq!(
            sorter2.sort_keys(),
            vec![SortKey::new(ModelColumn::new(0), SortOrder::Ascending)]
        );
        assert_eq!(restored.selected_rows(), vec![ViewRow::new(2)]);
        assert_eq!(restored.row_height(ViewRow::new(2)), 40);
        assert_eq!(
            restored
                .value_at(ViewRow::new(2), ViewColumn::new(0))
                .unwrap(),
            v("Cherry")
        );
    }

    #[test]
    fn test_snapshot_keeps_column_order() {
        let mut table = TableView::new(three_by_three());
        table
            .column_model_mut()
            .move_column(ViewColumn::new(0), ViewColumn::new(2));
        table
            .column_model_mut()
            .set_column_width(ViewColumn::new(0), 120);

        let state = table.save_state();
        let mut restored = TableView::new(three_by_three());
        restored.restore_state(&state).unwrap();

        assert_eq!(
            restored
                .convert_column_index_to_model(ViewColumn::new(2))
                .unwrap(),
            ModelColumn::new(0)
        );
        let w = widths(&restored);
        assert_eq!(w[0], 120);
    }

    #[test]
    fn test_restore_rejects_bad_snapshot() {
        let mut table = TableView::new(three_by_three());
        let good = table.save_state();

        let mut bad = good.clone();
        bad.row_heights[1] = 0;
        assert!(matches!(
            table.restore_state(&bad),
            Err(ViewError::InvalidSnapshot(_))
        ));

        let mut bad = good.clone();
        bad.columns[0].model_index = 9;
        assert!(matches!(
            table.restore_state(&bad),
            Err(ViewError::InvalidSnapshot(_))
        ));

        // A failed restore leaves the view untouched.
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_height(ViewRow::new(1)), DEFAULT_ROW_HEIGHT);
    }

    #[test]
    fn test_restore_drops_out_of_range_selection() {
        let model = three_by_three();
        let mut table = TableView::new(model.clone());
        let mut state = table.save_state();
        state.selected_rows = vec![1, 17];

        table.restore_state(&state).unwrap();
        assert_eq!(table.selected_rows(), vec![ViewRow::new(1)]);
    }
}
