//! Table columns and the column model.
//!
//! A [`TableColumn`] describes one displayed column: its width bounds,
//! header, and optional renderer/editor overrides. Its identity is the
//! `model_index` it was created with; reordering columns in the view
//! never changes it. The [`TableColumnModel`] owns the display order,
//! the inter-column margin, and the column-axis selection.
//!
//! # Signals
//!
//! The column model announces structural changes through
//! [`ColumnModelSignals`]; width changes are announced per column via
//! [`TableColumnModel::set_column_width`] emitting `column_resized`.

use std::sync::Arc;

use trellis_core::Signal;

use super::editor::{CellEditor, CellRenderer};
use crate::model::{CellValue, ColumnClass, ListSelectionModel, ModelColumn, ViewColumn};

/// Default column width in pixels.
pub const DEFAULT_COLUMN_WIDTH: i32 = 75;
/// Default minimum column width in pixels.
pub const DEFAULT_MIN_COLUMN_WIDTH: i32 = 15;

/// Builds a fresh editor for a cell value.
pub type EditorFactory =
    Arc<dyn Fn(&CellValue, ColumnClass) -> Box<dyn CellEditor> + Send + Sync>;

/// One displayed column.
///
/// `width` is the current layout width; `preferred_width` is what the
/// auto-resize distribution aims for. Both stay clamped to
/// `[min_width, max_width]`.
pub struct TableColumn {
    model_index: ModelColumn,
    width: i32,
    preferred_width: i32,
    min_width: i32,
    max_width: i32,
    resizable: bool,
    header_value: Option<String>,
    identifier: Option<String>,
    renderer: Option<Arc<dyn CellRenderer>>,
    editor_factory: Option<EditorFactory>,
}

impl TableColumn {
    /// A column displaying model column `model_index` at default widths.
    pub fn new(model_index: ModelColumn) -> Self {
        Self {
            model_index,
            width: DEFAULT_COLUMN_WIDTH,
            preferred_width: DEFAULT_COLUMN_WIDTH,
            min_width: DEFAULT_MIN_COLUMN_WIDTH,
            max_width: i32::MAX,
            resizable: true,
            header_value: None,
            identifier: None,
            renderer: None,
            editor_factory: None,
        }
    }

    /// Sets the preferred width (builder style).
    pub fn with_preferred_width(mut self, width: i32) -> Self {
        self.set_preferred_width(width);
        self.width = self.preferred_width;
        self
    }

    /// Sets the width bounds (builder style).
    pub fn with_width_bounds(mut self, min: i32, max: i32) -> Self {
        self.min_width = min.max(0);
        self.max_width = max.max(self.min_width);
        self.set_width(self.width);
        self.set_preferred_width(self.preferred_width);
        self
    }

    /// Sets the header text (builder style).
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header_value = Some(header.into());
        self
    }

    /// Sets the identifier (builder style).
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Marks the column fixed-width (builder style).
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Sets a renderer override (builder style).
    pub fn with_renderer(mut self, renderer: Arc<dyn CellRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Sets an editor factory override (builder style).
    pub fn with_editor_factory(mut self, factory: EditorFactory) -> Self {
        self.editor_factory = Some(factory);
        self
    }

    /// The model column this column displays. Never changes.
    pub fn model_index(&self) -> ModelColumn {
        self.model_index
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Sets the layout width, clamped to the width bounds.
    pub fn set_width(&mut self, width: i32) {
        self.width = width.clamp(self.min_width, self.max_width);
    }

    pub fn preferred_width(&self) -> i32 {
        self.preferred_width
    }

    /// Sets the preferred width, clamped to the width bounds.
    pub fn set_preferred_width(&mut self, width: i32) {
        self.preferred_width = width.clamp(self.min_width, self.max_width);
    }

    pub fn min_width(&self) -> i32 {
        self.min_width
    }

    /// Raises the lower width bound, pushing current widths up if needed.
    pub fn set_min_width(&mut self, min: i32) {
        self.min_width = min.max(0).min(self.max_width);
        self.width = self.width.max(self.min_width);
        self.preferred_width = self.preferred_width.max(self.min_width);
    }

    pub fn max_width(&self) -> i32 {
        self.max_width
    }

    /// Lowers the upper width bound, pulling current widths down if needed.
    pub fn set_max_width(&mut self, max: i32) {
        self.max_width = max.max(self.min_width);
        self.width = self.width.min(self.max_width);
        self.preferred_width = self.preferred_width.min(self.max_width);
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.resizable = resizable;
    }

    pub fn header_value(&self) -> Option<&str> {
        self.header_value.as_deref()
    }

    pub fn set_header_value(&mut self, header: Option<String>) {
        self.header_value = header;
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn renderer(&self) -> Option<&Arc<dyn CellRenderer>> {
        self.renderer.as_ref()
    }

    pub fn editor_factory(&self) -> Option<&EditorFactory> {
        self.editor_factory.as_ref()
    }
}

impl std::fmt::Debug for TableColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableColumn")
            .field("model_index", &self.model_index)
            .field("width", &self.width)
            .field("preferred_width", &self.preferred_width)
            .field("resizable", &self.resizable)
            .finish()
    }
}

/// Signals emitted by [`TableColumnModel`].
#[derive(Debug, Default)]
pub struct ColumnModelSignals {
    /// A column was appended; carries its view index.
    pub column_added: Signal<usize>,
    /// A column was removed; carries its old view index.
    pub column_removed: Signal<usize>,
    /// A column moved; carries `(from, to)` view indices.
    pub column_moved: Signal<(usize, usize)>,
    /// A column's layout width changed; carries its view index.
    pub column_resized: Signal<usize>,
    /// The inter-column margin changed.
    pub margin_changed: Signal<i32>,
}

/// Display order, widths, and column-axis selection.
///
/// All indices taken and returned here are view positions; a column's
/// model identity is reached through [`TableColumn::model_index`].
pub struct TableColumnModel {
    columns: Vec<TableColumn>,
    selection: ListSelectionModel,
    column_margin: i32,
    column_selection_allowed: bool,
    pub signals: ColumnModelSignals,
}

impl Default for TableColumnModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TableColumnModel {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            selection: ListSelectionModel::new(),
            column_margin: 1,
            column_selection_allowed: false,
            signals: ColumnModelSignals::default(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: ViewColumn) -> Option<&TableColumn> {
        self.columns.get(index.get())
    }

    pub fn column_mut(&mut self, index: ViewColumn) -> Option<&mut TableColumn> {
        self.columns.get_mut(index.get())
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Appends a column.
    pub fn add_column(&mut self, column: TableColumn) {
        self.columns.push(column);
        self.signals.column_added.emit(self.columns.len() - 1);
    }

    /// Removes the column at view position `index`, splicing the column
    /// selection. Out-of-range indices are ignored.
    pub fn remove_column(&mut self, index: ViewColumn) {
        let index = index.get();
        if index >= self.columns.len() {
            return;
        }
        self.columns.remove(index);
        self.selection.remove_index_interval(index, index);
        self.signals.column_removed.emit(index);
    }

    /// Moves the column at `from` to position `to`, carrying its
    /// selected state with it.
    pub fn move_column(&mut self, from: ViewColumn, to: ViewColumn) {
        let (from, to) = (from.get(), to.get());
        if from >= self.columns.len() || to >= self.columns.len() {
            return;
        }
        if from == to {
            self.signals.column_moved.emit((from, to));
            return;
        }
        let column = self.columns.remove(from);
        let selected = self.selection.is_selected_index(from);
        self.selection.remove_index_interval(from, from);
        self.columns.insert(to, column);
        self.selection.insert_index_interval(to, 1, true);
        if selected {
            self.selection.add_selection_interval(to, to);
        }
        self.signals.column_moved.emit((from, to));
    }

    /// Sets the layout width of the column at `index`, clamped to its
    /// bounds, and announces the resize.
    pub fn set_column_width(&mut self, index: ViewColumn, width: i32) {
        if let Some(column) = self.columns.get_mut(index.get()) {
            let before = column.width();
            column.set_width(width);
            if column.width() != before {
                self.signals.column_resized.emit(index.get());
            }
        }
    }

    /// The view position currently displaying model column `model_index`.
    pub fn view_index_of(&self, model_index: ModelColumn) -> Option<ViewColumn> {
        self.columns
            .iter()
            .position(|c| c.model_index() == model_index)
            .map(ViewColumn::new)
    }

    /// The view position of the column whose identifier (or, failing
    /// that, header) equals `identifier`.
    pub fn column_index(&self, identifier: &str) -> Option<ViewColumn> {
        self.columns
            .iter()
            .position(|c| {
                c.identifier()
                    .or(c.header_value())
                    .is_some_and(|id| id == identifier)
            })
            .map(ViewColumn::new)
    }

    /// Sum of all column widths. Margins paint inside column widths, so
    /// this is the full table width.
    pub fn total_column_width(&self) -> i32 {
        self.columns.iter().map(|c| c.width()).sum()
    }

    /// The column covering pixel `x`, or `None` past the last column.
    pub fn column_at_x(&self, x: i32) -> Option<ViewColumn> {
        if x < 0 {
            return None;
        }
        let mut edge = 0;
        for (index, column) in self.columns.iter().enumerate() {
            edge += column.width();
            if x < edge {
                return Some(ViewColumn::new(index));
            }
        }
        None
    }

    /// The x offset of the column at `index`.
    pub fn column_x(&self, index: ViewColumn) -> i32 {
        self.columns
            .iter()
            .take(index.get())
            .map(|c| c.width())
            .sum()
    }

    pub fn column_margin(&self) -> i32 {
        self.column_margin
    }

    pub fn set_column_margin(&mut self, margin: i32) {
        if self.column_margin != margin {
            self.column_margin = margin;
            self.signals.margin_changed.emit(margin);
        }
    }

    pub fn column_selection_allowed(&self) -> bool {
        self.column_selection_allowed
    }

    pub fn set_column_selection_allowed(&mut self, allowed: bool) {
        self.column_selection_allowed = allowed;
    }

    pub fn selection_model(&self) -> &ListSelectionModel {
        &self.selection
    }

    pub fn selection_model_mut(&mut self) -> &mut ListSelectionModel {
        &mut self.selection
    }
}

impl std::fmt::Debug for TableColumnModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableColumnModel")
            .field("columns", &self.columns)
            .field("column_margin", &self.column_margin)
            .field("column_selection_allowed", &self.column_selection_allowed)
            .finish()
    }
}
