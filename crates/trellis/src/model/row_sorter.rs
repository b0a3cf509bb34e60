//! Row sorting and filtering between a table model and its view.
//!
//! A [`RowSorter`] owns the permutation between model row order and view
//! row order. The table view never reads model rows directly when a
//! sorter is installed; every row index crossing the boundary goes
//! through [`convert_row_index_to_model`](RowSorter::convert_row_index_to_model)
//! or its inverse. Filtering is folded into the same mapping: a filtered
//! row simply has no view position.
//!
//! [`TableRowSorter`] is the standard implementation: a stable sort over
//! up to three [`SortKey`]s with optional per-column comparators and an
//! optional row filter.
//!
//! # Signals
//!
//! [`RowSorterSignals::sorter_changed`] fires
//! [`RowSorterEvent::SortOrderChanged`] when the keys change and
//! [`RowSorterEvent::Sorted`] after the mapping is rebuilt. The `Sorted`
//! event carries the previous view-to-model permutation so observers can
//! remap any view-coordinate state they hold.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use trellis_core::Signal;

use super::cell::{CellValue, compare_cell_values};
use super::coords::{ModelColumn, ModelRow, ViewRow};
use super::table_model::TableModel;

/// Maximum number of sort keys kept by [`TableRowSorter`].
pub const MAX_SORT_KEYS: usize = 3;

/// Direction of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// A column and the direction it is sorted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: ModelColumn,
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(column: ModelColumn, order: SortOrder) -> Self {
        Self { column, order }
    }
}

/// Emitted by a sorter when its ordering changes.
#[derive(Debug, Clone)]
pub enum RowSorterEvent {
    /// The sort keys changed; the mapping has not been rebuilt yet.
    SortOrderChanged,
    /// The mapping was rebuilt. `previous_view_to_model` is the
    /// view-to-model permutation that was in effect before.
    Sorted { previous_view_to_model: Vec<ModelRow> },
}

/// Signals emitted by row sorters.
#[derive(Debug, Default)]
pub struct RowSorterSignals {
    pub sorter_changed: Signal<RowSorterEvent>,
}

/// The permutation between model and view row order.
#[derive(Debug, Default)]
struct RowMapping {
    /// `view_to_model[view_row]` is the model row shown there.
    view_to_model: Vec<usize>,
    /// `model_to_view[model_row]` is the view position, `None` when the
    /// row is filtered out.
    model_to_view: Vec<Option<usize>>,
}

/// Row filter: `true` keeps the model row visible.
pub type RowFilterFn = Arc<dyn Fn(&dyn TableModel, usize) -> bool + Send + Sync>;

/// Per-column value comparator used instead of the default ordering.
pub type CellCompareFn = Arc<dyn Fn(&CellValue, &CellValue) -> Ordering + Send + Sync>;

/// Maps view rows to model rows under the current sort and filter.
///
/// Implementations keep their mapping in sync with the model through the
/// `rows_*` notification methods; the owning view calls them as part of
/// its model-change reconciliation.
pub trait RowSorter: Send + Sync {
    /// Number of rows visible in the view.
    fn view_row_count(&self) -> usize;

    /// Number of rows in the model as of the last rebuild.
    fn model_row_count(&self) -> usize;

    /// The model row displayed at `row`, or `None` when out of range.
    fn convert_row_index_to_model(&self, row: ViewRow) -> Option<ModelRow>;

    /// The view position of `row`, or `None` when filtered out or out of
    /// range.
    fn convert_row_index_to_view(&self, row: ModelRow) -> Option<ViewRow>;

    /// Current sort keys, primary first.
    fn sort_keys(&self) -> Vec<SortKey>;

    /// Replaces the sort keys and re-sorts.
    fn set_sort_keys(&self, keys: Vec<SortKey>);

    /// Cycles `column` through the sort-key rotation.
    fn toggle_sort_order(&self, column: ModelColumn);

    /// Model rows `first..=last` were inserted.
    fn rows_inserted(&self, first: usize, last: usize);

    /// Model rows `first..=last` were removed.
    fn rows_deleted(&self, first: usize, last: usize);

    /// Values in model rows `first..=last` changed. `column` narrows the
    /// change to one model column when known.
    fn rows_updated(&self, first: usize, last: usize, column: Option<usize>);

    /// The model changed wholesale.
    fn all_rows_changed(&self);

    /// The model's column structure changed.
    fn model_structure_changed(&self);

    fn signals(&self) -> &RowSorterSignals;
}

/// Standard sorter over a [`TableModel`].
pub struct TableRowSorter {
    model: Arc<dyn TableModel>,
    sort_keys: RwLock<Vec<SortKey>>,
    filter: RwLock<Option<RowFilterFn>>,
    comparators: RwLock<HashMap<usize, CellCompareFn>>,
    mapping: RwLock<RowMapping>,
    signals: RowSorterSignals,
}

impl TableRowSorter {
    /// Creates a sorter with no keys and no filter: an identity mapping
    /// over the model's current rows.
    pub fn new(model: Arc<dyn TableModel>) -> Self {
        let sorter = Self {
            model,
            sort_keys: RwLock::new(Vec::new()),
            filter: RwLock::new(None),
            comparators: RwLock::new(HashMap::new()),
            mapping: RwLock::new(RowMapping::default()),
            signals: RowSorterSignals::default(),
        };
        sorter.rebuild();
        sorter
    }

    /// Installs or clears the row filter and re-sorts.
    pub fn set_filter(&self, filter: Option<RowFilterFn>) {
        *self.filter.write() = filter;
        self.resort();
    }

    /// Overrides the value ordering for `column`.
    pub fn set_comparator(&self, column: ModelColumn, comparator: CellCompareFn) {
        self.comparators.write().insert(column.get(), comparator);
    }

    /// Rebuilds the mapping from the model and announces it.
    pub fn sort(&self) {
        self.resort();
    }

    fn resort(&self) {
        let previous = self.rebuild();
        self.signals.sorter_changed.emit(RowSorterEvent::Sorted {
            previous_view_to_model: previous,
        });
    }

    /// Rebuilds the mapping; returns the previous view-to-model order.
    fn rebuild(&self) -> Vec<ModelRow> {
        let keys = self.sort_keys.read().clone();
        let filter = self.filter.read().clone();
        let model_rows = self.model.row_count();

        let mut mapping = self.mapping.write();
        let previous = mapping.view_to_model.iter().map(|&m| ModelRow::new(m)).collect();

        let mut visible: Vec<usize> = (0..model_rows)
            .filter(|&row| filter.as_ref().is_none_or(|f| f(&*self.model, row)))
            .collect();

        if !keys.is_empty() {
            let comparators = self.comparators.read();
            visible.sort_by(|&a, &b| {
                for key in &keys {
                    let column = key.column.get();
                    let va = self.model.value_at(a, column);
                    let vb = self.model.value_at(b, column);
                    let cmp = match comparators.get(&column) {
                        Some(custom) => custom(&va, &vb),
                        None => compare_cell_values(&va, &vb),
                    };
                    let cmp = match key.order {
                        SortOrder::Ascending => cmp,
                        SortOrder::Descending => cmp.reverse(),
                    };
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                Ordering::Equal
            });
        }

        mapping.model_to_view = vec![None; model_rows];
        for (view_row, &model_row) in visible.iter().enumerate() {
            mapping.model_to_view[model_row] = Some(view_row);
        }
        mapping.view_to_model = visible;

        debug!(
            model_rows,
            view_rows = mapping.view_to_model.len(),
            keys = keys.len(),
            "rebuilt row mapping"
        );
        previous
    }
}

impl RowSorter for TableRowSorter {
    fn view_row_count(&self) -> usize {
        self.mapping.read().view_to_model.len()
    }

    fn model_row_count(&self) -> usize {
        self.mapping.read().model_to_view.len()
    }

    fn convert_row_index_to_model(&self, row: ViewRow) -> Option<ModelRow> {
        self.mapping
            .read()
            .view_to_model
            .get(row.get())
            .map(|&m| ModelRow::new(m))
    }

    fn convert_row_index_to_view(&self, row: ModelRow) -> Option<ViewRow> {
        self.mapping
            .read()
            .model_to_view
            .get(row.get())
            .and_then(|&v| v.map(ViewRow::new))
    }

    fn sort_keys(&self) -> Vec<SortKey> {
        self.sort_keys.read().clone()
    }

    fn set_sort_keys(&self, keys: Vec<SortKey>) {
        {
            let mut current = self.sort_keys.write();
            if *current == keys {
                return;
            }
            *current = keys;
        }
        self.signals
            .sorter_changed
            .emit(RowSorterEvent::SortOrderChanged);
        self.resort();
    }

    fn toggle_sort_order(&self, column: ModelColumn) {
        let mut keys = self.sort_keys.read().clone();
        let order = match keys.iter().position(|k| k.column == column) {
            Some(pos) => {
                let existing = keys.remove(pos);
                if pos == 0 {
                    existing.order.reversed()
                } else {
                    SortOrder::Ascending
                }
            }
            None => SortOrder::Ascending,
        };
        keys.insert(0, SortKey::new(column, order));
        keys.truncate(MAX_SORT_KEYS);
        self.set_sort_keys(keys);
    }

    fn rows_inserted(&self, first: usize, last: usize) {
        debug!(first, last, "model rows inserted");
        self.resort();
    }

    fn rows_deleted(&self, first: usize, last: usize) {
        debug!(first, last, "model rows deleted");
        self.resort();
    }

    fn rows_updated(&self, first: usize, last: usize, column: Option<usize>) {
        debug!(first, last, ?column, "model rows updated");
        // A change confined to a column that neither sorts nor filters
        // cannot move any row.
        if let Some(column) = column
            && self.filter.read().is_none()
            && !self.sort_keys.read().iter().any(|k| k.column.get() == column)
        {
            return;
        }
        self.resort();
    }

    fn all_rows_changed(&self) {
        self.resort();
    }

    fn model_structure_changed(&self) {
        self.resort();
    }

    fn signals(&self) -> &RowSorterSignals {
        &self.signals
    }
}
