//! One-dimensional selection model.
//!
//! A [`ListSelectionModel`] tracks a set of selected indices along a
//! single axis. A table uses two of them, one for rows (in view
//! coordinates) and one for columns, and derives cell selection from
//! their combination.
//!
//! Alongside the selected set the model keeps an *anchor* and a *lead*:
//! the endpoints of the most recent interval operation. Extending
//! gestures (shift-click) grow the selection from the anchor; the lead is
//! the cell the user acted on last. Anchor and lead are either both
//! present or both absent.
//!
//! # Example
//!
//! ```
//! use trellis::model::{ListSelectionModel, SelectionMode};
//!
//! let mut selection = ListSelectionModel::new();
//! selection.set_selection_interval(2, 5);
//! assert!(selection.is_selected_index(4));
//! assert_eq!(selection.anchor_index(), Some(2));
//! assert_eq!(selection.lead_index(), Some(5));
//! ```
//!
//! # Signals
//!
//! [`selection_changed`](ListSelectionModel::selection_changed) carries a
//! [`SelectionEvent`] spanning every index whose membership changed.
//! While [`value_is_adjusting`](ListSelectionModel::value_is_adjusting)
//! is set, each event is flagged as adjusting, and turning adjusting off
//! fires one final event covering everything touched during the gesture.

use std::collections::BTreeSet;

use trellis_core::Signal;

/// How many disjoint runs of indices a selection may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// At most one index.
    Single,
    /// At most one contiguous interval.
    SingleInterval,
    /// Any set of indices (default).
    #[default]
    MultipleIntervals,
}

/// Emitted when selection membership changes.
///
/// `first..=last` bounds the indices whose selected state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEvent {
    pub first: usize,
    pub last: usize,
    /// `true` while the change is part of an in-progress gesture.
    pub is_adjusting: bool,
}

/// Selection state along one axis.
///
/// Indices are positions in whatever space the owner chose; the model
/// itself has no notion of a maximum index. Bounds are the caller's
/// responsibility.
#[derive(Debug, Default)]
pub struct ListSelectionModel {
    selection: BTreeSet<usize>,
    mode: SelectionMode,
    anchor: Option<usize>,
    lead: Option<usize>,
    value_is_adjusting: bool,
    /// Accumulated dirty span while adjusting.
    adjusting_dirty: Option<(usize, usize)>,
    /// Emitted after every membership change.
    pub selection_changed: Signal<SelectionEvent>,
}

impl ListSelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn selection_mode(&self) -> SelectionMode {
        self.mode
    }

    /// Changes the selection mode. Clears the selection when switching to
    /// a more restrictive mode that the current selection violates.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        let violates = match mode {
            SelectionMode::Single => self.selection.len() > 1,
            SelectionMode::SingleInterval => !self.is_contiguous(),
            SelectionMode::MultipleIntervals => false,
        };
        if violates {
            self.clear_selection();
        }
    }

    pub fn is_selected_index(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    pub fn is_selection_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// The smallest selected index.
    pub fn min_selection_index(&self) -> Option<usize> {
        self.selection.first().copied()
    }

    /// The largest selected index.
    pub fn max_selection_index(&self) -> Option<usize> {
        self.selection.last().copied()
    }

    /// All selected indices in ascending order.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selection.iter().copied().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn anchor_index(&self) -> Option<usize> {
        self.anchor
    }

    pub fn lead_index(&self) -> Option<usize> {
        self.lead
    }

    /// Moves the anchor and lead without changing membership.
    ///
    /// Passing `None` clears both.
    pub fn set_anchor_and_lead(&mut self, anchor: Option<usize>, lead: Option<usize>) {
        match (anchor, lead) {
            (Some(a), Some(l)) => {
                self.anchor = Some(a);
                self.lead = Some(l);
            }
            _ => {
                self.anchor = None;
                self.lead = None;
            }
        }
    }

    pub fn value_is_adjusting(&self) -> bool {
        self.value_is_adjusting
    }

    /// Marks the start or end of a multi-step gesture.
    ///
    /// Turning adjusting off fires one non-adjusting event spanning every
    /// index touched while it was on.
    pub fn set_value_is_adjusting(&mut self, adjusting: bool) {
        if self.value_is_adjusting == adjusting {
            return;
        }
        self.value_is_adjusting = adjusting;
        if !adjusting && let Some((first, last)) = self.adjusting_dirty.take() {
            self.selection_changed.emit(SelectionEvent {
                first,
                last,
                is_adjusting: false,
            });
        }
    }

    // ========================================================================
    // Interval operations
    // ========================================================================

    /// Replaces the selection with the interval between `anchor` and
    /// `lead` (inclusive, in either order).
    ///
    /// In [`SelectionMode::Single`] only `lead` is selected.
    pub fn set_selection_interval(&mut self, anchor: usize, lead: usize) {
        let (anchor, lead) = self.effective_interval(anchor, lead);
        let lo = anchor.min(lead);
        let hi = anchor.max(lead);
        let new: BTreeSet<usize> = (lo..=hi).collect();
        self.apply(new, Some(anchor), Some(lead));
    }

    /// Adds the interval between `anchor` and `lead` to the selection.
    ///
    /// In [`SelectionMode::Single`] this behaves like
    /// [`set_selection_interval`](Self::set_selection_interval). In
    /// [`SelectionMode::SingleInterval`] an interval that neither
    /// overlaps nor touches the current run replaces it instead.
    pub fn add_selection_interval(&mut self, anchor: usize, lead: usize) {
        if self.mode == SelectionMode::Single {
            self.set_selection_interval(anchor, lead);
            return;
        }
        let lo = anchor.min(lead);
        let hi = anchor.max(lead);
        if self.mode == SelectionMode::SingleInterval {
            let touches = match (self.min_selection_index(), self.max_selection_index()) {
                (Some(min), Some(max)) => lo <= max + 1 && min <= hi + 1,
                _ => true,
            };
            if !touches {
                self.set_selection_interval(anchor, lead);
                return;
            }
        }
        let mut new = self.selection.clone();
        new.extend(lo..=hi);
        self.apply(new, Some(anchor), Some(lead));
    }

    /// Deselects the interval between `anchor` and `lead`.
    ///
    /// In [`SelectionMode::SingleInterval`] a removal that would split
    /// the run in two extends to the end of the run instead.
    pub fn remove_selection_interval(&mut self, anchor: usize, lead: usize) {
        let lo = anchor.min(lead);
        let mut hi = anchor.max(lead);
        if self.mode != SelectionMode::MultipleIntervals
            && let (Some(min), Some(max)) = (self.min_selection_index(), self.max_selection_index())
            && min < lo
            && hi < max
        {
            hi = max;
        }
        let mut new = self.selection.clone();
        for index in lo..=hi {
            new.remove(&index);
        }
        self.apply(new, Some(anchor), Some(lead));
    }

    /// Deselects everything. Anchor and lead are kept.
    pub fn clear_selection(&mut self) {
        self.apply(BTreeSet::new(), self.anchor, self.lead);
    }

    // ========================================================================
    // Structural splices
    // ========================================================================

    /// Splices `length` new indices into the selection space at `index`.
    ///
    /// Indices at or after the insertion point shift up by `length`. When
    /// `before` is `false` the insertion point is `index + 1`. The new
    /// indices start out selected if the index at the insertion point was
    /// selected, except in [`SelectionMode::Single`] where they never do.
    pub fn insert_index_interval(&mut self, index: usize, length: usize, before: bool) {
        if length == 0 {
            return;
        }
        let ins_min = if before { index } else { index + 1 };
        let should_select =
            self.mode != SelectionMode::Single && self.selection.contains(&index);

        let mut new = BTreeSet::new();
        for &s in &self.selection {
            new.insert(if s >= ins_min { s + length } else { s });
        }
        if should_select {
            new.extend(ins_min..ins_min + length);
        }

        let shift = |v: usize| if v >= ins_min { v + length } else { v };
        let anchor = self.anchor.map(shift);
        let lead = self.lead.map(shift);
        self.apply(new, anchor, lead);
    }

    /// Splices the indices `first..=last` out of the selection space.
    ///
    /// Selected indices inside the range are dropped; indices after it
    /// shift down. An anchor or lead inside the range moves to the index
    /// before it, or clears when the range starts at zero.
    pub fn remove_index_interval(&mut self, first: usize, last: usize) {
        if last < first {
            return;
        }
        let count = last - first + 1;
        let mut new = BTreeSet::new();
        for &s in &self.selection {
            if s < first {
                new.insert(s);
            } else if s > last {
                new.insert(s - count);
            }
        }

        let shift = |v: usize| -> Option<usize> {
            if v > last {
                Some(v - count)
            } else if v >= first {
                first.checked_sub(1)
            } else {
                Some(v)
            }
        };
        let anchor = self.anchor.and_then(shift);
        let lead = self.lead.and_then(shift);
        // Anchor and lead travel as a pair.
        let (anchor, lead) = match (anchor, lead) {
            (Some(a), Some(l)) => (Some(a), Some(l)),
            _ => (None, None),
        };
        self.apply_with_markers(new, anchor, lead);
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn effective_interval(&self, anchor: usize, lead: usize) -> (usize, usize) {
        if self.mode == SelectionMode::Single {
            (lead, lead)
        } else {
            (anchor, lead)
        }
    }

    fn is_contiguous(&self) -> bool {
        match (self.min_selection_index(), self.max_selection_index()) {
            (Some(min), Some(max)) => max - min + 1 == self.selection.len(),
            _ => true,
        }
    }

    fn apply(&mut self, new: BTreeSet<usize>, anchor: Option<usize>, lead: Option<usize>) {
        let (anchor, lead) = match (anchor, lead) {
            (Some(a), Some(l)) => (Some(a), Some(l)),
            _ => (None, None),
        };
        self.apply_with_markers(new, anchor, lead);
    }

    fn apply_with_markers(
        &mut self,
        new: BTreeSet<usize>,
        anchor: Option<usize>,
        lead: Option<usize>,
    ) {
        let dirty = {
            let mut changed = self
                .selection
                .symmetric_difference(&new)
                .copied()
                .peekable();
            let first = changed.peek().copied();
            first.map(|f| (f, changed.last().unwrap_or(f)))
        };
        self.selection = new;
        self.anchor = anchor;
        self.lead = lead;
        if let Some((first, last)) = dirty {
            self.fire(first, last);
        }
    }

    fn fire(&mut self, first: usize, last: usize) {
        if self.value_is_adjusting {
            self.adjusting_dirty = Some(match self.adjusting_dirty {
                Some((lo, hi)) => (lo.min(first), hi.max(last)),
                None => (first, last),
            });
        }
        self.selection_changed.emit(SelectionEvent {
            first,
            last,
            is_adjusting: self.value_is_adjusting,
        });
    }
}
