//! Combo box coordination.
//!
//! A [`ComboBox`] pairs a [`ComboBoxModel`] (which owns both the item
//! list and the selected item) with the event discipline around changing
//! that selection. The box keeps a *reminder* of the item it last knew
//! to be selected; after any selection write it compares the reminder
//! against the model and synthesizes the deselect/select item events the
//! model itself did not announce. Action events fire once per completed
//! selection gesture, including reselecting the current item, and a
//! re-entry flag keeps action listeners that change the selection from
//! cascading.
//!
//! # Signals
//!
//! - [`action`](ComboBox::action): a selection gesture completed
//! - [`item_changed`](ComboBox::item_changed): an item was deselected or
//!   selected; a selection change fires `Deselected(old)` then
//!   `Selected(new)`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::model::CellValue;
//! use trellis::widget::{ComboBox, DefaultComboBoxModel};
//!
//! let model = Arc::new(DefaultComboBoxModel::new(vec![
//!     CellValue::from("small"),
//!     CellValue::from("large"),
//! ]));
//! let mut combo = ComboBox::new(model);
//! assert_eq!(combo.selected_item(), CellValue::from("small"));
//!
//! assert!(combo.set_selected_item(CellValue::from("large")));
//! assert_eq!(combo.selected_index(), Some(1));
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;
use trellis_core::{ReentryFlag, Signal};

use crate::error::ViewError;
use crate::model::CellValue;

/// Change notification for combo box list models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    /// Items or the selected item changed in place.
    ContentsChanged,
    /// Items `first..=last` were inserted.
    IntervalAdded { first: usize, last: usize },
    /// Items `first..=last` were removed.
    IntervalRemoved { first: usize, last: usize },
}

/// Signals emitted by combo box models.
#[derive(Debug, Default)]
pub struct ComboModelSignals {
    pub list_changed: Signal<ListEvent>,
}

/// Item list plus selected item.
///
/// Unlike the table model, the selected item lives in the model: every
/// view of the model shares one selection. The selected item does not
/// have to be one of the items.
pub trait ComboBoxModel: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`, or `None` out of range.
    fn item_at(&self, index: usize) -> Option<CellValue>;

    /// The selected item; [`CellValue::None`] when nothing is selected.
    fn selected_item(&self) -> CellValue;

    /// Stores the selected item and announces the change.
    fn set_selected_item(&self, item: CellValue);

    fn signals(&self) -> &ComboModelSignals;
}

/// In-memory combo box model.
///
/// Creating the model with items selects the first one. Removing the
/// selected item moves the selection to the previous item, or to the new
/// first item when the head was removed.
pub struct DefaultComboBoxModel {
    items: RwLock<Vec<CellValue>>,
    selected: RwLock<CellValue>,
    signals: ComboModelSignals,
}

impl DefaultComboBoxModel {
    pub fn new(items: Vec<CellValue>) -> Self {
        let selected = items.first().cloned().unwrap_or(CellValue::None);
        Self {
            items: RwLock::new(items),
            selected: RwLock::new(selected),
            signals: ComboModelSignals::default(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// The position of `item` in the list, by equality.
    pub fn index_of(&self, item: &CellValue) -> Option<usize> {
        self.items.read().iter().position(|i| i == item)
    }

    /// Appends an item. The first item added to an empty, unselected
    /// model becomes selected.
    pub fn add_item(&self, item: CellValue) {
        let index = {
            let mut items = self.items.write();
            items.push(item.clone());
            items.len() - 1
        };
        self.signals.list_changed.emit(ListEvent::IntervalAdded {
            first: index,
            last: index,
        });
        if index == 0 && self.selected.read().is_none() {
            self.set_selected_item(item);
        }
    }

    /// Inserts an item before `index`. Does not move the selection.
    pub fn insert_item_at(&self, index: usize, item: CellValue) {
        let index = {
            let mut items = self.items.write();
            let index = index.min(items.len());
            items.insert(index, item);
            index
        };
        self.signals.list_changed.emit(ListEvent::IntervalAdded {
            first: index,
            last: index,
        });
    }

    /// Removes the item at `index`. If it was selected, the previous
    /// item (or the new head) becomes selected first.
    pub fn remove_item_at(&self, index: usize) {
        let reselect = {
            let items = self.items.read();
            if index >= items.len() {
                return;
            }
            if *self.selected.read() == items[index] {
                if index == 0 {
                    Some(items.get(1).cloned().unwrap_or(CellValue::None))
                } else {
                    Some(items[index - 1].clone())
                }
            } else {
                None
            }
        };
        if let Some(next) = reselect {
            self.set_selected_item(next);
        }
        self.items.write().remove(index);
        self.signals.list_changed.emit(ListEvent::IntervalRemoved {
            first: index,
            last: index,
        });
    }

    /// Removes the first item equal to `item`.
    pub fn remove_item(&self, item: &CellValue) {
        if let Some(index) = self.index_of(item) {
            self.remove_item_at(index);
        }
    }
}

impl ComboBoxModel for DefaultComboBoxModel {
    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn item_at(&self, index: usize) -> Option<CellValue> {
        self.items.read().get(index).cloned()
    }

    fn selected_item(&self) -> CellValue {
        self.selected.read().clone()
    }

    fn set_selected_item(&self, item: CellValue) {
        {
            let mut selected = self.selected.write();
            if *selected == item {
                return;
            }
            *selected = item;
        }
        self.signals.list_changed.emit(ListEvent::ContentsChanged);
    }

    fn signals(&self) -> &ComboModelSignals {
        &self.signals
    }
}

/// Item-level selection change.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    Deselected(CellValue),
    Selected(CellValue),
}

/// The combo box coordinator.
///
/// A non-editable box only accepts selections drawn from its item list;
/// an editable one accepts any value.
pub struct ComboBox {
    model: Arc<dyn ComboBoxModel>,
    editable: bool,
    /// Last selected item this box has announced.
    selected_item_reminder: CellValue,
    selecting_item: ReentryFlag,
    firing_action_event: ReentryFlag,
    /// Emitted once per completed selection gesture.
    pub action: Signal<()>,
    /// Emitted for each item deselected or selected.
    pub item_changed: Signal<ItemEvent>,
}

impl ComboBox {
    pub fn new(model: Arc<dyn ComboBoxModel>) -> Self {
        let selected_item_reminder = model.selected_item();
        Self {
            model,
            editable: false,
            selected_item_reminder,
            selecting_item: ReentryFlag::new(),
            firing_action_event: ReentryFlag::new(),
            action: Signal::new(),
            item_changed: Signal::new(),
        }
    }

    /// Allows selections outside the item list (builder style).
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn model(&self) -> &Arc<dyn ComboBoxModel> {
        &self.model
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// The item this box believes is selected.
    pub fn selected_item(&self) -> CellValue {
        self.model.selected_item()
    }

    /// The list position of the selected item, by equality.
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.model.selected_item();
        if selected.is_none() {
            return None;
        }
        (0..self.model.len()).find(|&i| self.model.item_at(i) == Some(selected.clone()))
    }

    /// Selects `item`.
    ///
    /// On a non-editable box an item not present in the list is rejected:
    /// nothing changes and no event fires. Returns `false` only for that
    /// rejection; reselecting the current item is accepted and still
    /// fires one action event.
    pub fn set_selected_item(&mut self, item: CellValue) -> bool {
        if self.selected_item_reminder.is_none() || self.selected_item_reminder != item {
            // Non-editable boxes only select items from the list.
            if !item.is_none() && !self.editable {
                let found = (0..self.model.len())
                    .any(|i| self.model.item_at(i).as_ref() == Some(&item));
                if !found {
                    trace!(?item, "rejected selection of absent item");
                    return false;
                }
            }
            {
                let _selecting = self.selecting_item.enter();
                self.model.set_selected_item(item);
            }
            if self.selected_item_reminder != self.model.selected_item() {
                self.selected_item_changed();
            }
        }
        self.fire_action_event();
        true
    }

    /// Selects the item at `index`.
    pub fn set_selected_index(&mut self, index: usize) -> Result<(), ViewError> {
        let Some(item) = self.model.item_at(index) else {
            return Err(ViewError::ItemOutOfBounds {
                index,
                len: self.model.len(),
            });
        };
        self.set_selected_item(item);
        Ok(())
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.set_selected_item(CellValue::None);
    }

    /// Keyboard selection: selects the next item (searching forward from
    /// the current selection, wrapping) whose display text starts with
    /// `key`, case-insensitively. Returns `false` when no item matches.
    pub fn select_with_key_char(&mut self, key: char) -> bool {
        let len = self.model.len();
        let current = self.selected_index();
        let key: Vec<char> = key.to_lowercase().collect();

        let starts_with_key = |index: usize| -> bool {
            let Some(item) = self.model.item_at(index) else {
                return false;
            };
            let text = item.to_string();
            let prefix: Vec<char> = text.chars().take(key.len()).flat_map(|c| c.to_lowercase()).collect();
            !text.is_empty() && prefix == key
        };

        let start = current.map_or(0, |c| c + 1);
        let found = (start..len)
            .find(|&i| starts_with_key(i))
            .or_else(|| (0..current.unwrap_or(0)).find(|&i| starts_with_key(i)));

        match found {
            Some(index) => {
                // Index came from the model, so this cannot be out of range.
                self.set_selected_index(index).is_ok()
            }
            None => false,
        }
    }

    /// Reconciles against a model change notification.
    ///
    /// The embedder calls this with events from the model's
    /// [`list_changed`](ComboModelSignals::list_changed) signal. If the
    /// model's selected item drifted from this box's reminder, the item
    /// events fire here; for in-place changes and removals an action
    /// event follows, unless the change came from this box's own
    /// selection write.
    pub fn list_data_changed(&mut self, event: &ListEvent) {
        match event {
            ListEvent::ContentsChanged | ListEvent::IntervalRemoved { .. } => {
                if self.selected_item_reminder.is_none()
                    || self.selected_item_reminder != self.model.selected_item()
                {
                    self.selected_item_changed();
                    if !self.selecting_item.is_entered() {
                        self.fire_action_event();
                    }
                }
            }
            ListEvent::IntervalAdded { .. } => {
                if self.selected_item_reminder != self.model.selected_item() {
                    self.selected_item_changed();
                }
            }
        }
    }

    /// Fires the action signal, suppressing re-entrant fires from action
    /// listeners that change the selection.
    pub fn fire_action_event(&self) {
        let Some(_firing) = self.firing_action_event.enter() else {
            return;
        };
        self.action.emit(());
    }

    /// Brings the reminder up to date with the model, firing
    /// `Deselected(old)` then `Selected(new)`.
    fn selected_item_changed(&mut self) {
        if !self.selected_item_reminder.is_none() {
            self.item_changed
                .emit(ItemEvent::Deselected(self.selected_item_reminder.clone()));
        }
        self.selected_item_reminder = self.model.selected_item();
        if !self.selected_item_reminder.is_none() {
            self.item_changed
                .emit(ItemEvent::Selected(self.selected_item_reminder.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fruit_combo() -> ComboBox {
        ComboBox::new(Arc::new(DefaultComboBoxModel::new(vec![
            CellValue::from("Apple"),
            CellValue::from("Banana"),
            CellValue::from("Avocado"),
            CellValue::from("Cherry"),
        ])))
    }

    fn counted(combo: &ComboBox) -> (Arc<AtomicUsize>, Arc<Mutex<Vec<ItemEvent>>>) {
        let actions = Arc::new(AtomicUsize::new(0));
        let a = actions.clone();
        combo.action.connect(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });

        let items = Arc::new(Mutex::new(Vec::new()));
        let i = items.clone();
        combo.item_changed.connect(move |event| {
            i.lock().push(event.clone());
        });
        (actions, items)
    }

    #[test]
    fn test_first_item_selected_on_construction() {
        let combo = fruit_combo();
        assert_eq!(combo.selected_item(), CellValue::from("Apple"));
        assert_eq!(combo.selected_index(), Some(0));
    }

    #[test]
    fn test_selection_fires_deselect_select_then_action() {
        let mut combo = fruit_combo();
        let (actions, items) = counted(&combo);

        assert!(combo.set_selected_item(CellValue::from("Banana")));

        assert_eq!(actions.load(Ordering::SeqCst), 1);
        assert_eq!(
            *items.lock(),
            vec![
                ItemEvent::Deselected(CellValue::from("Apple")),
                ItemEvent::Selected(CellValue::from("Banana")),
            ]
        );
    }

    #[test]
    fn test_reselect_fires_action_only() {
        let mut combo = fruit_combo();
        let (actions, items) = counted(&combo);

        assert!(combo.set_selected_item(CellValue::from("Apple")));

        assert_eq!(actions.load(Ordering::SeqCst), 1);
        assert!(items.lock().is_empty());
    }

    #[test]
    fn test_non_editable_rejects_absent_item() {
        let mut combo = fruit_combo();
        let (actions, items) = counted(&combo);

        assert!(!combo.set_selected_item(CellValue::from("Durian")));

        assert_eq!(actions.load(Ordering::SeqCst), 0);
        assert!(items.lock().is_empty());
        assert_eq!(combo.selected_item(), CellValue::from("Apple"));
    }

    #[test]
    fn test_editable_accepts_absent_item() {
        let mut combo = fruit_combo().with_editable(true);
        assert!(combo.set_selected_item(CellValue::from("Durian")));
        assert_eq!(combo.selected_item(), CellValue::from("Durian"));
        assert_eq!(combo.selected_index(), None);
    }

    #[test]
    fn test_key_selection_wraps() {
        let mut combo = fruit_combo();

        // From Apple, the next 'a' match going forward is Avocado.
        assert!(combo.select_with_key_char('a'));
        assert_eq!(combo.selected_item(), CellValue::from("Avocado"));

        // From Avocado the search wraps past Cherry back to Apple.
        assert!(combo.select_with_key_char('a'));
        assert_eq!(combo.selected_item(), CellValue::from("Apple"));

        assert!(combo.select_with_key_char('C'));
        assert_eq!(combo.selected_item(), CellValue::from("Cherry"));

        assert!(!combo.select_with_key_char('z'));
        assert_eq!(combo.selected_item(), CellValue::from("Cherry"));
    }

    #[test]
    fn test_set_selected_index_bounds() {
        let mut combo = fruit_combo();
        assert!(combo.set_selected_index(3).is_ok());
        assert_eq!(combo.selected_item(), CellValue::from("Cherry"));
        assert_eq!(
            combo.set_selected_index(9),
            Err(ViewError::ItemOutOfBounds { index: 9, len: 4 })
        );
    }

    #[test]
    fn test_action_listener_reentry_suppressed() {
        let combo = Arc::new(fruit_combo());
        let fired = Arc::new(AtomicUsize::new(0));

        // An action listener that immediately fires again must not recurse.
        let f = fired.clone();
        let inner = combo.clone();
        combo.action.connect(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
            inner.fire_action_event();
        });

        combo.fire_action_event();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removing_selected_item_selects_previous() {
        let model = Arc::new(DefaultComboBoxModel::new(vec![
            CellValue::from("a"),
            CellValue::from("b"),
            CellValue::from("c"),
        ]));
        let mut combo = ComboBox::new(model.clone());
        combo.set_selected_item(CellValue::from("b"));

        model.remove_item(&CellValue::from("b"));
        combo.list_data_changed(&ListEvent::IntervalRemoved { first: 1, last: 1 });

        assert_eq!(combo.selected_item(), CellValue::from("a"));
        assert_eq!(model.len(), 2);

        // Removing the head selects the new head.
        model.remove_item_at(0);
        combo.list_data_changed(&ListEvent::IntervalRemoved { first: 0, last: 0 });
        assert_eq!(combo.selected_item(), CellValue::from("c"));
    }

    #[test]
    fn test_external_selection_change_synthesizes_events() {
        let model = Arc::new(DefaultComboBoxModel::new(vec![
            CellValue::from("x"),
            CellValue::from("y"),
        ]));
        let mut combo = ComboBox::new(model.clone());
        let (actions, items) = counted(&combo);

        // The model changes selection behind the box's back.
        model.set_selected_item(CellValue::from("y"));
        combo.list_data_changed(&ListEvent::ContentsChanged);

        assert_eq!(actions.load(Ordering::SeqCst), 1);
        assert_eq!(
            *items.lock(),
            vec![
                ItemEvent::Deselected(CellValue::from("x")),
                ItemEvent::Selected(CellValue::from("y")),
            ]
        );
    }
}
