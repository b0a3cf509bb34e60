//! Cell editing and rendering seams.
//!
//! The table view never interprets cell contents itself. Display goes
//! through a [`CellRenderer`]; in-place edits go through a
//! [`CellEditor`]. An editor may refuse to commit: `stop_editing`
//! returns `false` when its current input is invalid, and the table
//! leaves the edit session open rather than guessing a value.

use crate::model::{CellValue, ColumnClass, ViewColumn, ViewRow};

/// Produces the display text for a cell value.
pub trait CellRenderer: Send + Sync {
    fn render(&self, value: &CellValue) -> String;
}

/// Default renderer: the value's `Display` form.
#[derive(Debug, Default)]
pub struct TextCellRenderer;

impl CellRenderer for TextCellRenderer {
    fn render(&self, value: &CellValue) -> String {
        value.to_string()
    }
}

/// An in-progress cell edit.
///
/// The editor owns the pending input. Committing is explicit and may
/// fail; cancelling discards the input without touching the model.
pub trait CellEditor: Send {
    /// The committed value. Before a successful
    /// [`stop_editing`](Self::stop_editing) this is the value editing
    /// started from.
    fn value(&self) -> CellValue;

    /// Replaces the editor's pending input with `input`.
    fn set_input(&mut self, input: &str);

    /// Attempts to commit the current input.
    ///
    /// Returns `false` when the input does not form a valid value; the
    /// editor stays open and flags itself invalid.
    fn stop_editing(&mut self) -> bool;

    /// Abandons the current input, reverting to the starting value.
    fn cancel_editing(&mut self);

    /// `false` after a failed commit, until the input changes.
    fn is_valid(&self) -> bool;
}

/// Text-field editor that parses its input against a [`ColumnClass`].
#[derive(Debug)]
pub struct TextCellEditor {
    class: ColumnClass,
    text: String,
    value: CellValue,
    invalid: bool,
}

impl TextCellEditor {
    /// Starts editing from `value`, displayed as text.
    pub fn new(value: CellValue, class: ColumnClass) -> Self {
        Self {
            class,
            text: value.to_string(),
            value,
            invalid: false,
        }
    }

    /// The current (possibly uncommitted) input text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the input text, clearing any invalid flag.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.invalid = false;
    }
}

impl CellEditor for TextCellEditor {
    fn value(&self) -> CellValue {
        self.value.clone()
    }

    fn set_input(&mut self, input: &str) {
        self.set_text(input);
    }

    fn stop_editing(&mut self) -> bool {
        match self.class.parse(&self.text) {
            Some(parsed) => {
                self.value = parsed;
                self.invalid = false;
                true
            }
            None => {
                self.invalid = true;
                false
            }
        }
    }

    fn cancel_editing(&mut self) {
        self.text = self.value.to_string();
        self.invalid = false;
    }

    fn is_valid(&self) -> bool {
        !self.invalid
    }
}

/// The cell a table is currently editing, plus its editor.
pub struct EditingSession {
    pub row: ViewRow,
    pub column: ViewColumn,
    pub editor: Box<dyn CellEditor>,
}
