//! Cell values and column classes.
//!
//! Table cells hold a [`CellValue`], a small type-erased payload. Each
//! column advertises a [`ColumnClass`] that tells renderers, editors, and
//! the default sort comparison which variant to expect.

use std::cmp::Ordering;
use std::fmt;

/// Type-erased value stored in a table or combo box cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value present.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Returns `true` for [`CellValue::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, CellValue::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::None => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Compares two cell values for sorting.
///
/// `None` sorts before everything else. Values of different classes
/// compare equal, which keeps a stable sort from reshuffling
/// heterogeneous columns.
pub fn compare_cell_values(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::None, CellValue::None) => Ordering::Equal,
        (CellValue::None, _) => Ordering::Less,
        (_, CellValue::None) => Ordering::Greater,
        (CellValue::Bool(ba), CellValue::Bool(bb)) => ba.cmp(bb),
        (CellValue::Int(ia), CellValue::Int(ib)) => ia.cmp(ib),
        (CellValue::Float(fa), CellValue::Float(fb)) => {
            fa.partial_cmp(fb).unwrap_or(Ordering::Equal)
        }
        (CellValue::Text(sa), CellValue::Text(sb)) => sa.cmp(sb),
        _ => Ordering::Equal,
    }
}

/// The value class a column declares for its cells.
///
/// Editors use the class to parse user input; the default sort
/// comparison uses it to pick an ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColumnClass {
    Bool,
    Int,
    Float,
    #[default]
    Text,
}

impl ColumnClass {
    /// Parses user-entered text into a value of this class.
    ///
    /// Returns `None` when the text does not parse; callers treat that
    /// as invalid editor input rather than substituting a default.
    pub fn parse(&self, text: &str) -> Option<CellValue> {
        let text = text.trim();
        match self {
            ColumnClass::Bool => match text {
                "true" => Some(CellValue::Bool(true)),
                "false" => Some(CellValue::Bool(false)),
                _ => None,
            },
            ColumnClass::Int => text.parse::<i64>().ok().map(CellValue::Int),
            ColumnClass::Float => text.parse::<f64>().ok().map(CellValue::Float),
            ColumnClass::Text => Some(CellValue::Text(text.to_string())),
        }
    }
}
