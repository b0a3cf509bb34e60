//! Typed row and column coordinates.
//!
//! A table with a sorter active has two row orderings: the model's and
//! the view's. Mixing them up is the classic table bug, so indices that
//! cross the sorter boundary are typed. `ViewRow(2)` and `ModelRow(2)`
//! name different rows whenever a sort or filter is in effect, and the
//! compiler refuses to confuse them.
//!
//! Columns get the same treatment for reorderable headers: a
//! `ViewColumn` is a position in the current column order, a
//! `ModelColumn` is the column's identity in the model.
//!
//! Raw `usize` still appears inside a single space (for example in
//! `TableModel`, which only ever speaks model coordinates).

macro_rules! coord_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// The raw index within this coordinate space.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

coord_type! {
    /// A row position in view (display) order.
    ViewRow
}

coord_type! {
    /// A row position in the underlying model.
    ModelRow
}

coord_type! {
    /// A column position in view (display) order.
    ViewColumn
}

coord_type! {
    /// A column's identity in the underlying model.
    ModelColumn
}
