//! Scoped re-entrancy guards.
//!
//! Several widget call chains must not re-enter themselves: a combo box
//! firing its action event, a table driving its row sorter, a sort
//! manager writing restored selection back into the selection model. The
//! reference designs for these chains use ad hoc boolean fields; Trellis
//! represents them as a [`ReentryFlag`] whose entered state is held by an
//! RAII [`ReentryGuard`], so the set/clear pairing cannot be forgotten on
//! an early return.
//!
//! These are correctness devices for a single logical thread, not locks.
//!
//! # Example
//!
//! ```
//! use trellis_core::ReentryFlag;
//!
//! let flag = ReentryFlag::new();
//! if let Some(_guard) = flag.enter() {
//!     // Protected section: a nested `flag.enter()` returns `None` here.
//!     assert!(flag.is_entered());
//! }
//! assert!(!flag.is_entered());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

/// A flag marking a call chain that must not be re-entered.
#[derive(Debug, Default)]
pub struct ReentryFlag {
    entered: AtomicBool,
}

impl ReentryFlag {
    /// Creates a new, un-entered flag.
    pub const fn new() -> Self {
        Self {
            entered: AtomicBool::new(false),
        }
    }

    /// Attempts to enter the protected section.
    ///
    /// Returns a guard if the section was not already entered, or `None`
    /// if this is a re-entrant call that should be suppressed. The flag
    /// clears when the guard is dropped.
    pub fn enter(&self) -> Option<ReentryGuard<'_>> {
        if self.entered.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(ReentryGuard { flag: self })
        }
    }

    /// Returns `true` while a guard for this flag is alive.
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// RAII guard returned by [`ReentryFlag::enter`].
///
/// Dropping the guard re-opens the protected section.
#[must_use = "dropping the guard immediately re-opens the protected section"]
pub struct ReentryGuard<'a> {
    flag: &'a ReentryFlag,
}

impl Drop for ReentryGuard<'_> {
    fn drop(&mut self) {
        self.flag.entered.store(false, Ordering::Release);
    }
}
