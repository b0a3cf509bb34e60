//! Core systems for the Trellis widget toolkit.
//!
//! This crate holds the pieces the model/view layer is built on:
//!
//! - [`Signal`]: a type-safe observer channel with explicit fan-out order
//! - [`ReentryFlag`] / [`ReentryGuard`]: scoped re-entrancy suppression
//! - [`Point`], [`Size`], [`Rect`]: integer-pixel geometry
//!
//! Trellis is single-logical-thread by contract: all model and widget
//! mutation happens on one UI thread, and listener fan-out is synchronous.
//! Types here are still `Send + Sync` so models can be shared between
//! views through `Arc` handles.

mod geometry;
mod guard;
mod signal;

pub use geometry::{Point, Rect, Size};
pub use guard::{ReentryFlag, ReentryGuard};
pub use signal::{ConnectionId, Signal};
