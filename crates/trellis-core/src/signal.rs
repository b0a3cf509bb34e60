//! Signal/slot system for Trellis.
//!
//! This module provides a type-safe signal mechanism for model-to-view
//! notification. Signals are emitted by models when their state changes,
//! and connected slots (callbacks) are invoked in response.
//!
//! Slots are invoked synchronously, on the emitting thread, in
//! **last-connected-first-notified** order. That order is a contract, not
//! an accident of container iteration: views rely on it when several
//! observers of the same model must see a change in a predictable
//! sequence.
//!
//! # Example
//!
//! ```
//! use trellis_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//!
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use static_assertions::assert_impl_all;

/// A unique identifier for a signal-slot connection.
///
/// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
/// The ID remains valid until the connection is explicitly disconnected or
/// the signal is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// Internal storage for a single connection.
struct Connection<Args> {
    id: ConnectionId,
    /// The slot function to invoke (Arc-wrapped so emission can run
    /// without holding the connection list lock).
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A type-safe signal that can have multiple connected slots.
///
/// When a signal is emitted, all connected slots are invoked with a
/// reference to the provided arguments, newest connection first.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for
///   signals with no arguments, or a tuple like `(String, i32)` for
///   multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync` and can be shared between threads, but
/// emission is always synchronous on the calling thread; the toolkit's
/// concurrency contract forbids concurrent mutation of the models that
/// own signals.
pub struct Signal<Args> {
    /// All active connections, in connection order.
    connections: Mutex<Vec<Connection<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
    /// Source for the next `ConnectionId`.
    next_id: AtomicU64,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
            blocked: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a [`ConnectionId`] that can be used to disconnect the slot
    /// later. Slots connected later are notified earlier.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.connections.lock().push(Connection {
            id,
            slot: Arc::new(slot),
        });
        id
    }

    /// Disconnect a previously connected slot.
    ///
    /// Returns `true` if the connection existed and was removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        let before = connections.len();
        connections.retain(|c| c.id != id);
        connections.len() != before
    }

    /// Disconnect all slots.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Emit the signal, invoking every connected slot.
    ///
    /// Slots are invoked synchronously, newest connection first. Emission
    /// while the signal is [blocked](Self::block) is a no-op.
    pub fn emit(&self, args: Args) {
        if self.blocked.load(Ordering::Acquire) {
            tracing::trace!(target: "trellis_core::signal", "signal blocked, skipping emit");
            return;
        }
        // Snapshot the slots so a slot may connect/disconnect without
        // deadlocking on the connection list.
        let slots: Vec<Arc<dyn Fn(&Args) + Send + Sync>> = {
            let connections = self.connections.lock();
            tracing::trace!(
                target: "trellis_core::signal",
                connection_count = connections.len(),
                "emitting signal"
            );
            connections.iter().rev().map(|c| c.slot.clone()).collect()
        };
        for slot in slots {
            slot(&args);
        }
    }

    /// Block the signal: subsequent emissions do nothing until
    /// [`unblock`](Self::unblock) is called.
    pub fn block(&self) {
        self.blocked.store(true, Ordering::Release);
    }

    /// Unblock the signal.
    pub fn unblock(&self) {
        self.blocked.store(false, Ordering::Release);
    }

    /// Returns `true` if the signal is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Returns the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

assert_impl_all!(Signal<()>: Send, Sync);
assert_impl_all!(Signal<(String, usize)>: Send, Sync);
