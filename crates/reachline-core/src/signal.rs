//! Signal/slot mechanism for change notification.
//!
//! A [`Signal<Args>`] holds a table of connected slots (closures) and invokes
//! them when emitted. Slots always run on the emitting thread; components
//! that need their slots serialized onto a specific thread emit from that
//! thread (see [`crate::DispatchContext`]).
//!
//! # Example
//!
//! ```
//! use reachline_core::Signal;
//!
//! let status_changed = Signal::<String>::new();
//!
//! let id = status_changed.connect(|status| {
//!     println!("status is now {status}");
//! });
//!
//! status_changed.emit(&"online".to_string());
//! status_changed.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies one signal-slot connection.
    ///
    /// Returned by [`Signal::connect`]; pass it to [`Signal::disconnect`] to
    /// remove the slot again.
    pub struct ConnectionId;
}

/// A signal with multiple connected slots.
///
/// `Signal` is `Send + Sync`; connections may be added and removed from any
/// thread. Emission walks the connection table in slot order and calls each
/// slot with a reference to the arguments.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Arc<dyn Fn(&Args) + Send + Sync>>>,
    /// Whether emission is temporarily suppressed.
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot. Returns the id used to disconnect it later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Connect a slot that disconnects itself when the returned guard drops.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<'_, Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        ConnectionGuard {
            signal: self,
            id: self.connect(slot),
        }
    }

    /// Remove a connection. Returns `true` if it was still present.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Remove every connection.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Suppress or re-enable emission.
    ///
    /// While blocked, [`emit`](Self::emit) is a no-op. Useful during batch
    /// updates to avoid cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Whether emission is currently suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Invoke every connected slot with `args`.
    ///
    /// Slots run on the calling thread. The connection table lock is released
    /// before any slot executes, so slots may connect or disconnect freely.
    pub fn emit(&self, args: &Args) {
        if self.is_blocked() {
            tracing::trace!(target: "reachline_core::signal", "signal blocked, skipping emit");
            return;
        }

        // Snapshot the slots so re-entrant connect/disconnect cannot deadlock.
        let slots: Vec<_> = self.connections.lock().values().cloned().collect();
        tracing::trace!(
            target: "reachline_core::signal",
            connection_count = slots.len(),
            "emitting signal"
        );
        for slot in slots {
            slot(args);
        }
    }
}

/// A connection that disconnects itself when dropped.
///
/// Created via [`Signal::connect_scoped`]. The borrow ties the guard's
/// lifetime to the signal, so no dangling disconnect is possible.
pub struct ConnectionGuard<'a, Args> {
    signal: &'a Signal<Args>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<'_, Args> {
    /// The id of the underlying connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<'_, Args> {
    fn drop(&mut self) {
        let _ = self.signal.disconnect(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_and_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(&42);
        signal.emit(&100);

        assert_eq!(*received.lock(), vec![42, 100]);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let id = signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(&1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(&2);

        assert_eq!(*received.lock(), vec![1]);
    }

    #[test]
    fn blocked_signal_drops_emissions() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(&1);
        signal.set_blocked(true);
        signal.emit(&2);
        signal.set_blocked(false);
        signal.emit(&3);

        assert_eq!(*received.lock(), vec![1, 3]);
    }

    #[test]
    fn multiple_connections_all_fire() {
        let signal = Signal::<()>::new();
        let count = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let count_clone = count.clone();
            signal.connect(move |_| {
                *count_clone.lock() += 1;
            });
        }

        assert_eq!(signal.connection_count(), 3);
        signal.emit(&());
        assert_eq!(*count.lock(), 3);
    }

    #[test]
    fn scoped_connection_disconnects_on_drop() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        {
            let received_clone = received.clone();
            let _guard = signal.connect_scoped(move |&value| {
                received_clone.lock().push(value);
            });
            signal.emit(&1);
        }

        signal.emit(&2);
        assert_eq!(*received.lock(), vec![1]);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn emit_from_other_thread() {
        let signal = Arc::new(Signal::<i32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        let signal_clone = signal.clone();
        std::thread::spawn(move || {
            signal_clone.emit(&7);
        })
        .join()
        .unwrap();

        assert_eq!(*received.lock(), vec![7]);
    }

    #[test]
    fn slot_can_disconnect_during_emit() {
        // Re-entrancy: the emitting snapshot must not hold the table lock.
        let signal = Arc::new(Signal::<()>::new());
        let signal_clone = signal.clone();
        signal.connect(move |_| {
            signal_clone.disconnect_all();
        });

        signal.emit(&());
        assert_eq!(signal.connection_count(), 0);
    }
}
