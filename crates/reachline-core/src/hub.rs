//! Process-wide publish/subscribe event hub.
//!
//! The hub carries loosely-coupled broadcasts between components that do not
//! hold references to each other: a publisher posts a string-map payload on a
//! named channel, and every subscriber registered for that channel receives
//! it. Delivery is synchronous on the publishing thread and follows
//! subscriber registration order.
//!
//! Unlike a global notification center, an [`EventHub`] is an ordinary value
//! that the application constructs and hands to the components that need it.
//! Cloning a hub yields another handle to the same channels.
//!
//! # Example
//!
//! ```
//! use reachline_core::{EventHub, Payload};
//!
//! let hub = EventHub::new();
//!
//! let sub = hub.subscribe("ConfigChanged", |payload| {
//!     if let Some(key) = payload.get("key") {
//!         println!("{key} changed");
//!     }
//! });
//!
//! let mut payload = Payload::new();
//! payload.insert("key".to_string(), "theme".to_string());
//! hub.publish("ConfigChanged", &payload);
//!
//! hub.unsubscribe(sub);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Payload carried by a hub event: string keys to string values.
pub type Payload = HashMap<String, String>;

/// Identifies one hub subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    slot: Arc<dyn Fn(&Payload) + Send + Sync>,
}

struct HubInner {
    channels: Mutex<HashMap<String, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

/// A named-channel publish/subscribe hub.
///
/// `EventHub` is a cheaply cloneable handle; clones share the same channel
/// table. It is `Send + Sync`. Subscribers for a channel are invoked in the
/// order they registered; subscribers on other channels are not touched.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                channels: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register `slot` for events published on `channel`.
    pub fn subscribe<F>(&self, channel: impl Into<String>, slot: F) -> SubscriptionId
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .channels
            .lock()
            .entry(channel.into())
            .or_default()
            .push(Subscriber {
                id,
                slot: Arc::new(slot),
            });
        id
    }

    /// Register a subscription that is removed when the returned guard drops.
    pub fn subscribe_scoped<F>(&self, channel: impl Into<String>, slot: F) -> SubscriptionGuard
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        SubscriptionGuard {
            hub: self.clone(),
            id: self.subscribe(channel, slot),
        }
    }

    /// Remove a subscription. Returns `true` if it was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut channels = self.inner.channels.lock();
        for subscribers in channels.values_mut() {
            if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
                subscribers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of subscribers currently registered for `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .lock()
            .get(channel)
            .map_or(0, |subscribers| subscribers.len())
    }

    /// Publish `payload` to every subscriber of `channel`, in registration
    /// order, on the calling thread.
    pub fn publish(&self, channel: &str, payload: &Payload) {
        // Snapshot so a subscriber may subscribe/unsubscribe re-entrantly.
        let slots: Vec<_> = self
            .inner
            .channels
            .lock()
            .get(channel)
            .map(|subscribers| subscribers.iter().map(|s| s.slot.clone()).collect())
            .unwrap_or_default();

        tracing::trace!(
            target: "reachline_core::hub",
            channel,
            subscriber_count = slots.len(),
            "publishing event"
        );
        for slot in slots {
            slot(payload);
        }
    }
}

/// A subscription that unsubscribes itself when dropped.
///
/// Created via [`EventHub::subscribe_scoped`].
pub struct SubscriptionGuard {
    hub: EventHub,
    id: SubscriptionId,
}

impl SubscriptionGuard {
    /// The id of the underlying subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let _ = self.hub.unsubscribe(self.id);
    }
}
