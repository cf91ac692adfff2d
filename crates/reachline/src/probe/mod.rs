//! Platform probe seam.
//!
//! The probe is the library's only edge to the operating system. A
//! [`ReachabilityProbe`] binds a [`ReachabilityTarget`] to a
//! [`ProbeHandle`], which can report the current flag set on demand and
//! start a watch that pushes flag changes into a [`FlagSink`].
//!
//! A sink does not hold a reference to its monitor. It carries a stable
//! [`MonitorToken`] plus the subscription epoch it was issued under, and
//! every delivery is resolved through a registry lookup. A monitor that has
//! been dropped simply no longer resolves, and a sink from a superseded
//! start/stop cycle is discarded by the epoch check, so probe callbacks can
//! fire from any thread at any time without holding the monitor alive or
//! reviving a stale subscription.
//!
//! [`SystemProbe`] is the production implementation; tests inject their own.

mod system;

pub use system::SystemProbe;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;

use crate::error::Result;
use crate::flags::ReachabilityFlags;
use crate::target::ReachabilityTarget;

/// Creates probe handles for reachability targets.
pub trait ReachabilityProbe: Send + Sync {
    /// Bind a target, validating it.
    ///
    /// Fails with [`ReachabilityError::TargetCreation`] if the target is
    /// malformed or the platform cannot observe it.
    ///
    /// [`ReachabilityError::TargetCreation`]: crate::ReachabilityError::TargetCreation
    fn bind(&self, target: &ReachabilityTarget) -> Result<Arc<dyn ProbeHandle>>;
}

/// A probe handle bound to one target.
pub trait ProbeHandle: Send + Sync {
    /// Query the current flag set. May be slow (a platform call); monitors
    /// invoke it off the dispatch thread.
    fn flags(&self) -> ReachabilityFlags;

    /// Start pushing flag changes into `sink`.
    ///
    /// Delivery stops when the returned guard is dropped.
    fn watch(&self, sink: FlagSink) -> Result<Box<dyn WatchGuard>>;
}

impl std::fmt::Debug for dyn ProbeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeHandle").finish_non_exhaustive()
    }
}

/// Keeps a probe watch alive; dropping the guard stops delivery.
pub trait WatchGuard: Send {}

impl<T: Send> WatchGuard for T {}

/// Stable identifier for a monitor instance, used by sinks to resolve their
/// monitor through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorToken(u64);

impl MonitorToken {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a probe watch pushes flag changes.
///
/// Cloneable and cheap; the sink stays valid after its monitor is dropped or
/// restarted, deliveries are then silently discarded.
#[derive(Debug, Clone)]
pub struct FlagSink {
    token: MonitorToken,
    epoch: u64,
}

impl FlagSink {
    pub(crate) fn new(token: MonitorToken, epoch: u64) -> Self {
        Self { token, epoch }
    }

    /// Deliver a flag set observed by the platform.
    ///
    /// Callable from any thread; the receiving monitor re-dispatches onto
    /// its dispatch context before touching any state.
    pub fn deliver(&self, flags: ReachabilityFlags) {
        registry::dispatch(self.token, self.epoch, flags);
    }
}

/// Receives flag deliveries resolved through the registry.
pub(crate) trait FlagReceiver: Send + Sync {
    fn deliver(self: Arc<Self>, epoch: u64, flags: ReachabilityFlags);
}

pub(crate) mod registry {
    use super::*;

    static RECEIVERS: LazyLock<Mutex<HashMap<MonitorToken, Weak<dyn FlagReceiver>>>> =
        LazyLock::new(|| Mutex::new(HashMap::new()));

    pub(crate) fn register(token: MonitorToken, receiver: Weak<dyn FlagReceiver>) {
        RECEIVERS.lock().insert(token, receiver);
    }

    pub(crate) fn unregister(token: MonitorToken) {
        RECEIVERS.lock().remove(&token);
    }

    pub(crate) fn dispatch(token: MonitorToken, epoch: u64, flags: ReachabilityFlags) {
        let receiver = RECEIVERS.lock().get(&token).and_then(Weak::upgrade);
        match receiver {
            Some(receiver) => receiver.deliver(epoch, flags),
            None => {
                tracing::trace!(
                    target: "reachline::probe",
                    ?token,
                    "delivery for unregistered monitor discarded"
                );
            }
        }
    }
}
