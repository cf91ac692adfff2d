//! Reachability monitoring.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use parking_lot::Mutex;
use reachline_core::{DispatchContext, EventHub, Payload, Signal};

use crate::error::Result;
use crate::flags::{InformationMode, PlatformClass, ReachabilityFlags, Status, classify};
use crate::probe::{
    FlagReceiver, FlagSink, MonitorToken, ProbeHandle, ReachabilityProbe, WatchGuard, registry,
};
use crate::target::ReachabilityTarget;

/// Hub channel on which status changes are published.
pub const REACHABILITY_CHANGED: &str = "ReachabilityChanged";

/// Payload key carrying the display string of the new status.
pub const STATUS_KEY: &str = "status";

/// A status transition delivered to callbacks and signal slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// The status before the transition.
    pub previous: Status,
    /// The status after the transition.
    pub current: Status,
}

/// Per-monitor configuration.
#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    /// How much detail reachable states carry. Defaults to Simple.
    pub mode: InformationMode,
    /// Platform category used by Advanced-mode classification. Defaults to
    /// the compile target's class; override for testing.
    pub platform: PlatformClass,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            mode: InformationMode::default(),
            platform: PlatformClass::current(),
        }
    }
}

impl MonitorOptions {
    /// Options with Advanced mode on the current platform.
    pub fn advanced() -> Self {
        Self {
            mode: InformationMode::Advanced,
            ..Self::default()
        }
    }

    /// Override the platform class.
    pub fn with_platform(mut self, platform: PlatformClass) -> Self {
        self.platform = platform;
        self
    }
}

type ChangeCallback = Arc<dyn Fn(StatusChange) + Send + Sync>;

/// Monitors the reachability of one target.
///
/// A monitor owns its probe handle exclusively; the platform subscription
/// lives between `start_monitoring` and `stop_monitoring` (or drop). All
/// status mutation and every notification happens on the dispatch context
/// the monitor was built with, so consumers observe changes in a single
/// well-defined order.
///
/// On every accepted status transition the monitor, in order: updates
/// previous/current, invokes the registered closure (if any), emits
/// [`status_changed`](Self::status_changed), and publishes on the event hub
/// channel [`REACHABILITY_CHANGED`] with the new status under
/// [`STATUS_KEY`].
///
/// # Example
///
/// ```ignore
/// use reachline::{ReachabilityContext, MonitorOptions};
///
/// let ctx = ReachabilityContext::new();
/// if let Some(monitor) = ctx.default_monitor() {
///     monitor.status_changed.connect(|change| {
///         println!("{} -> {}", change.previous, change.current);
///     });
///     monitor.start_monitoring();
/// }
/// ```
pub struct ReachabilityMonitor {
    /// Signal emitted on every accepted status transition, on the dispatch
    /// context thread.
    pub status_changed: Arc<Signal<StatusChange>>,

    shared: Arc<MonitorShared>,
    handle: Arc<dyn ProbeHandle>,
    watch: Mutex<Option<Box<dyn WatchGuard>>>,
    token: MonitorToken,
}

impl std::fmt::Debug for ReachabilityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachabilityMonitor")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

struct MonitorShared {
    target: ReachabilityTarget,
    options: MonitorOptions,
    dispatcher: Arc<DispatchContext>,
    hub: EventHub,
    signal: Arc<Signal<StatusChange>>,
    state: Mutex<StatusState>,
    callback: Mutex<Option<ChangeCallback>>,
    /// Current subscription epoch; deliveries from any other epoch are stale.
    epoch: AtomicU64,
    monitoring: AtomicBool,
}

struct StatusState {
    current: Status,
    previous: Status,
}

impl ReachabilityMonitor {
    /// Bind `target` through `probe` and build an unstarted monitor.
    ///
    /// Fails with [`ReachabilityError::TargetCreation`] if the probe refuses
    /// the target; no monitor is produced and nothing is retried.
    ///
    /// [`ReachabilityError::TargetCreation`]: crate::ReachabilityError::TargetCreation
    pub fn new(
        target: ReachabilityTarget,
        options: MonitorOptions,
        probe: &dyn ReachabilityProbe,
        dispatcher: Arc<DispatchContext>,
        hub: EventHub,
    ) -> Result<Self> {
        let handle = probe.bind(&target)?;
        let signal = Arc::new(Signal::new());
        let token = MonitorToken::next();

        let shared = Arc::new(MonitorShared {
            target,
            options,
            dispatcher,
            hub,
            signal: signal.clone(),
            state: Mutex::new(StatusState {
                current: Status::Unknown,
                previous: Status::Unknown,
            }),
            callback: Mutex::new(None),
            epoch: AtomicU64::new(0),
            monitoring: AtomicBool::new(false),
        });
        let receiver: std::sync::Weak<dyn FlagReceiver> =
            Arc::downgrade(&(shared.clone() as Arc<dyn FlagReceiver>));
        registry::register(token, receiver);

        Ok(Self {
            status_changed: signal,
            shared,
            handle,
            watch: Mutex::new(None),
            token,
        })
    }

    /// Start (or re-arm) monitoring. Idempotent; returns immediately.
    ///
    /// Any prior subscription is stopped first. A fresh probe watch is
    /// started, and the current flags are queried once on a background
    /// thread; the result is applied on the dispatch context and always
    /// broadcast as the initial notification, unless a later start or stop
    /// supersedes this subscription in the meantime.
    pub fn start_monitoring(&self) {
        self.stop_monitoring();

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.monitoring.store(true, Ordering::Release);

        let sink = FlagSink::new(self.token, epoch);
        match self.handle.watch(sink) {
            Ok(guard) => *self.watch.lock() = Some(guard),
            Err(e) => {
                tracing::warn!(
                    target: "reachline::monitor",
                    error = %e,
                    monitored = %self.shared.target,
                    "could not start platform watch; monitor left unarmed"
                );
                self.shared.monitoring.store(false, Ordering::Release);
                return;
            }
        }
        tracing::debug!(
            target: "reachline::monitor",
            monitored = %self.shared.target,
            epoch,
            "monitoring started"
        );

        // Initial flags query, off the dispatch thread so a slow platform
        // call never stalls notification delivery.
        let shared = self.shared.clone();
        let handle = self.handle.clone();
        let spawned = thread::Builder::new()
            .name("reachline-initial-flags".to_string())
            .spawn(move || {
                let flags = handle.flags();
                let dispatcher = shared.dispatcher.clone();
                dispatcher.post(move || shared.apply(epoch, flags, true));
            });
        if let Err(e) = spawned {
            tracing::warn!(
                target: "reachline::monitor",
                error = %e,
                "could not spawn initial flags query"
            );
        }
    }

    /// Stop monitoring. Idempotent; a no-op if never started.
    ///
    /// The platform watch is released and the subscription epoch advances,
    /// so deliveries already in flight are discarded instead of applied.
    pub fn stop_monitoring(&self) {
        let guard = self.watch.lock().take();
        self.shared.monitoring.store(false, Ordering::Release);
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        if guard.is_some() {
            tracing::debug!(
                target: "reachline::monitor",
                monitored = %self.shared.target,
                "monitoring stopped"
            );
        }
    }

    /// Stop monitoring and return the status to [`Status::Unknown`].
    ///
    /// The reset itself is not broadcast.
    pub fn reset(&self) {
        self.stop_monitoring();
        let shared = self.shared.clone();
        self.shared.dispatcher.post(move || {
            let mut state = shared.state.lock();
            state.previous = Status::Unknown;
            state.current = Status::Unknown;
        });
    }

    /// Register a closure invoked on every accepted status transition,
    /// before the signal and the hub publication. Replaces any previous
    /// closure.
    pub fn set_on_change<F>(&self, callback: F)
    where
        F: Fn(StatusChange) + Send + Sync + 'static,
    {
        *self.shared.callback.lock() = Some(Arc::new(callback));
    }

    /// Remove the registered change closure.
    pub fn clear_on_change(&self) {
        *self.shared.callback.lock() = None;
    }

    /// The current status.
    pub fn status(&self) -> Status {
        self.shared.state.lock().current
    }

    /// The status before the last accepted transition.
    pub fn previous_status(&self) -> Status {
        self.shared.state.lock().previous
    }

    /// Whether the target is currently reachable in any way.
    pub fn is_reachable(&self) -> bool {
        self.status().is_reachable()
    }

    /// Whether the target is reachable via cellular.
    pub fn is_reachable_via_cellular(&self) -> bool {
        self.status() == Status::ReachableViaCellular
    }

    /// Whether the target is reachable via WiFi.
    pub fn is_reachable_via_wifi(&self) -> bool {
        self.status() == Status::ReachableViaWiFi
    }

    /// Whether a platform subscription is currently armed.
    pub fn is_monitoring(&self) -> bool {
        self.shared.monitoring.load(Ordering::Acquire)
    }

    /// The monitored target.
    pub fn target(&self) -> &ReachabilityTarget {
        &self.shared.target
    }

    /// The monitor's information mode.
    pub fn mode(&self) -> InformationMode {
        self.shared.options.mode
    }

    /// The platform class used for Advanced-mode classification.
    pub fn platform_class(&self) -> PlatformClass {
        self.shared.options.platform
    }
}

impl Drop for ReachabilityMonitor {
    fn drop(&mut self) {
        self.stop_monitoring();
        registry::unregister(self.token);
    }
}

impl MonitorShared {
    /// Classify and apply a flag delivery. Runs on the dispatch thread.
    ///
    /// `force` marks the initial observation of a subscription, which is
    /// broadcast even when the classified status equals the current one.
    fn apply(&self, epoch: u64, flags: ReachabilityFlags, force: bool) {
        if !self.monitoring.load(Ordering::Acquire) || epoch != self.epoch.load(Ordering::Acquire) {
            tracing::trace!(
                target: "reachline::monitor",
                epoch,
                "stale flag delivery discarded"
            );
            return;
        }

        let status = classify(flags, self.options.mode, self.options.platform);
        let change = {
            let mut state = self.state.lock();
            if !force && status == state.current {
                tracing::trace!(
                    target: "reachline::monitor",
                    %status,
                    "unchanged status, notification suppressed"
                );
                return;
            }
            state.previous = state.current;
            state.current = status;
            StatusChange {
                previous: state.previous,
                current: state.current,
            }
        };

        tracing::debug!(
            target: "reachline::monitor",
            monitored = %self.target,
            previous = %change.previous,
            current = %change.current,
            initial = force,
            "status changed"
        );

        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(change);
        }
        self.signal.emit(&change);

        let mut payload = Payload::new();
        payload.insert(STATUS_KEY.to_string(), change.current.to_string());
        self.hub.publish(REACHABILITY_CHANGED, &payload);
    }
}

impl FlagReceiver for MonitorShared {
    fn deliver(self: Arc<Self>, epoch: u64, flags: ReachabilityFlags) {
        // Arbitrary platform thread; re-dispatch before touching state.
        let dispatcher = self.dispatcher.clone();
        dispatcher.post(move || self.apply(epoch, flags, false));
    }
}
