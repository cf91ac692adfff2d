//! Monitor behavior against a scripted probe.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use parking_lot::Mutex;
use reachline::{
    FlagSink, InformationMode, MonitorOptions, PlatformClass, ProbeHandle, REACHABILITY_CHANGED,
    ReachabilityContext, ReachabilityError, ReachabilityFlags, ReachabilityProbe,
    ReachabilityTarget, Result, STATUS_KEY, Status, StatusChange, WatchGuard,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_TIMEOUT: Duration = Duration::from_millis(300);

/// A probe the tests can script: flags are set by hand and pushed into every
/// live watch, like the platform would on a route change.
#[derive(Clone)]
struct MockProbe {
    inner: Arc<MockInner>,
}

struct MockInner {
    flags: Mutex<ReachabilityFlags>,
    sinks: Mutex<Vec<(u64, FlagSink)>>,
    next_watch_id: AtomicU64,
    reject_any_route: bool,
}

impl MockProbe {
    fn new(initial: ReachabilityFlags) -> Self {
        Self {
            inner: Arc::new(MockInner {
                flags: Mutex::new(initial),
                sinks: Mutex::new(Vec::new()),
                next_watch_id: AtomicU64::new(1),
                reject_any_route: false,
            }),
        }
    }

    fn rejecting_any_route() -> Self {
        Self {
            inner: Arc::new(MockInner {
                flags: Mutex::new(ReachabilityFlags::offline()),
                sinks: Mutex::new(Vec::new()),
                next_watch_id: AtomicU64::new(1),
                reject_any_route: true,
            }),
        }
    }

    /// Simulate a platform flag change: update the queryable flags and
    /// notify every live watch.
    fn push(&self, flags: ReachabilityFlags) {
        *self.inner.flags.lock() = flags;
        let sinks: Vec<FlagSink> = self
            .inner
            .sinks
            .lock()
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect();
        for sink in sinks {
            sink.deliver(flags);
        }
    }

    fn active_watches(&self) -> usize {
        self.inner.sinks.lock().len()
    }

    /// Clones of the currently live sinks, for simulating late deliveries
    /// from a subscription the monitor has already abandoned.
    fn sink_snapshot(&self) -> Vec<FlagSink> {
        self.inner
            .sinks
            .lock()
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect()
    }
}

impl ReachabilityProbe for MockProbe {
    fn bind(&self, target: &ReachabilityTarget) -> Result<Arc<dyn ProbeHandle>> {
        target.validate()?;
        if self.inner.reject_any_route && *target == ReachabilityTarget::AnyRoute {
            return Err(ReachabilityError::TargetCreation(
                "any-route handle rejected".to_string(),
            ));
        }
        Ok(Arc::new(MockHandle {
            inner: self.inner.clone(),
        }))
    }
}

struct MockHandle {
    inner: Arc<MockInner>,
}

impl ProbeHandle for MockHandle {
    fn flags(&self) -> ReachabilityFlags {
        *self.inner.flags.lock()
    }

    fn watch(&self, sink: FlagSink) -> Result<Box<dyn WatchGuard>> {
        let id = self.inner.next_watch_id.fetch_add(1, Ordering::Relaxed);
        self.inner.sinks.lock().push((id, sink));
        Ok(Box::new(MockWatch {
            inner: self.inner.clone(),
            id,
        }))
    }
}

struct MockWatch {
    inner: Arc<MockInner>,
    id: u64,
}

impl Drop for MockWatch {
    fn drop(&mut self) {
        self.inner.sinks.lock().retain(|(id, _)| *id != self.id);
    }
}

/// Collect `status_changed` emissions into a channel.
fn watch_changes(monitor: &reachline::ReachabilityMonitor) -> Receiver<StatusChange> {
    let (sender, receiver) = unbounded();
    monitor.status_changed.connect(move |change| {
        let _ = sender.send(*change);
    });
    receiver
}

/// Drain everything currently arriving, returning once the channel has been
/// quiet for a while. Used where the number of in-flight initial
/// notifications is timing-dependent.
fn drain(receiver: &Receiver<StatusChange>) -> Vec<StatusChange> {
    let mut seen = Vec::new();
    while let Ok(change) = receiver.recv_timeout(QUIET_TIMEOUT) {
        seen.push(change);
    }
    seen
}

#[test]
fn initial_notification_for_any_route_simple() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let (sender, receiver) = unbounded::<String>();
    let _sub = ctx.hub().subscribe_scoped(REACHABILITY_CHANGED, move |payload| {
        let _ = sender.send(payload.get(STATUS_KEY).cloned().unwrap_or_default());
    });

    let monitor = ctx.default_monitor().expect("default monitor");
    assert_eq!(monitor.status(), Status::Unknown);
    monitor.start_monitoring();

    let status = receiver.recv_timeout(RECV_TIMEOUT).expect("initial notification");
    assert_eq!(status, "Reachable");

    ctx.dispatcher().flush();
    assert_eq!(monitor.status(), Status::Reachable);
    assert_eq!(monitor.previous_status(), Status::Unknown);
    assert!(monitor.is_reachable());
    assert!(!monitor.is_reachable_via_wifi());
    assert!(!monitor.is_reachable_via_cellular());
}

#[test]
fn cellular_then_wifi_produces_two_notifications() {
    let probe = MockProbe::new(ReachabilityFlags::cellular());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let options = MonitorOptions {
        mode: InformationMode::Advanced,
        platform: PlatformClass::Mobile,
    };
    let monitor = ctx.monitor_for_any_route(options).unwrap();
    let changes = watch_changes(&monitor);

    monitor.start_monitoring();
    let initial = changes.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(initial.previous, Status::Unknown);
    assert_eq!(initial.current, Status::ReachableViaCellular);
    ctx.dispatcher().flush();
    assert!(monitor.is_reachable_via_cellular());

    // WiFi join: cellular flag clears.
    probe.push(ReachabilityFlags::online());
    ctx.dispatcher().flush();

    let change = changes.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(change.previous, Status::ReachableViaCellular);
    assert_eq!(change.current, Status::ReachableViaWiFi);
    assert!(monitor.is_reachable_via_wifi());
    assert!(!monitor.is_reachable_via_cellular());
}

#[test]
fn unchanged_classification_is_suppressed() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let monitor = ctx.monitor_for_any_route(MonitorOptions::default()).unwrap();
    let changes = watch_changes(&monitor);

    monitor.start_monitoring();
    changes.recv_timeout(RECV_TIMEOUT).expect("initial notification");

    // Identical flag set.
    probe.push(ReachabilityFlags::online());
    // Different raw flags, same classification under Simple mode.
    probe.push(ReachabilityFlags::cellular());
    ctx.dispatcher().flush();

    assert!(changes.try_recv().is_err(), "no notification expected");
    assert_eq!(monitor.status(), Status::Reachable);
}

#[test]
fn deliveries_after_stop_are_inert() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let monitor = ctx.monitor_for_any_route(MonitorOptions::default()).unwrap();
    let changes = watch_changes(&monitor);

    monitor.start_monitoring();
    changes.recv_timeout(RECV_TIMEOUT).expect("initial notification");
    assert!(monitor.is_monitoring());

    let stale_sinks = probe.sink_snapshot();
    monitor.stop_monitoring();
    assert!(!monitor.is_monitoring());
    assert_eq!(probe.active_watches(), 0);

    // A sink kept around by the platform layer may still fire; it must not
    // alter status or produce notifications.
    for sink in &stale_sinks {
        sink.deliver(ReachabilityFlags::offline());
    }
    probe.push(ReachabilityFlags::offline());
    ctx.dispatcher().flush();

    assert!(changes.try_recv().is_err());
    assert_eq!(monitor.status(), Status::Reachable);

    // Stopping again is a no-op.
    monitor.stop_monitoring();
}

#[test]
fn restarting_rearms_a_single_subscription() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let monitor = ctx.monitor_for_any_route(MonitorOptions::default()).unwrap();
    let changes = watch_changes(&monitor);

    monitor.start_monitoring();
    monitor.start_monitoring();
    assert_eq!(probe.active_watches(), 1);

    // Let the initial notifications (one per surviving epoch) settle.
    let initial = drain(&changes);
    assert!(!initial.is_empty());
    assert!(initial.iter().all(|c| c.current == Status::Reachable));

    // One underlying flag change yields exactly one notification.
    probe.push(ReachabilityFlags::offline());
    ctx.dispatcher().flush();
    let after = drain(&changes);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].current, Status::NotReachable);
}

#[test]
fn callback_signal_and_hub_fire_in_order() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let monitor = ctx.monitor_for_any_route(MonitorOptions::default()).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    let order_clone = order.clone();
    monitor.set_on_change(move |_| order_clone.lock().push("callback"));
    let order_clone = order.clone();
    monitor.status_changed.connect(move |_| order_clone.lock().push("signal"));
    let order_clone = order.clone();
    let _sub = ctx
        .hub()
        .subscribe_scoped(REACHABILITY_CHANGED, move |_| order_clone.lock().push("hub"));

    let changes = watch_changes(&monitor);
    monitor.start_monitoring();
    changes.recv_timeout(RECV_TIMEOUT).expect("initial notification");
    ctx.dispatcher().flush();

    assert_eq!(*order.lock(), vec!["callback", "signal", "hub"]);
}

#[test]
fn cleared_callback_no_longer_fires() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let monitor = ctx.monitor_for_any_route(MonitorOptions::default()).unwrap();
    let hits = Arc::new(Mutex::new(0));

    let hits_clone = hits.clone();
    monitor.set_on_change(move |_| *hits_clone.lock() += 1);

    let changes = watch_changes(&monitor);
    monitor.start_monitoring();
    changes.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(*hits.lock(), 1);

    monitor.clear_on_change();
    probe.push(ReachabilityFlags::offline());
    ctx.dispatcher().flush();
    changes.recv_timeout(RECV_TIMEOUT).unwrap();

    assert_eq!(*hits.lock(), 1);
}

#[test]
fn malformed_domain_fails_target_creation() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe));

    let err = ctx
        .monitor_for_domain("not a domain", MonitorOptions::default())
        .unwrap_err();
    assert!(matches!(err, ReachabilityError::TargetCreation(_)));

    // A well-formed domain is fine.
    assert!(
        ctx.monitor_for_domain("example.com", MonitorOptions::default())
            .is_ok()
    );
}

#[test]
fn rejected_any_route_leaves_context_without_default_monitor() {
    let probe = MockProbe::rejecting_any_route();
    let ctx = ReachabilityContext::with_probe(Arc::new(probe));

    assert!(ctx.default_monitor().is_none());
    // Absence is permanent; asking again does not retry.
    assert!(ctx.default_monitor().is_none());

    // Other targets still work.
    let monitor = ctx
        .monitor_for_address("10.0.0.1:443".parse().unwrap(), MonitorOptions::default())
        .unwrap();
    assert_eq!(monitor.status(), Status::Unknown);
}

#[test]
fn dropping_a_monitor_releases_its_watch() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    {
        let monitor = ctx.monitor_for_any_route(MonitorOptions::default()).unwrap();
        monitor.start_monitoring();
        assert_eq!(probe.active_watches(), 1);
    }
    assert_eq!(probe.active_watches(), 0);

    // Late platform deliveries into the void must be harmless.
    probe.push(ReachabilityFlags::offline());
    ctx.dispatcher().flush();
}

#[test]
fn reset_returns_status_to_unknown_without_broadcast() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe.clone()));

    let monitor = ctx.monitor_for_any_route(MonitorOptions::default()).unwrap();
    let changes = watch_changes(&monitor);

    monitor.start_monitoring();
    changes.recv_timeout(RECV_TIMEOUT).expect("initial notification");

    monitor.reset();
    ctx.dispatcher().flush();

    assert!(!monitor.is_monitoring());
    assert_eq!(monitor.status(), Status::Unknown);
    assert_eq!(monitor.previous_status(), Status::Unknown);
    assert!(changes.try_recv().is_err(), "reset must not broadcast");
}

#[test]
fn monitor_exposes_its_configuration() {
    let probe = MockProbe::new(ReachabilityFlags::online());
    let ctx = ReachabilityContext::with_probe(Arc::new(probe));

    let options = MonitorOptions::advanced().with_platform(PlatformClass::Mobile);
    let monitor = ctx
        .monitor_for_domain("example.com", options)
        .unwrap();

    assert_eq!(
        *monitor.target(),
        ReachabilityTarget::Domain("example.com".to_string())
    );
    assert_eq!(monitor.mode(), InformationMode::Advanced);
    assert_eq!(monitor.platform_class(), PlatformClass::Mobile);
    assert!(!monitor.is_monitoring());
}
