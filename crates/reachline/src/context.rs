//! Application-level reachability context.

use std::net::SocketAddr;
use std::sync::Arc;

use reachline_core::{DispatchContext, EventHub};

use crate::error::Result;
use crate::monitor::{MonitorOptions, ReachabilityMonitor};
use crate::probe::{ReachabilityProbe, SystemProbe};
use crate::target::ReachabilityTarget;

/// Owns the pieces reachability monitoring needs: the probe, the dispatch
/// context, the event hub, and an optional default any-route monitor.
///
/// Construct one at application startup and hand it (or its hub/dispatcher
/// handles) to the consumers that need connectivity state; there is no
/// global instance.
///
/// The default monitor is bound once during construction. If the probe
/// refuses the any-route target, the context simply has no default monitor,
/// permanently; [`default_monitor`](Self::default_monitor) returning `None`
/// is a valid, checkable outcome and nothing is retried. Additional monitors
/// can be created at any time through the factory methods.
///
/// # Example
///
/// ```ignore
/// use reachline::ReachabilityContext;
///
/// let ctx = ReachabilityContext::new();
/// match ctx.default_monitor() {
///     Some(monitor) => monitor.start_monitoring(),
///     None => println!("connectivity state unavailable, treating as Unknown"),
/// }
/// ```
pub struct ReachabilityContext {
    default_monitor: Option<ReachabilityMonitor>,
    probe: Arc<dyn ReachabilityProbe>,
    dispatcher: Arc<DispatchContext>,
    hub: EventHub,
}

impl Default for ReachabilityContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachabilityContext {
    /// Build a context over the system probe.
    pub fn new() -> Self {
        Self::with_probe(Arc::new(SystemProbe::new()))
    }

    /// Build a context over an injected probe (tests, simulations).
    pub fn with_probe(probe: Arc<dyn ReachabilityProbe>) -> Self {
        let dispatcher = Arc::new(DispatchContext::new());
        let hub = EventHub::new();

        let default_monitor = match ReachabilityMonitor::new(
            ReachabilityTarget::AnyRoute,
            MonitorOptions::default(),
            probe.as_ref(),
            dispatcher.clone(),
            hub.clone(),
        ) {
            Ok(monitor) => Some(monitor),
            Err(e) => {
                tracing::warn!(
                    target: "reachline::context",
                    error = %e,
                    "default monitor unavailable"
                );
                None
            }
        };

        Self {
            default_monitor,
            probe,
            dispatcher,
            hub,
        }
    }

    /// The default any-route monitor, if the probe accepted it.
    pub fn default_monitor(&self) -> Option<&ReachabilityMonitor> {
        self.default_monitor.as_ref()
    }

    /// Create a monitor for an arbitrary target.
    pub fn monitor(
        &self,
        target: ReachabilityTarget,
        options: MonitorOptions,
    ) -> Result<ReachabilityMonitor> {
        ReachabilityMonitor::new(
            target,
            options,
            self.probe.as_ref(),
            self.dispatcher.clone(),
            self.hub.clone(),
        )
    }

    /// Create a monitor for a domain name.
    pub fn monitor_for_domain(
        &self,
        domain: impl Into<String>,
        options: MonitorOptions,
    ) -> Result<ReachabilityMonitor> {
        self.monitor(ReachabilityTarget::Domain(domain.into()), options)
    }

    /// Create a monitor for a socket address.
    pub fn monitor_for_address(
        &self,
        address: SocketAddr,
        options: MonitorOptions,
    ) -> Result<ReachabilityMonitor> {
        self.monitor(ReachabilityTarget::Address(address), options)
    }

    /// Create a monitor for the default route.
    pub fn monitor_for_any_route(&self, options: MonitorOptions) -> Result<ReachabilityMonitor> {
        self.monitor(ReachabilityTarget::AnyRoute, options)
    }

    /// The dispatch context notifications are delivered on.
    pub fn dispatcher(&self) -> &Arc<DispatchContext> {
        &self.dispatcher
    }

    /// The event hub status changes are published on.
    pub fn hub(&self) -> &EventHub {
        &self.hub
    }
}
