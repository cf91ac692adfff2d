//! Network reachability monitoring.
//!
//! Reachline answers one question for an application: *what kind of network
//! do I have right now?* It keeps a small enum — not reachable, WiFi,
//! cellular, or just "reachable" — up to date by subscribing to the
//! platform's network-change notifications, and fans out every transition
//! through a closure, a signal, and a process-wide event hub channel.
//!
//! The library performs no network I/O of its own. Detecting what the
//! network can do is the platform's job; Reachline only classifies the
//! conditions the platform reports.
//!
//! # Getting started
//!
//! ```ignore
//! use reachline::{ReachabilityContext, REACHABILITY_CHANGED, STATUS_KEY};
//!
//! let ctx = ReachabilityContext::new();
//!
//! // Loosely coupled consumers listen on the hub.
//! let _sub = ctx.hub().subscribe_scoped(REACHABILITY_CHANGED, |payload| {
//!     if let Some(status) = payload.get(STATUS_KEY) {
//!         println!("connectivity: {status}");
//!     }
//! });
//!
//! // The default monitor watches the default route.
//! if let Some(monitor) = ctx.default_monitor() {
//!     monitor.start_monitoring();
//! }
//! ```
//!
//! # Monitors
//!
//! A [`ReachabilityMonitor`] watches one [`ReachabilityTarget`]: a domain
//! name, a socket address, or the default route. `start_monitoring` arms the
//! platform subscription and publishes one initial status; after that,
//! notifications fire only when the classified status actually changes.
//! Monitors are created through a [`ReachabilityContext`], which owns the
//! probe, the dispatch thread and the event hub.
//!
//! In [`InformationMode::Simple`] (the default) every reachable state
//! collapses to [`Status::Reachable`]; [`InformationMode::Advanced`]
//! distinguishes WiFi from cellular on mobile platforms.
//!
//! # Threading
//!
//! All status mutation and every notification runs on the context's
//! dispatch thread, in a single well-defined order. Platform callbacks may
//! arrive on any thread; they are re-dispatched before any state is touched.
//! `start_monitoring`/`stop_monitoring` never block.
//!
//! # Logging
//!
//! Instrumentation uses `tracing` under the `reachline::monitor`,
//! `reachline::probe` and `reachline::context` targets.

mod context;
mod error;
mod flags;
mod monitor;
pub mod probe;
mod target;

pub use context::ReachabilityContext;
pub use error::{ReachabilityError, Result};
pub use flags::{InformationMode, PlatformClass, ReachabilityFlags, Status, classify};
pub use monitor::{
    MonitorOptions, REACHABILITY_CHANGED, ReachabilityMonitor, STATUS_KEY, StatusChange,
};
pub use probe::{FlagSink, MonitorToken, ProbeHandle, ReachabilityProbe, SystemProbe, WatchGuard};
pub use target::ReachabilityTarget;

// Re-export the core primitives consumers interact with.
pub use reachline_core::{
    ConnectionGuard, ConnectionId, DispatchContext, EventHub, Payload, Signal, SubscriptionGuard,
    SubscriptionId,
};
