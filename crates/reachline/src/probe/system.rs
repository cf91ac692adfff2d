//! System-backed probe over interface enumeration and change watching.
//!
//! Flag synthesis stays within this library's remit: no sockets are opened
//! and no DNS queries are made. "Reachable" means the routing state makes the
//! target plausible, which is what the interface table can tell us:
//!
//! - loopback address targets are reachable as long as the host is up;
//! - everything else is reachable when at least one non-loopback interface
//!   is up and has an address assigned;
//! - traffic counts as cellular when the default interface looks like a
//!   WWAN device.

use std::sync::Arc;

use crate::error::{ReachabilityError, Result};
use crate::flags::ReachabilityFlags;
use crate::probe::{FlagSink, ProbeHandle, ReachabilityProbe, WatchGuard};
use crate::target::ReachabilityTarget;

/// Probe implementation backed by the operating system's interface table.
///
/// Change notifications come from the platform's native change mechanism
/// (via `netwatcher`); flag queries enumerate interfaces (via `netdev`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl SystemProbe {
    /// Create a system probe.
    pub fn new() -> Self {
        Self
    }
}

impl ReachabilityProbe for SystemProbe {
    fn bind(&self, target: &ReachabilityTarget) -> Result<Arc<dyn ProbeHandle>> {
        target.validate()?;
        tracing::debug!(target: "reachline::probe", %target, "bound system probe");
        Ok(Arc::new(SystemHandle {
            target: target.clone(),
        }))
    }
}

struct SystemHandle {
    target: ReachabilityTarget,
}

impl ProbeHandle for SystemHandle {
    fn flags(&self) -> ReachabilityFlags {
        snapshot_flags(&self.target)
    }

    fn watch(&self, sink: FlagSink) -> Result<Box<dyn WatchGuard>> {
        let target = self.target.clone();
        let handle = netwatcher::watch_interfaces(move |_update| {
            sink.deliver(snapshot_flags(&target));
        })
        .map_err(|e| ReachabilityError::Watch(e.to_string()))?;
        Ok(Box::new(handle))
    }
}

fn snapshot_flags(target: &ReachabilityTarget) -> ReachabilityFlags {
    match target {
        ReachabilityTarget::Address(addr) if addr.ip().is_loopback() => ReachabilityFlags::online(),
        _ => {
            if !check_online_state() {
                return ReachabilityFlags::offline();
            }
            if default_route_is_cellular() {
                ReachabilityFlags::cellular()
            } else {
                ReachabilityFlags::online()
            }
        }
    }
}

/// At least one non-loopback interface is up and has an address assigned.
fn check_online_state() -> bool {
    netdev::get_interfaces().iter().any(|iface| {
        iface.is_up()
            && !iface.is_loopback()
            && (!iface.ipv4.is_empty() || !iface.ipv6.is_empty())
    })
}

fn default_route_is_cellular() -> bool {
    netdev::get_default_interface()
        .map(|iface| looks_cellular(&iface.name))
        .unwrap_or(false)
}

/// Name-based WWAN heuristic; the interface table does not expose a cellular
/// bit on every platform.
fn looks_cellular(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    ["rmnet", "wwan", "pdp_ip", "ccmni", "cdc-wdm"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}
