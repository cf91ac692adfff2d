//! Reachability flag model and flag-to-status classification.
//!
//! The platform probe reports raw conditions as a [`ReachabilityFlags`] set;
//! [`classify`] is the total decision table that turns a flag set into a
//! [`Status`] given the monitor's [`InformationMode`] and the
//! [`PlatformClass`] it runs on.

use std::fmt;

/// Raw reachability conditions reported by the platform probe.
///
/// All fields default to `false`; a probe only sets what it can observe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReachabilityFlags {
    /// The target is reachable with the current network configuration.
    pub reachable: bool,
    /// A connection must be established first (e.g. dial-up, VPN, captive
    /// portal).
    pub connection_required: bool,
    /// The required connection will be established on demand.
    pub connection_on_demand: bool,
    /// The required connection will be established when traffic is sent.
    pub connection_on_traffic: bool,
    /// Establishing the connection needs user intervention.
    pub intervention_required: bool,
    /// Traffic to the target goes over a cellular interface.
    pub is_cellular: bool,
}

impl ReachabilityFlags {
    /// Flags for a plainly reachable target, no connection setup needed.
    pub fn online() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    /// Flags for a reachable target routed over cellular.
    pub fn cellular() -> Self {
        Self {
            reachable: true,
            is_cellular: true,
            ..Self::default()
        }
    }

    /// Flags for an unreachable target.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Whether the target can actually be used: reachable, and either no
    /// connection setup is needed or it happens without user intervention.
    pub fn is_usable(&self) -> bool {
        let auto_connectable = self.connection_on_demand || self.connection_on_traffic;
        let silently_connectable = auto_connectable && !self.intervention_required;
        self.reachable && (!self.connection_required || silently_connectable)
    }
}

/// Semantic connectivity status of a monitored target.
///
/// `Unknown` is the initial value of every monitor and is only re-entered
/// through an explicit reset; [`classify`] never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// No observation has been made yet.
    Unknown,
    /// The target is not usable with the current network configuration.
    NotReachable,
    /// Reachable over a cellular interface (Advanced mode, mobile platforms).
    ReachableViaCellular,
    /// Reachable over WiFi or an equivalent non-cellular interface.
    ReachableViaWiFi,
    /// Reachable; Simple mode does not distinguish the interface kind.
    Reachable,
}

impl Status {
    /// Whether this status represents any kind of reachability.
    pub fn is_reachable(self) -> bool {
        matches!(
            self,
            Status::Reachable | Status::ReachableViaCellular | Status::ReachableViaWiFi
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unknown => write!(f, "Unknown"),
            Status::NotReachable => write!(f, "Not Reachable"),
            Status::ReachableViaCellular => write!(f, "Reachable Via Cellular"),
            Status::ReachableViaWiFi => write!(f, "Reachable Via WiFi"),
            Status::Reachable => write!(f, "Reachable"),
        }
    }
}

/// How much detail a monitor reports about reachable states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InformationMode {
    /// Collapse every reachable state into [`Status::Reachable`].
    #[default]
    Simple,
    /// Distinguish WiFi from cellular. The distinction only exists on
    /// [`PlatformClass::Mobile`]; elsewhere Advanced always reports WiFi.
    Advanced,
}

/// Coarse platform category, deciding whether "cellular" is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformClass {
    /// Phone-class platform with cellular interfaces.
    Mobile,
    /// Everything else; cellular classification does not apply.
    Desktop,
}

impl PlatformClass {
    /// The platform class of the compile target.
    pub fn current() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            PlatformClass::Mobile
        } else {
            PlatformClass::Desktop
        }
    }
}

/// Map a flag set to a status. Total over its input domain; never returns
/// [`Status::Unknown`].
pub fn classify(flags: ReachabilityFlags, mode: InformationMode, platform: PlatformClass) -> Status {
    if !flags.is_usable() {
        return Status::NotReachable;
    }
    match mode {
        InformationMode::Simple => Status::Reachable,
        InformationMode::Advanced => {
            if flags.is_cellular && platform == PlatformClass::Mobile {
                Status::ReachableViaCellular
            } else {
                Status::ReachableViaWiFi
            }
        }
    }
}
