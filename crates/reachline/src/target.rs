//! Reachability targets.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::error::{ReachabilityError, Result};

/// What a monitor watches. Immutable once the monitor is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReachabilityTarget {
    /// A host identified by domain name. No DNS lookup is performed by this
    /// library; the name only identifies the target to the platform probe.
    Domain(String),
    /// A host identified by socket address.
    Address(SocketAddr),
    /// The default route: "is any network available at all".
    AnyRoute,
}

impl ReachabilityTarget {
    /// The zero socket address used to express the any-route target where a
    /// concrete address is required.
    pub fn zero_address() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
    }

    /// Check that the target is well-formed.
    ///
    /// Probes call this when binding; a malformed domain yields
    /// [`ReachabilityError::TargetCreation`] and no monitor is produced.
    pub fn validate(&self) -> Result<()> {
        match self {
            ReachabilityTarget::Domain(name) => validate_domain(name),
            ReachabilityTarget::Address(_) | ReachabilityTarget::AnyRoute => Ok(()),
        }
    }
}

impl fmt::Display for ReachabilityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReachabilityTarget::Domain(name) => write!(f, "domain {name}"),
            ReachabilityTarget::Address(addr) => write!(f, "address {addr}"),
            ReachabilityTarget::AnyRoute => write!(f, "any route"),
        }
    }
}

/// Syntactic hostname validation: dot-separated labels of alphanumerics and
/// hyphens, no label starting or ending with a hyphen, RFC length limits.
fn validate_domain(name: &str) -> Result<()> {
    let malformed = |reason: &str| {
        Err(ReachabilityError::TargetCreation(format!(
            "malformed domain {name:?}: {reason}"
        )))
    };

    if name.is_empty() {
        return malformed("empty name");
    }
    if name.len() > 253 {
        return malformed("name longer than 253 characters");
    }
    for label in name.split('.') {
        if label.is_empty() {
            return malformed("empty label");
        }
        if label.len() > 63 {
            return malformed("label longer than 63 characters");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return malformed("label starts or ends with a hyphen");
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return malformed("label contains invalid characters");
        }
    }
    Ok(())
}
