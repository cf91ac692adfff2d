//! Error types for reachability monitoring.

/// Result type alias for reachability operations.
pub type Result<T> = std::result::Result<T, ReachabilityError>;

/// Errors that can occur when setting up reachability monitoring.
///
/// Note that `start_monitoring`/`stop_monitoring` are best-effort and do not
/// return errors; only construction-time failures are surfaced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReachabilityError {
    /// The platform probe refused to create a handle for the target
    /// (malformed domain, invalid address). Not retried automatically.
    #[error("cannot create reachability target: {0}")]
    TargetCreation(String),

    /// The platform change watcher could not be started.
    #[error("watch error: {0}")]
    Watch(String),
}
