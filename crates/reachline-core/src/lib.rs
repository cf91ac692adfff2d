//! Core primitives for Reachline.
//!
//! This crate holds the application-infrastructure pieces the reachability
//! library is built on, kept separate so they can be reused by consumers:
//!
//! - [`Signal`] — signal/slot change notification
//! - [`EventHub`] — named-channel publish/subscribe with string-map payloads
//! - [`DispatchContext`] — a dedicated owner thread that serializes state
//!   mutation and callback delivery
//!
//! The threading model is deliberate: signals and hub publications run on the
//! thread that emits them, and anything that must be serialized is emitted
//! from a [`DispatchContext`] job. There is no hidden event loop.
//!
//! Instrumentation uses the `tracing` crate under the
//! `reachline_core::signal`, `reachline_core::hub` and
//! `reachline_core::dispatch` targets; install a subscriber (for example
//! `tracing_subscriber::fmt::init()`) to see it.

pub mod dispatch;
pub mod hub;
pub mod signal;

pub use dispatch::DispatchContext;
pub use hub::{EventHub, Payload, SubscriptionGuard, SubscriptionId};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
