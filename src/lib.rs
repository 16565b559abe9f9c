//! # FBP Runtime — Concurrent Messaging Core
//!
//! A small flow-based-programming runtime core: typed ports over bounded
//! message queues, a per-component execution lifecycle, a cross-component
//! wake/ordering protocol, and a network runtime that names, wires, and
//! starts/stops components.
//!
//! Concrete component implementations, host peripheral adapters, and a demo
//! CLI are external collaborators — this crate exposes only the library
//! surface a component author and an orchestrator need:
//!
//! - [`type_id`] — process-wide type identity without reflection.
//! - [`status`] — the `MessageStatus`/`Optional<T>` result carriers.
//! - [`notify`] — the per-component wake-target bitfield channel.
//! - [`queue`] — the bounded, type-erased `MessageQueue`.
//! - [`port`] — `InputPort`/`OutputPort` typed facades, `connect`, and the
//!   top-level `send_message` injection function.
//! - [`component`] — `ComponentLogic`, `ComponentBuilder`, and the
//!   `Component` lifecycle/execution context.
//! - [`runtime`] — the `Runtime` registry: factories, named instances,
//!   edges, initial messages, network start/stop.
//! - [`logging`] — opt-in colorized `tracing` output, never installed
//!   implicitly by library code.

pub mod component;
pub mod logging;
pub mod notify;
pub mod port;
pub mod queue;
pub mod runtime;
pub mod status;
pub mod type_id;

pub use component::{Component, ComponentBuilder, ComponentContext, ComponentLogic};
pub use port::{connect, send_message, InputPort, OutputPort};
pub use queue::MessageQueue;
pub use runtime::Runtime;
pub use status::{MessageStatus, Optional};
pub use type_id::{type_id, TypeId};

/// The current version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tunable constants called out by spec.md §6.
pub mod defaults {
    /// Producer retry window for [`crate::port::OutputPort::send`] and the
    /// top-level [`crate::port::send_message`]. Re-exported here so callers
    /// configuring a network don't need to reach into `port` for it.
    pub const MESSAGE_PUSH_ATTEMPT_TIMEOUT_MS: u64 =
        crate::port::MESSAGE_PUSH_ATTEMPT_TIMEOUT_MS;

    /// Default bounded queue capacity for an `InputPort` when a component
    /// author has no reason to pick a different one.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
}
