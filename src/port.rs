//! # Typed Port Facades
//!
//! A [`Port`] is the common, type-erased attachment point a component owns:
//! a parent reference, an immutable [`TypeId`], and an optional shared handle
//! to a [`MessageQueue`]. [`InputPort`] and [`OutputPort`] wrap it with the
//! typed `receive`/`send` operations components actually call; the base
//! forwards observational queries (`has_message`, `capacity`, ...) straight
//! to the attached queue, or reports the documented disconnected defaults
//! when there is none.
//!
//! The disconnected-output behavior is load-bearing, not an oversight:
//! `send` on a port with no queue attached returns `Okay` and does nothing.
//! Components can always write their outputs; a network that never wired a
//! consumer for one of them is not a runtime error.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::notify::{Notifier, MESSAGE_ARRIVAL, PROCESS_SHUTDOWN};
use crate::queue::MessageQueue;
use crate::status::{MessageStatus, Optional};
use crate::type_id::{type_id, TypeId};

/// Producer retry window for [`OutputPort::send`]. A send re-attempts the
/// push in chunks of this size so it can observe `should_run` flipping to
/// false without waiting out an unbounded timeout.
pub const MESSAGE_PUSH_ATTEMPT_TIMEOUT_MS: u64 = 100;

/// Shared base behind [`InputPort`] and [`OutputPort`]: a type witness plus
/// an optional queue handle.
pub struct Port {
    type_id: TypeId,
    queue: Option<Arc<MessageQueue>>,
}

impl Port {
    fn disconnected(type_id: TypeId) -> Self {
        Self {
            type_id,
            queue: None,
        }
    }

    fn attached(type_id: TypeId, queue: Arc<MessageQueue>) -> Self {
        Self {
            type_id,
            queue: Some(queue),
        }
    }

    /// The type this port was declared with.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// True if a message is currently queued. `false` when unattached.
    pub fn has_message(&self) -> bool {
        match &self.queue {
            Some(q) => q.has_message(),
            None => false,
        }
    }

    /// Number of queued messages. `0` when unattached.
    pub fn message_count(&self) -> usize {
        self.queue.as_ref().map_or(0, |q| q.message_count())
    }

    /// Configured capacity. `0` when unattached.
    pub fn capacity(&self) -> usize {
        self.queue.as_ref().map_or(0, |q| q.capacity())
    }

    /// True when unattached, or when the attached queue has been closed.
    pub fn is_closed(&self) -> bool {
        match &self.queue {
            Some(q) => q.is_closed(),
            None => true,
        }
    }

    /// Closes the attached queue. No-op when unattached.
    pub fn close(&self) {
        if let Some(q) = &self.queue {
            q.close();
        }
    }

    fn queue(&self) -> Option<&Arc<MessageQueue>> {
        self.queue.as_ref()
    }
}

/// An input port: creates its own queue at construction and is the sole
/// reader of it.
pub struct InputPort {
    base: Port,
}

impl InputPort {
    /// Declares an input port of type `T` with the given queue `capacity`,
    /// registering `reader_wake` as the queue's consumer wake-target.
    pub fn new<T: 'static>(capacity: usize, reader_wake: Arc<Notifier>) -> Self {
        let type_id = type_id::<T>();
        let queue = MessageQueue::new(type_id, capacity, reader_wake);
        Self {
            base: Port::attached(type_id, queue),
        }
    }

    /// Shared access to the underlying base port (for observational calls
    /// shared with [`OutputPort`]).
    pub fn base(&self) -> &Port {
        &self.base
    }

    /// The queue this input port owns. Exposed so [`crate::port::connect`]
    /// can bind an output to it.
    pub fn queue(&self) -> &Arc<MessageQueue> {
        self.base
            .queue()
            .expect("InputPort always owns a queue from construction")
    }

    /// Blocking typed receive.
    ///
    /// Returns `TypeMismatch` immediately if `T` disagrees with the port's
    /// declared type. Otherwise loops: returns `Terminated` as soon as
    /// `should_run` reads false, pops and returns `Okay` if a message is
    /// already queued, or blocks on `MessageArrival`/`ProcessShutdown` and
    /// re-checks. `ProcessShutdown` must be in the wait mask alongside
    /// `MessageArrival`: `stop_process` only signals the former, and a
    /// receiver blocked with no message ever arriving again would otherwise
    /// never wake to observe `should_run` flipping false.
    pub fn receive<T: 'static>(&self, should_run: &std::sync::atomic::AtomicBool) -> Optional<T> {
        if type_id::<T>() != self.base.type_id {
            return Optional::failed(MessageStatus::TypeMismatch);
        }
        let queue = self.queue();
        loop {
            if !should_run.load(Ordering::Acquire) {
                return Optional::failed(MessageStatus::Terminated);
            }
            if let Some(boxed) = queue.try_pop() {
                let value = *boxed
                    .downcast::<T>()
                    .expect("queue element type disagreed with its recorded TypeId witness");
                return Optional::ok(value);
            }
            queue
                .reader_wake()
                .wait_mask(MESSAGE_ARRIVAL | PROCESS_SHUTDOWN);
        }
    }
}

impl Drop for InputPort {
    fn drop(&mut self) {
        self.base.close();
    }
}

/// An output port: unattached until [`connect`] binds it to an `InputPort`'s
/// queue. An output may be connected to at most one input at a time.
pub struct OutputPort {
    base: Port,
}

impl OutputPort {
    /// Declares an unconnected output port of type `T`.
    pub fn new<T: 'static>() -> Self {
        Self {
            base: Port::disconnected(type_id::<T>()),
        }
    }

    /// Shared access to the underlying base port.
    pub fn base(&self) -> &Port {
        &self.base
    }

    fn queue(&self) -> Option<&Arc<MessageQueue>> {
        self.base.queue()
    }

    fn set_queue(&mut self, queue: Arc<MessageQueue>) {
        self.base.queue = Some(queue);
    }

    /// Blocking typed send.
    ///
    /// Returns `TypeMismatch` immediately if `T` disagrees with the port's
    /// declared type. If unconnected, silently discards and returns `Okay`
    /// per the documented disconnected-output contract. Otherwise retries
    /// pushing in [`MESSAGE_PUSH_ATTEMPT_TIMEOUT_MS`] windows until it
    /// succeeds (`Okay`), `should_run` flips false, or the downstream queue
    /// closes out from under it (e.g. its `InputPort` was dropped via
    /// `Runtime::remove_node` on just the consumer) — either ends the send
    /// with `Terminated`. Checking `is_closed` here matters: once closed,
    /// `MessageQueue::push` returns instantly without blocking, so without
    /// this check the loop would spin at full CPU forever instead of
    /// observing termination.
    pub fn send<T: Send + 'static>(
        &self,
        value: T,
        should_run: &std::sync::atomic::AtomicBool,
    ) -> MessageStatus {
        if type_id::<T>() != self.base.type_id {
            return MessageStatus::TypeMismatch;
        }
        let Some(queue) = self.queue() else {
            trace!("send on unconnected output port: silent discard");
            return MessageStatus::Okay;
        };
        let mut boxed: crate::queue::BoxedMessage = Box::new(value);
        let attempt = Duration::from_millis(MESSAGE_PUSH_ATTEMPT_TIMEOUT_MS);
        while should_run.load(Ordering::Acquire) && !queue.is_closed() {
            match queue.push(boxed, attempt) {
                Ok(()) => return MessageStatus::Okay,
                Err(returned) => boxed = returned,
            }
        }
        MessageStatus::Terminated
    }
}

/// Binds `out`'s queue reference to `in_port`'s queue.
///
/// Checks, in order: matching [`TypeId`], and that `out` and `in_port`
/// belong to different components (self-loops on a single cooperative
/// scheduler trivially deadlock and are rejected). On any mismatch this is
/// a silent no-op: `out` remains unconnected, matching the `add_edge`
/// policy documented on [`crate::runtime::Runtime`].
pub fn connect(out: &mut OutputPort, in_port: &InputPort, same_parent: bool) -> bool {
    connect_to_queue(out, in_port.base.type_id, in_port.queue().clone(), same_parent)
}

/// As [`connect`], but takes the target's type and queue directly rather
/// than a borrowed `InputPort`.
///
/// This is the shape [`crate::runtime::Runtime::add_edge`] actually needs:
/// the source and target components usually live in the same
/// `HashMap<String, Component>`, so borrowing one component mutably (the
/// output side) and another immutably (the input side) at once is not
/// possible through the map's own API. Cloning the target's queue handle
/// out first (an `Arc` clone) breaks that aliasing before the mutable
/// borrow of the source component is taken.
pub fn connect_to_queue(
    out: &mut OutputPort,
    target_type: TypeId,
    target_queue: Arc<MessageQueue>,
    same_parent: bool,
) -> bool {
    if same_parent {
        return false;
    }
    if out.base.type_id != target_type {
        return false;
    }
    out.set_queue(target_queue);
    true
}

/// External injection: sends `value` on `input_port`'s queue directly,
/// distinct from [`OutputPort::send`] because it observes only the
/// *receiver's* closed state, never a sender's `should_run`.
///
/// Used by the orchestrator to deliver initial/configuration messages
/// before or during network execution. Retries until the queue closes
/// (`Terminated`) or the push succeeds (`Okay`); `TypeMismatch` on type
/// disagreement.
pub fn send_message<T: Send + 'static>(input_port: &InputPort, value: T) -> MessageStatus {
    if type_id::<T>() != input_port.base.type_id {
        return MessageStatus::TypeMismatch;
    }
    let queue = input_port.queue();
    let mut boxed: crate::queue::BoxedMessage = Box::new(value);
    let attempt = Duration::from_millis(MESSAGE_PUSH_ATTEMPT_TIMEOUT_MS);
    loop {
        if queue.is_closed() {
            return MessageStatus::Terminated;
        }
        match queue.push(boxed, attempt) {
            Ok(()) => return MessageStatus::Okay,
            Err(returned) => boxed = returned,
        }
    }
}
