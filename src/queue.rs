//! # MessageQueue — Bounded FIFO Transport
//!
//! The only cross-thread shared mutable state in the runtime. Storage is a
//! lock-free `crossbeam::queue::ArrayQueue`, which gives bounded push/pop
//! without a lock on the hot path. Blocking semantics (push waits for space,
//! `pop_blocking` waits for data) are layered on top of the same
//! [`Notifier`] bitfield channel the component wake protocol uses, rather
//! than a hand-rolled condvar pairing: a raw `Mutex<()>`/`Condvar` guarding
//! nothing but the ring's *externally observed* state is a lost-wakeup trap
//! — a push landing between the consumer's emptiness check and its `wait()`
//! call would notify a condvar nobody is blocked on yet. `Notifier` avoids
//! this because the wake bit itself, not the ring, is the thing the mutex
//! guards: a signal that arrives before `wait_mask` is called still leaves
//! the bit set for `wait_mask` to observe immediately.
//!
//! Elements are stored type-erased (`Box<dyn Any + Send>`) so a queue can
//! live in a non-generic `Component` port array; the single [`TypeId`]
//! recorded at construction is the compile-time witness checked by the
//! typed port facades in `port.rs` on every access.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::queue::ArrayQueue;

use crate::notify::{Notifier, MESSAGE_ARRIVAL};
use crate::type_id::TypeId;

/// A boxed, type-erased message. The concrete type is always the one
/// recorded as the owning queue's [`TypeId`].
pub type BoxedMessage = Box<dyn Any + Send>;

/// Wake bit for the queue's private "a slot just freed" notifier. Local to
/// each queue's own [`Notifier`] instance, so it need not (and does not)
/// share a numbering scheme with the cross-component bits in `notify.rs`.
const SLOT_FREED: u8 = 0b1;
/// Wake bit for the queue's private "a message just arrived" notifier, used
/// only by [`MessageQueue::pop_blocking`] (the typed port facades in
/// `port.rs` use `reader_wake`/`MESSAGE_ARRIVAL` directly instead).
const DATA_ARRIVED: u8 = 0b1;

/// Bounded FIFO of type-erased messages with a monotonic close flag and a
/// single reader wake-target.
pub struct MessageQueue {
    ring: ArrayQueue<BoxedMessage>,
    capacity: usize,
    closed: AtomicBool,
    type_id: TypeId,
    reader_wake: Arc<Notifier>,
    space_notifier: Notifier,
    data_notifier: Notifier,
}

impl MessageQueue {
    /// Creates a new queue of the given element type and capacity (must be
    /// at least 1), waking `reader_wake` on every successful push.
    pub fn new(type_id: TypeId, capacity: usize, reader_wake: Arc<Notifier>) -> Arc<Self> {
        assert!(capacity >= 1, "MessageQueue capacity must be >= 1");
        Arc::new(Self {
            ring: ArrayQueue::new(capacity),
            capacity,
            closed: AtomicBool::new(false),
            type_id,
            reader_wake,
            space_notifier: Notifier::new(),
            data_notifier: Notifier::new(),
        })
    }

    /// The element type this queue was constructed for.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The wake-target signaled on every successful push.
    pub fn reader_wake(&self) -> &Arc<Notifier> {
        &self.reader_wake
    }

    /// Attempts to enqueue `value`, blocking up to `timeout` for space.
    ///
    /// Returns `Ok(())` on success. Returns `Err(value)` — handing the
    /// message back to the caller — on timeout or if the queue is closed;
    /// a push observed against a closed queue returns immediately without
    /// blocking, per the documented close policy.
    pub fn push(&self, mut value: BoxedMessage, timeout: Duration) -> Result<(), BoxedMessage> {
        if self.closed.load(Ordering::Acquire) {
            return Err(value);
        }
        let deadline = Instant::now() + timeout;
        loop {
            match self.ring.push(value) {
                Ok(()) => {
                    self.data_notifier.signal(DATA_ARRIVED);
                    self.reader_wake.signal(MESSAGE_ARRIVAL);
                    return Ok(());
                }
                Err(returned) => value = returned,
            }

            if self.closed.load(Ordering::Acquire) {
                return Err(value);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(value);
            }
            let remaining = deadline.saturating_duration_since(now);
            // A signal set by `try_pop` any time before this call (even
            // before the failed push above) is still observed here: the
            // bit lives behind `Notifier`'s own mutex, not the ring, so
            // there is no window in which a wakeup can be lost.
            self.space_notifier.wait_mask_timeout(SLOT_FREED, remaining);
        }
    }

    /// Non-blocking dequeue. Returns `None` if the queue is currently empty.
    pub fn try_pop(&self) -> Option<BoxedMessage> {
        let item = self.ring.pop();
        if item.is_some() {
            self.space_notifier.signal(SLOT_FREED);
        }
        item
    }

    /// Blocks indefinitely until a message is available, then dequeues it.
    ///
    /// This is the low-level contract from the spec: it never fails in
    /// isolation. Callers outside this crate's own `receive`/`await`
    /// implementations (which cooperate with `should_run` and the wake
    /// channel) should prefer `has_message`/notifications to avoid blocking
    /// forever on a queue nobody will ever write to again.
    pub fn pop_blocking(&self) -> BoxedMessage {
        loop {
            if let Some(item) = self.try_pop() {
                return item;
            }
            self.data_notifier.wait_mask(DATA_ARRIVED);
        }
    }

    /// True if at least one message is currently queued.
    pub fn has_message(&self) -> bool {
        !self.ring.is_empty()
    }

    /// Current number of queued messages.
    pub fn message_count(&self) -> usize {
        self.ring.len()
    }

    /// The fixed capacity this queue was constructed with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once [`MessageQueue::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Marks the queue closed. Idempotent. Already-queued messages remain
    /// available to `try_pop`/`pop_blocking`; only future pushes are
    /// rejected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Wake anyone blocked on either condition so they can observe the
        // new closed state instead of waiting out their full timeout.
        self.space_notifier.signal(SLOT_FREED);
        self.data_notifier.signal(DATA_ARRIVED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn queue_of_u32(capacity: usize) -> (Arc<MessageQueue>, Arc<Notifier>) {
        let notifier = Arc::new(Notifier::new());
        let q = MessageQueue::new(TypeId::of::<u32>(), capacity, notifier.clone());
        (q, notifier)
    }

    #[test]
    fn respects_capacity_bounds() {
        let (q, _n) = queue_of_u32(2);
        assert_eq!(q.capacity(), 2);
        assert!(q.push(Box::new(1u32), Duration::from_millis(10)).is_ok());
        assert!(q.push(Box::new(2u32), Duration::from_millis(10)).is_ok());
        assert_eq!(q.message_count(), 2);
        // Third push blocks until the deadline then returns the value back.
        let res = q.push(Box::new(3u32), Duration::from_millis(20));
        assert!(res.is_err());
        assert_eq!(q.message_count(), 2);
    }

    #[test]
    fn fifo_ordering_is_preserved() {
        let (q, _n) = queue_of_u32(4);
        for v in 0u32..4 {
            q.push(Box::new(v), Duration::from_millis(10)).unwrap();
        }
        for expected in 0u32..4 {
            let got = *q.try_pop().unwrap().downcast::<u32>().unwrap();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn push_signals_reader_wake() {
        let (q, n) = queue_of_u32(1);
        q.push(Box::new(7u32), Duration::from_millis(10)).unwrap();
        assert_eq!(n.wait_mask(MESSAGE_ARRIVAL), MESSAGE_ARRIVAL);
    }

    #[test]
    fn push_after_close_fails_without_blocking() {
        let (q, _n) = queue_of_u32(2);
        q.close();
        let start = Instant::now();
        let res = q.push(Box::new(1u32), Duration::from_secs(5));
        assert!(res.is_err());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn close_is_idempotent_and_preserves_queued_messages() {
        let (q, _n) = queue_of_u32(4);
        q.push(Box::new(1u32), Duration::from_millis(10)).unwrap();
        q.close();
        q.close();
        assert!(q.is_closed());
        assert_eq!(q.message_count(), 1);
        let got = *q.try_pop().unwrap().downcast::<u32>().unwrap();
        assert_eq!(got, 1);
    }

    #[test]
    fn pop_blocking_waits_for_a_push_that_lands_after_the_check() {
        let (q, _n) = queue_of_u32(1);
        let q2 = q.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            q2.push(Box::new(9u32), Duration::from_millis(100)).unwrap();
        });

        // Enters pop_blocking while the queue is still empty; must not miss
        // the push that happens 30ms later on the other thread.
        let got = *q.pop_blocking().downcast::<u32>().unwrap();
        assert_eq!(got, 9);
        handle.join().unwrap();
    }

    #[test]
    fn second_push_blocks_until_consumer_pops_capacity_one() {
        let (q, _n) = queue_of_u32(1);
        q.push(Box::new(1u32), Duration::from_millis(10)).unwrap();

        let q2 = q.clone();
        let popped_at = Arc::new(AtomicUsize::new(0));
        let popped_at2 = popped_at.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            popped_at2.store(1, Ordering::SeqCst);
            q2.try_pop();
        });

        let start = Instant::now();
        let res = q.push(Box::new(2u32), Duration::from_millis(500));
        assert!(res.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(popped_at.load(Ordering::SeqCst), 1);
        handle.join().unwrap();
    }
}
