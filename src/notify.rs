//! # Per-Component Wake-Target Notification Channel
//!
//! The source represents a component's execution-context handle as the
//! target of three distinct wake events: `ProcessStart`, `ProcessShutdown`,
//! and `MessageArrival`. Events don't queue — they accumulate as bits, and a
//! waiter can block for any subset of them at once. [`Notifier`] is that
//! channel: a bitfield guarded by a mutex/condvar pair, the same primitive
//! pairing `parking_lot` is already pinned for in the host `Cargo.toml`.
//!
//! Spurious wakes are permitted by design — waiters are expected to re-check
//! whatever condition they were actually waiting for (queue non-empty,
//! `should_run`) rather than trust that a wake implies their condition held.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Consumed once at context entry; latches the start of the component's
/// `run()` loop.
pub const PROCESS_START: u8 = 0b001;
/// Sticky; observed alongside the component's `should_run` flag.
pub const PROCESS_SHUTDOWN: u8 = 0b010;
/// Set by any successful push into a queue whose reader-target is this
/// context.
pub const MESSAGE_ARRIVAL: u8 = 0b100;

/// A bitfield wake channel shared between a component's execution context
/// and every queue/caller that needs to wake it.
#[derive(Debug, Default)]
pub struct Notifier {
    bits: Mutex<u8>,
    cv: Condvar,
}

impl Notifier {
    /// Creates a channel with no bits set.
    pub fn new() -> Self {
        Self {
            bits: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    /// Sets `bits` and wakes every waiter. Idempotent for bits already set.
    pub fn signal(&self, bits: u8) {
        let mut guard = self.bits.lock();
        *guard |= bits;
        self.cv.notify_all();
    }

    /// Blocks until at least one bit in `mask` is set, then clears the bits
    /// that were observed set (within `mask`) and returns them.
    pub fn wait_mask(&self, mask: u8) -> u8 {
        let mut guard = self.bits.lock();
        loop {
            let hit = *guard & mask;
            if hit != 0 {
                *guard &= !hit;
                return hit;
            }
            self.cv.wait(&mut guard);
        }
    }

    /// As [`Notifier::wait_mask`], but gives up after `timeout` and returns
    /// `0` if no bit in `mask` was observed set by then.
    pub fn wait_mask_timeout(&self, mask: u8, timeout: Duration) -> u8 {
        let mut guard = self.bits.lock();
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let hit = *guard & mask;
            if hit != 0 {
                *guard &= !hit;
                return hit;
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return 0;
            }
            let remaining = deadline - now;
            let timed_out = self.cv.wait_for(&mut guard, remaining).timed_out();
            if timed_out {
                let hit = *guard & mask;
                if hit != 0 {
                    *guard &= !hit;
                }
                return hit;
            }
        }
    }

    /// True if any bit in `mask` is currently set, without blocking or
    /// clearing anything.
    pub fn peek(&self, mask: u8) -> bool {
        (*self.bits.lock() & mask) != 0
    }
}
