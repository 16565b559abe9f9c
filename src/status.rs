//! # Message Status and the `Optional<T>` Result Carrier
//!
//! Every send/receive in the core returns a status instead of unwinding.
//! Components run on independent OS threads; letting a panic cross that
//! boundary would take down an unrelated thread's stack for no benefit, so
//! the public API surfaces outcomes as values ([`MessageStatus`]) the caller
//! is expected to check, the same posture the teacher's IPC transports take
//! toward read/write failures.

use std::fmt;

/// Outcome of a single send or receive attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    /// The operation completed and produced/consumed a value.
    Okay,
    /// The caller's type parameter does not match the port's declared type.
    TypeMismatch,
    /// The operation unblocked because the component (or queue) is shutting
    /// down rather than because it completed normally.
    Terminated,
    /// Reserved for future internal failures. Unused by the current core.
    Error,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageStatus::Okay => "okay",
            MessageStatus::TypeMismatch => "type mismatch",
            MessageStatus::Terminated => "terminated",
            MessageStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Carries either a value with [`MessageStatus::Okay`], or no value with one
/// of the failure statuses.
///
/// Converting an `Optional` with a non-`Okay` status to its payload is a
/// logic error on the caller's part; use [`Optional::into_result`] or check
/// [`Optional::status`] first rather than assuming a value is present.
#[derive(Clone, Debug)]
pub struct Optional<T> {
    value: Option<T>,
    status: MessageStatus,
}

impl<T> Optional<T> {
    /// A successful result carrying `value`.
    pub fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            status: MessageStatus::Okay,
        }
    }

    /// A failed result with the given non-`Okay` status.
    ///
    /// # Panics
    /// Panics in debug builds if `status` is [`MessageStatus::Okay`] — a
    /// successful result must carry a value via [`Optional::ok`].
    pub fn failed(status: MessageStatus) -> Self {
        debug_assert_ne!(
            status,
            MessageStatus::Okay,
            "Optional::failed called with Okay status; use Optional::ok"
        );
        Self {
            value: None,
            status,
        }
    }

    /// The status of this result.
    pub fn status(&self) -> MessageStatus {
        self.status
    }

    /// True if this result carries a value.
    pub fn is_ok(&self) -> bool {
        self.status == MessageStatus::Okay
    }

    /// Consumes `self`, returning `Ok(value)` on success or `Err(status)`.
    pub fn into_result(self) -> Result<T, MessageStatus> {
        match self.value {
            Some(v) if self.status == MessageStatus::Okay => Ok(v),
            _ => Err(self.status),
        }
    }

    /// Consumes `self`, discarding the status and returning the value if
    /// present. Prefer [`Optional::into_result`] when the status matters.
    pub fn value(self) -> Option<T> {
        self.value
    }
}
