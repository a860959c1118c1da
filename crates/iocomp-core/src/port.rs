//! Completion port abstraction.
//!
//! The port is the native primitive the loop waits on, and the only place
//! where other threads may hand results to the loop. Producers post
//! events from anywhere; the loop thread alone polls them and turns them
//! into pending-queue insertions.
//!
//! # Implementors
//!
//! - `QueuePort` (iocomp-module): bounded lock-free MPSC queue plus a
//!   `Notifier` for blocking waits. Portable, in-process.

use std::time::Duration;

use crate::codes::Win32Error;
use crate::error::Result;
use crate::request::ReqId;
use crate::status::NtStatus;

/// One retrieved completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    /// Bytes transferred by the operation.
    pub bytes: u32,
    /// Per-association completion key.
    pub key: usize,
    /// The request this completion belongs to.
    pub req: ReqId,
    /// Final status, or `None` if it was recorded on the request before
    /// posting (synthetic completions).
    pub status: Option<NtStatus>,
}

impl CompletionEvent {
    /// Zero-byte, zero-key event for a request whose status is already set.
    #[inline]
    pub const fn synthetic(req: ReqId) -> Self {
        Self { bytes: 0, key: 0, req, status: None }
    }

    /// Event for a finished operation with its status.
    #[inline]
    pub const fn completed(req: ReqId, status: NtStatus, bytes: u32) -> Self {
        Self { bytes, key: 0, req, status: Some(status) }
    }
}

/// Cross-thread sending half of a port.
pub trait CompletionPoster: Send + Sync {
    /// Queue one event. Never blocks.
    ///
    /// Fails with the platform error when the port cannot accept it.
    fn post(&self, event: CompletionEvent) -> std::result::Result<(), Win32Error>;
}

/// The loop's completion port.
///
/// **Contract:**
/// - `post()` never blocks and may be called from any thread through a
///   poster.
/// - `poll()` is called only from the loop thread.
pub trait CompletionPort {
    /// Queue one event from the loop thread.
    fn post(&self, event: CompletionEvent) -> std::result::Result<(), Win32Error>;

    /// Move up to `max` events into `out`.
    ///
    /// `timeout`: `None` blocks until at least one event arrives,
    /// `Some(Duration::ZERO)` never blocks. Returns the number appended.
    fn poll(
        &self,
        out: &mut Vec<CompletionEvent>,
        max: usize,
        timeout: Option<Duration>,
    ) -> Result<usize>;

    /// A sender other threads can use.
    fn poster(&self) -> Box<dyn CompletionPoster>;

    /// Events queued and not yet polled (approximate).
    fn queued(&self) -> usize;
}

/// Wakes a thread blocked in `CompletionPort::poll`.
///
/// **Contract:**
/// - `notify()` never blocks.
/// - Several `notify()` calls before a `wait()` coalesce into one wakeup.
pub trait Notifier: Send + Sync {
    /// Signal that events are available.
    fn notify(&self) -> Result<()>;

    /// Block until notified or `timeout` elapses. `None` waits forever.
    ///
    /// Returns `true` if a notification was consumed.
    fn wait(&self, timeout: Option<Duration>) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::STATUS_SUCCESS;

    #[test]
    fn synthetic_event_shape() {
        let e = CompletionEvent::synthetic(ReqId::new(3));
        assert_eq!(e.bytes, 0);
        assert_eq!(e.key, 0);
        assert_eq!(e.status, None);
    }

    #[test]
    fn completed_event_carries_status() {
        let e = CompletionEvent::completed(ReqId::new(1), STATUS_SUCCESS, 128);
        assert_eq!(e.status, Some(STATUS_SUCCESS));
        assert_eq!(e.bytes, 128);
    }
}
