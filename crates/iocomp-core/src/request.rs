//! Request records.
//!
//! A `Request` is the bookkeeping for one in-flight or completed
//! asynchronous operation. It carries the status codec's single field,
//! the pending-queue link, and a non-owning reference to its handle.
//!
//! The payload type `C` is whatever the owning loop stores alongside the
//! record (usually the completion callback). Core code never looks at it.

use core::fmt;

use crate::activity::HandleId;
use crate::codes::{Win32Error, WsaError};
use crate::status::{NtStatus, STATUS_PENDING, STATUS_SUCCESS};

/// Identifier of a request: slot index plus the slot's generation.
///
/// The generation advances every time the slot is freed, so an id that
/// outlived its request never resolves to the slot's next occupant.
/// Index `u32::MAX` is reserved as the "no request" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReqId {
    index: u32,
    gen: u32,
}

impl ReqId {
    pub const NONE: ReqId = ReqId { index: u32::MAX, gen: 0 };

    /// Id of a slot's first occupant (generation 0).
    #[inline]
    pub const fn new(index: u32) -> Self {
        ReqId { index, gen: 0 }
    }

    #[inline]
    pub const fn with_gen(index: u32, gen: u32) -> Self {
        ReqId { index, gen }
    }

    /// Slot index.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.gen
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.index == u32::MAX
    }

    /// Pack into a completion key / user-data word: generation in the
    /// high half, index in the low half.
    #[inline]
    pub const fn to_token(self) -> u64 {
        ((self.gen as u64) << 32) | self.index as u64
    }

    #[inline]
    pub const fn from_token(token: u64) -> Self {
        ReqId { index: token as u32, gen: (token >> 32) as u32 }
    }
}

impl fmt::Debug for ReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "ReqId(NONE)")
        } else if self.gen == 0 {
            write!(f, "ReqId({})", self.index)
        } else {
            write!(f, "ReqId({}@{})", self.index, self.gen)
        }
    }
}

impl fmt::Display for ReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gen == 0 {
            write!(f, "req#{}", self.index)
        } else {
            write!(f, "req#{}.{}", self.index, self.gen)
        }
    }
}

/// What kind of operation a request tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReqKind {
    Read = 0,
    Write = 1,
    Accept = 2,
    Connect = 3,
    Shutdown = 4,
    Poll = 5,
    /// Cross-thread wakeup; no I/O behind it.
    Wakeup = 6,
    Custom = 7,
}

/// One asynchronous operation.
pub struct Request<C = ()> {
    status: NtStatus,
    pub(crate) next: Option<ReqId>,
    handle: HandleId,
    kind: ReqKind,
    bytes: u32,
    registered: bool,
    payload: Option<C>,
}

impl<C> Request<C> {
    /// Fresh request. The status reads as pending until a completion
    /// records the real one.
    pub fn new(handle: HandleId, kind: ReqKind) -> Self {
        Self {
            status: STATUS_PENDING,
            next: None,
            handle,
            kind,
            bytes: 0,
            registered: false,
            payload: None,
        }
    }

    pub fn with_payload(handle: HandleId, kind: ReqKind, payload: C) -> Self {
        let mut req = Self::new(handle, kind);
        req.payload = Some(payload);
        req
    }

    // ── Status codec ──

    /// Store a native status. Overwrites; one call per completion.
    #[inline]
    pub fn set_status(&mut self, status: NtStatus) {
        self.status = status;
    }

    #[inline]
    pub fn set_error(&mut self, err: Win32Error) {
        self.set_status(NtStatus::from_win32(err));
    }

    #[inline]
    pub fn set_success(&mut self) {
        self.set_status(STATUS_SUCCESS);
    }

    #[inline]
    pub fn status(&self) -> NtStatus {
        self.status
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[inline]
    pub fn error(&self) -> Win32Error {
        self.status.to_win32()
    }

    #[inline]
    pub fn socket_error(&self) -> WsaError {
        self.status.to_winsock()
    }

    // ── Bookkeeping ──

    #[inline]
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    #[inline]
    pub fn kind(&self) -> ReqKind {
        self.kind
    }

    #[inline]
    pub fn bytes(&self) -> u32 {
        self.bytes
    }

    #[inline]
    pub fn set_bytes(&mut self, bytes: u32) {
        self.bytes = bytes;
    }

    /// Whether the request is currently counted against its handle.
    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    #[inline]
    pub fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    /// Current queue link. Only meaningful while linked.
    #[inline]
    pub fn next(&self) -> Option<ReqId> {
        self.next
    }

    pub fn payload(&self) -> Option<&C> {
        self.payload.as_ref()
    }

    pub fn take_payload(&mut self) -> Option<C> {
        self.payload.take()
    }

    pub fn set_payload(&mut self, payload: C) {
        self.payload = Some(payload);
    }
}

impl<C> fmt::Debug for Request<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("handle", &self.handle)
            .field("status", &self.status)
            .field("bytes", &self.bytes)
            .field("registered", &self.registered)
            .field("next", &self.next)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::*;
    use crate::status::*;

    fn req() -> Request {
        Request::new(HandleId::new(0), ReqKind::Read)
    }

    #[test]
    fn new_request_is_pending_and_unlinked() {
        let r = req();
        assert_eq!(r.status(), STATUS_PENDING);
        assert!(r.next().is_none());
        assert!(!r.is_registered());
    }

    #[test]
    fn set_success_then_is_success() {
        let mut r = req();
        r.set_error(ERROR_ACCESS_DENIED);
        r.set_success();
        assert!(r.is_success());
        assert_eq!(r.error(), ERROR_SUCCESS);
    }

    #[test]
    fn set_error_is_failure_and_round_trips() {
        let mut r = req();
        for code in [1u32, 5, 6, 64, 995, 997, 10054, 0xFFFF] {
            let e = Win32Error::new(code);
            r.set_error(e);
            assert!(!r.is_success(), "code {}", code);
            assert_eq!(r.error(), e);
        }
    }

    #[test]
    fn socket_error_uses_socket_table() {
        let mut r = req();
        r.set_status(STATUS_CONNECTION_ABORTED);
        assert_eq!(r.socket_error(), WSAECONNABORTED);
        assert_eq!(r.error(), ERROR_CONNECTION_ABORTED);
    }

    #[test]
    fn get_status_is_signed_view() {
        let mut r = req();
        r.set_status(STATUS_CANCELLED);
        assert!(r.status().as_i32() < 0);
    }

    #[test]
    fn payload_moves_out_once() {
        let mut r: Request<&'static str> =
            Request::with_payload(HandleId::new(1), ReqKind::Write, "cb");
        assert_eq!(r.payload(), Some(&"cb"));
        assert_eq!(r.take_payload(), Some("cb"));
        assert_eq!(r.take_payload(), None);
    }

    #[test]
    fn token_round_trip() {
        let id = ReqId::new(42);
        assert_eq!(ReqId::from_token(id.to_token()), id);
        assert_eq!(format!("{:?}", ReqId::NONE), "ReqId(NONE)");

        let reused = ReqId::with_gen(42, 3);
        assert_eq!(ReqId::from_token(reused.to_token()), reused);
        assert_ne!(reused, id);
        assert_eq!(reused.as_u32(), 42);
        assert_eq!(format!("{}", reused), "req#42.3");
    }
}
