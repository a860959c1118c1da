//! Platform error code newtypes.
//!
//! `Win32Error` is the platform error namespace the status codec maps
//! into and out of. `WsaError` is the socket-specific namespace used when
//! the generic table is not precise enough for socket operations.
//!
//! Only the codes the codec and the translation tables actually touch are
//! named here. Everything else is still representable through `new()`.

use core::fmt;

/// Platform (Win32-style) error code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Win32Error(u32);

impl Win32Error {
    #[inline]
    pub const fn new(code: u32) -> Self {
        Win32Error(code)
    }

    #[inline]
    pub const fn code(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Win32Error {
    #[inline]
    fn from(code: u32) -> Self {
        Win32Error(code)
    }
}

impl fmt::Debug for Win32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Win32Error({})", self.0)
    }
}

impl fmt::Display for Win32Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "platform error {}", self.0)
    }
}

/// Socket (Winsock-style) error code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct WsaError(i32);

impl WsaError {
    #[inline]
    pub const fn new(code: i32) -> Self {
        WsaError(code)
    }

    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for WsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WsaError({})", self.0)
    }
}

impl fmt::Display for WsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket error {}", self.0)
    }
}

// ── Win32 codes ───────────────────────────────────────────────────

pub const ERROR_SUCCESS: Win32Error = Win32Error(0);
pub const ERROR_INVALID_FUNCTION: Win32Error = Win32Error(1);
pub const ERROR_FILE_NOT_FOUND: Win32Error = Win32Error(2);
pub const ERROR_PATH_NOT_FOUND: Win32Error = Win32Error(3);
pub const ERROR_TOO_MANY_OPEN_FILES: Win32Error = Win32Error(4);
pub const ERROR_ACCESS_DENIED: Win32Error = Win32Error(5);
pub const ERROR_INVALID_HANDLE: Win32Error = Win32Error(6);
pub const ERROR_NOT_ENOUGH_MEMORY: Win32Error = Win32Error(8);
pub const ERROR_OUTOFMEMORY: Win32Error = Win32Error(14);
pub const ERROR_SHARING_VIOLATION: Win32Error = Win32Error(32);
pub const ERROR_HANDLE_EOF: Win32Error = Win32Error(38);
pub const ERROR_NOT_SUPPORTED: Win32Error = Win32Error(50);
pub const ERROR_NETNAME_DELETED: Win32Error = Win32Error(64);
pub const ERROR_FILE_EXISTS: Win32Error = Win32Error(80);
pub const ERROR_INVALID_PARAMETER: Win32Error = Win32Error(87);
pub const ERROR_BROKEN_PIPE: Win32Error = Win32Error(109);
pub const ERROR_SEM_TIMEOUT: Win32Error = Win32Error(121);
pub const ERROR_INSUFFICIENT_BUFFER: Win32Error = Win32Error(122);
pub const ERROR_ALREADY_EXISTS: Win32Error = Win32Error(183);
pub const ERROR_NO_DATA: Win32Error = Win32Error(232);
pub const ERROR_PIPE_NOT_CONNECTED: Win32Error = Win32Error(233);
pub const ERROR_MORE_DATA: Win32Error = Win32Error(234);
pub const ERROR_MR_MID_NOT_FOUND: Win32Error = Win32Error(317);
pub const ERROR_OPERATION_ABORTED: Win32Error = Win32Error(995);
pub const ERROR_IO_INCOMPLETE: Win32Error = Win32Error(996);
pub const ERROR_IO_PENDING: Win32Error = Win32Error(997);
pub const ERROR_NOACCESS: Win32Error = Win32Error(998);
pub const ERROR_CONNECTION_REFUSED: Win32Error = Win32Error(1225);
pub const ERROR_ADDRESS_ALREADY_ASSOCIATED: Win32Error = Win32Error(1227);
pub const ERROR_NETWORK_UNREACHABLE: Win32Error = Win32Error(1231);
pub const ERROR_HOST_UNREACHABLE: Win32Error = Win32Error(1232);
pub const ERROR_CONNECTION_ABORTED: Win32Error = Win32Error(1236);
pub const ERROR_NO_SYSTEM_RESOURCES: Win32Error = Win32Error(1450);
pub const ERROR_TIMEOUT: Win32Error = Win32Error(1460);

// ── Winsock codes ─────────────────────────────────────────────────

pub const WSAEINTR: WsaError = WsaError(10004);
pub const WSAEACCES: WsaError = WsaError(10013);
pub const WSAEFAULT: WsaError = WsaError(10014);
pub const WSAEINVAL: WsaError = WsaError(10022);
pub const WSAEMFILE: WsaError = WsaError(10024);
pub const WSAEWOULDBLOCK: WsaError = WsaError(10035);
pub const WSAENOTSOCK: WsaError = WsaError(10038);
pub const WSAEMSGSIZE: WsaError = WsaError(10040);
pub const WSAEOPNOTSUPP: WsaError = WsaError(10045);
pub const WSAEADDRINUSE: WsaError = WsaError(10048);
pub const WSAEADDRNOTAVAIL: WsaError = WsaError(10049);
pub const WSAENETDOWN: WsaError = WsaError(10050);
pub const WSAENETUNREACH: WsaError = WsaError(10051);
pub const WSAECONNABORTED: WsaError = WsaError(10053);
pub const WSAECONNRESET: WsaError = WsaError(10054);
pub const WSAENOBUFS: WsaError = WsaError(10055);
pub const WSAENOTCONN: WsaError = WsaError(10057);
pub const WSAESHUTDOWN: WsaError = WsaError(10058);
pub const WSAETIMEDOUT: WsaError = WsaError(10060);
pub const WSAECONNREFUSED: WsaError = WsaError(10061);
pub const WSAEHOSTUNREACH: WsaError = WsaError(10065);
pub const WSAEDISCON: WsaError = WsaError(10101);

/// Socket-namespace spelling of `ERROR_SUCCESS`.
pub const WSA_SUCCESS: WsaError = WsaError(0);
/// Socket-namespace spelling of `ERROR_IO_PENDING`.
pub const WSA_IO_PENDING: WsaError = WsaError(997);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_namespace() {
        assert_eq!(format!("{}", ERROR_IO_PENDING), "platform error 997");
        assert_eq!(format!("{}", WSAECONNRESET), "socket error 10054");
    }

    #[test]
    fn debug_shows_raw_code() {
        assert_eq!(format!("{:?}", ERROR_ACCESS_DENIED), "Win32Error(5)");
        assert_eq!(format!("{:?}", WSAEINVAL), "WsaError(10022)");
    }

    #[test]
    fn success_is_zero() {
        assert!(ERROR_SUCCESS.is_success());
        assert!(!ERROR_IO_PENDING.is_success());
        assert_eq!(Win32Error::from(0u32), ERROR_SUCCESS);
    }
}
