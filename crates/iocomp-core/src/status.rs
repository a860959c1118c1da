//! Native completion status codec.
//!
//! Every request carries exactly one `NtStatus`. The answers to "did it
//! succeed", "which platform error" and "which socket error" are all
//! derived from that one value on demand, so they can never disagree.
//!
//! Layout of the 32-bit status (most significant bits first):
//!
//! ```text
//!  31 30 | 29 | 28 | 27 ........ 16 | 15 ............ 0
//!  sev   | C  | R  |   facility     |       code
//! ```
//!
//! `sev` is 0 = success, 1 = informational, 2 = warning, 3 = error.
//! Success and informational statuses are both "success".

use core::fmt;

use crate::codes::*;

/// Facility used when a platform error is folded into a status.
pub const FACILITY_NTWIN32: u32 = 0x7;

const SEVERITY_ERROR_BITS: u32 = 0xC000_0000;

/// Severity tag carried in the top two bits of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Severity {
    Success = 0,
    Informational = 1,
    Warning = 2,
    Error = 3,
}

/// A native completion status.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NtStatus(u32);

impl NtStatus {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NtStatus(raw)
    }

    /// Reinterpret a signed status value.
    #[inline]
    pub const fn from_i32(raw: i32) -> Self {
        NtStatus(raw as u32)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The status as the codec's signed type.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }

    pub const fn severity(self) -> Severity {
        match self.0 >> 30 {
            0 => Severity::Success,
            1 => Severity::Informational,
            2 => Severity::Warning,
            _ => Severity::Error,
        }
    }

    #[inline]
    pub const fn facility(self) -> u32 {
        (self.0 >> 16) & 0x0FFF
    }

    /// Success or informational. Warnings and errors are failures.
    #[inline]
    pub const fn is_success(self) -> bool {
        self.as_i32() >= 0
    }

    /// True for statuses produced by [`NtStatus::from_win32`].
    pub const fn is_wrapped_win32(self) -> bool {
        self.facility() == FACILITY_NTWIN32
            && matches!(self.severity(), Severity::Warning | Severity::Error)
    }

    /// Fold a platform error into a status.
    ///
    /// Zero and values that are already negative as a signed status pass
    /// through unchanged. Everything else keeps its low 16 bits under the
    /// win32 facility with error severity.
    pub const fn from_win32(err: Win32Error) -> Self {
        let code = err.code();
        if (code as i32) <= 0 {
            NtStatus(code)
        } else {
            NtStatus((code & 0xFFFF) | (FACILITY_NTWIN32 << 16) | SEVERITY_ERROR_BITS)
        }
    }

    /// Map back to a platform error.
    ///
    /// Inverse of [`NtStatus::from_win32`] for every code in `0..=0xFFFF`.
    /// Kernel statuses are looked up in a fixed table; unmapped ones yield
    /// `ERROR_MR_MID_NOT_FOUND`.
    pub fn to_win32(self) -> Win32Error {
        if self == STATUS_SUCCESS {
            return ERROR_SUCCESS;
        }
        if self.is_wrapped_win32() {
            return Win32Error::new(self.0 & 0xFFFF);
        }
        match self {
            STATUS_PENDING => ERROR_IO_PENDING,
            STATUS_BUFFER_OVERFLOW => ERROR_MORE_DATA,
            STATUS_NOT_IMPLEMENTED => ERROR_INVALID_FUNCTION,
            STATUS_INVALID_HANDLE => ERROR_INVALID_HANDLE,
            STATUS_INVALID_PARAMETER => ERROR_INVALID_PARAMETER,
            STATUS_END_OF_FILE => ERROR_HANDLE_EOF,
            STATUS_NO_MEMORY => ERROR_NOT_ENOUGH_MEMORY,
            STATUS_ACCESS_DENIED => ERROR_ACCESS_DENIED,
            STATUS_BUFFER_TOO_SMALL => ERROR_INSUFFICIENT_BUFFER,
            STATUS_OBJECT_NAME_NOT_FOUND => ERROR_FILE_NOT_FOUND,
            STATUS_OBJECT_PATH_NOT_FOUND => ERROR_PATH_NOT_FOUND,
            STATUS_SHARING_VIOLATION => ERROR_SHARING_VIOLATION,
            STATUS_INSUFFICIENT_RESOURCES => ERROR_NO_SYSTEM_RESOURCES,
            STATUS_PIPE_DISCONNECTED => ERROR_PIPE_NOT_CONNECTED,
            STATUS_IO_TIMEOUT => ERROR_SEM_TIMEOUT,
            STATUS_NOT_SUPPORTED => ERROR_NOT_SUPPORTED,
            STATUS_CANCELLED => ERROR_OPERATION_ABORTED,
            STATUS_PIPE_BROKEN => ERROR_BROKEN_PIPE,
            STATUS_ADDRESS_ALREADY_EXISTS => ERROR_ADDRESS_ALREADY_ASSOCIATED,
            STATUS_CONNECTION_RESET => ERROR_NETNAME_DELETED,
            STATUS_CONNECTION_REFUSED => ERROR_CONNECTION_REFUSED,
            STATUS_NETWORK_UNREACHABLE => ERROR_NETWORK_UNREACHABLE,
            STATUS_HOST_UNREACHABLE => ERROR_HOST_UNREACHABLE,
            STATUS_CONNECTION_ABORTED => ERROR_CONNECTION_ABORTED,
            _ => ERROR_MR_MID_NOT_FOUND,
        }
    }

    /// Map to a socket error.
    ///
    /// Socket operations need a finer table than [`NtStatus::to_win32`]:
    /// several distinct kernel statuses collapse into one platform error
    /// but must stay distinguishable for sockets.
    pub fn to_winsock(self) -> WsaError {
        match self {
            STATUS_SUCCESS => WSA_SUCCESS,
            STATUS_PENDING => WSA_IO_PENDING,

            STATUS_INVALID_HANDLE | STATUS_OBJECT_TYPE_MISMATCH => WSAENOTSOCK,

            STATUS_INSUFFICIENT_RESOURCES
            | STATUS_PAGEFILE_QUOTA
            | STATUS_COMMITMENT_LIMIT
            | STATUS_WORKING_SET_QUOTA
            | STATUS_NO_MEMORY
            | STATUS_QUOTA_EXCEEDED
            | STATUS_TOO_MANY_PAGING_FILES
            | STATUS_REMOTE_RESOURCES => WSAENOBUFS,

            STATUS_TOO_MANY_ADDRESSES
            | STATUS_SHARING_VIOLATION
            | STATUS_ADDRESS_ALREADY_EXISTS => WSAEADDRINUSE,

            STATUS_LINK_TIMEOUT | STATUS_IO_TIMEOUT | STATUS_TIMEOUT => WSAETIMEDOUT,

            STATUS_GRACEFUL_DISCONNECT => WSAEDISCON,

            STATUS_REMOTE_DISCONNECT
            | STATUS_CONNECTION_RESET
            | STATUS_LINK_FAILED
            | STATUS_CONNECTION_DISCONNECTED
            | STATUS_PORT_UNREACHABLE
            | STATUS_HOPLIMIT_EXCEEDED => WSAECONNRESET,

            STATUS_LOCAL_DISCONNECT
            | STATUS_TRANSACTION_ABORTED
            | STATUS_CONNECTION_ABORTED => WSAECONNABORTED,

            STATUS_BAD_NETWORK_PATH
            | STATUS_NETWORK_UNREACHABLE
            | STATUS_PROTOCOL_UNREACHABLE => WSAENETUNREACH,

            STATUS_HOST_UNREACHABLE => WSAEHOSTUNREACH,

            STATUS_CANCELLED | STATUS_REQUEST_ABORTED => WSAEINTR,

            STATUS_BUFFER_OVERFLOW | STATUS_INVALID_BUFFER_SIZE => WSAEMSGSIZE,

            STATUS_BUFFER_TOO_SMALL | STATUS_ACCESS_VIOLATION => WSAEFAULT,

            STATUS_DEVICE_NOT_READY | STATUS_REQUEST_NOT_ACCEPTED => WSAEWOULDBLOCK,

            STATUS_INVALID_NETWORK_RESPONSE
            | STATUS_NETWORK_BUSY
            | STATUS_NO_SUCH_DEVICE
            | STATUS_NO_SUCH_FILE
            | STATUS_OBJECT_PATH_NOT_FOUND
            | STATUS_OBJECT_NAME_NOT_FOUND
            | STATUS_UNEXPECTED_NETWORK_ERROR => WSAENETDOWN,

            STATUS_INVALID_CONNECTION => WSAENOTCONN,

            STATUS_REMOTE_NOT_LISTENING | STATUS_CONNECTION_REFUSED => WSAECONNREFUSED,

            STATUS_PIPE_DISCONNECTED => WSAESHUTDOWN,

            STATUS_CONFLICTING_ADDRESSES
            | STATUS_INVALID_ADDRESS
            | STATUS_INVALID_ADDRESS_COMPONENT => WSAEADDRNOTAVAIL,

            STATUS_NOT_SUPPORTED | STATUS_NOT_IMPLEMENTED => WSAEOPNOTSUPP,

            STATUS_ACCESS_DENIED => WSAEACCES,

            other if other.is_wrapped_win32() => WsaError::new((other.0 & 0xFFFF) as i32),
            _ => WSAEINVAL,
        }
    }
}

impl From<Win32Error> for NtStatus {
    #[inline]
    fn from(err: Win32Error) -> Self {
        NtStatus::from_win32(err)
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtStatus({:#010x})", self.0)
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

// ── Status constants ──────────────────────────────────────────────

pub const STATUS_SUCCESS: NtStatus = NtStatus(0x0000_0000);
pub const STATUS_TIMEOUT: NtStatus = NtStatus(0x0000_0102);
pub const STATUS_PENDING: NtStatus = NtStatus(0x0000_0103);
pub const STATUS_BUFFER_OVERFLOW: NtStatus = NtStatus(0x8000_0005);
pub const STATUS_NOT_IMPLEMENTED: NtStatus = NtStatus(0xC000_0002);
pub const STATUS_ACCESS_VIOLATION: NtStatus = NtStatus(0xC000_0005);
pub const STATUS_PAGEFILE_QUOTA: NtStatus = NtStatus(0xC000_0007);
pub const STATUS_INVALID_HANDLE: NtStatus = NtStatus(0xC000_0008);
pub const STATUS_INVALID_PARAMETER: NtStatus = NtStatus(0xC000_000D);
pub const STATUS_NO_SUCH_DEVICE: NtStatus = NtStatus(0xC000_000E);
pub const STATUS_NO_SUCH_FILE: NtStatus = NtStatus(0xC000_000F);
pub const STATUS_END_OF_FILE: NtStatus = NtStatus(0xC000_0011);
pub const STATUS_NO_MEMORY: NtStatus = NtStatus(0xC000_0017);
pub const STATUS_CONFLICTING_ADDRESSES: NtStatus = NtStatus(0xC000_0018);
pub const STATUS_ACCESS_DENIED: NtStatus = NtStatus(0xC000_0022);
pub const STATUS_BUFFER_TOO_SMALL: NtStatus = NtStatus(0xC000_0023);
pub const STATUS_OBJECT_TYPE_MISMATCH: NtStatus = NtStatus(0xC000_0024);
pub const STATUS_OBJECT_NAME_NOT_FOUND: NtStatus = NtStatus(0xC000_0034);
pub const STATUS_OBJECT_PATH_NOT_FOUND: NtStatus = NtStatus(0xC000_003A);
pub const STATUS_SHARING_VIOLATION: NtStatus = NtStatus(0xC000_0043);
pub const STATUS_QUOTA_EXCEEDED: NtStatus = NtStatus(0xC000_0044);
pub const STATUS_TOO_MANY_PAGING_FILES: NtStatus = NtStatus(0xC000_0097);
pub const STATUS_INSUFFICIENT_RESOURCES: NtStatus = NtStatus(0xC000_009A);
pub const STATUS_WORKING_SET_QUOTA: NtStatus = NtStatus(0xC000_00A1);
pub const STATUS_DEVICE_NOT_READY: NtStatus = NtStatus(0xC000_00A3);
pub const STATUS_PIPE_DISCONNECTED: NtStatus = NtStatus(0xC000_00B0);
pub const STATUS_IO_TIMEOUT: NtStatus = NtStatus(0xC000_00B5);
pub const STATUS_NOT_SUPPORTED: NtStatus = NtStatus(0xC000_00BB);
pub const STATUS_REMOTE_NOT_LISTENING: NtStatus = NtStatus(0xC000_00BC);
pub const STATUS_BAD_NETWORK_PATH: NtStatus = NtStatus(0xC000_00BE);
pub const STATUS_NETWORK_BUSY: NtStatus = NtStatus(0xC000_00BF);
pub const STATUS_INVALID_NETWORK_RESPONSE: NtStatus = NtStatus(0xC000_00C3);
pub const STATUS_UNEXPECTED_NETWORK_ERROR: NtStatus = NtStatus(0xC000_00C4);
pub const STATUS_REQUEST_NOT_ACCEPTED: NtStatus = NtStatus(0xC000_00D0);
pub const STATUS_CANCELLED: NtStatus = NtStatus(0xC000_0120);
pub const STATUS_COMMITMENT_LIMIT: NtStatus = NtStatus(0xC000_012D);
pub const STATUS_LOCAL_DISCONNECT: NtStatus = NtStatus(0xC000_013B);
pub const STATUS_REMOTE_DISCONNECT: NtStatus = NtStatus(0xC000_013C);
pub const STATUS_REMOTE_RESOURCES: NtStatus = NtStatus(0xC000_013D);
pub const STATUS_LINK_FAILED: NtStatus = NtStatus(0xC000_013E);
pub const STATUS_LINK_TIMEOUT: NtStatus = NtStatus(0xC000_013F);
pub const STATUS_INVALID_CONNECTION: NtStatus = NtStatus(0xC000_0140);
pub const STATUS_INVALID_ADDRESS: NtStatus = NtStatus(0xC000_0141);
pub const STATUS_PIPE_BROKEN: NtStatus = NtStatus(0xC000_014B);
pub const STATUS_INVALID_BUFFER_SIZE: NtStatus = NtStatus(0xC000_0206);
pub const STATUS_INVALID_ADDRESS_COMPONENT: NtStatus = NtStatus(0xC000_0207);
pub const STATUS_TOO_MANY_ADDRESSES: NtStatus = NtStatus(0xC000_0209);
pub const STATUS_ADDRESS_ALREADY_EXISTS: NtStatus = NtStatus(0xC000_020A);
pub const STATUS_CONNECTION_DISCONNECTED: NtStatus = NtStatus(0xC000_020C);
pub const STATUS_CONNECTION_RESET: NtStatus = NtStatus(0xC000_020D);
pub const STATUS_TRANSACTION_ABORTED: NtStatus = NtStatus(0xC000_020F);
pub const STATUS_CONNECTION_REFUSED: NtStatus = NtStatus(0xC000_0236);
pub const STATUS_GRACEFUL_DISCONNECT: NtStatus = NtStatus(0xC000_0237);
pub const STATUS_NETWORK_UNREACHABLE: NtStatus = NtStatus(0xC000_023C);
pub const STATUS_HOST_UNREACHABLE: NtStatus = NtStatus(0xC000_023D);
pub const STATUS_PROTOCOL_UNREACHABLE: NtStatus = NtStatus(0xC000_023E);
pub const STATUS_PORT_UNREACHABLE: NtStatus = NtStatus(0xC000_023F);
pub const STATUS_REQUEST_ABORTED: NtStatus = NtStatus(0xC000_0240);
pub const STATUS_CONNECTION_ABORTED: NtStatus = NtStatus(0xC000_0241);
pub const STATUS_HOPLIMIT_EXCEEDED: NtStatus = NtStatus(0xC000_A012);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_from_top_bits() {
        assert_eq!(STATUS_SUCCESS.severity(), Severity::Success);
        assert_eq!(NtStatus::from_raw(0x4000_0000).severity(), Severity::Informational);
        assert_eq!(STATUS_BUFFER_OVERFLOW.severity(), Severity::Warning);
        assert_eq!(STATUS_CANCELLED.severity(), Severity::Error);
    }

    #[test]
    fn informational_counts_as_success() {
        assert!(STATUS_SUCCESS.is_success());
        assert!(STATUS_PENDING.is_success());
        assert!(STATUS_TIMEOUT.is_success());
        assert!(NtStatus::from_raw(0x4000_0001).is_success());
        assert!(!STATUS_BUFFER_OVERFLOW.is_success());
        assert!(!STATUS_ACCESS_DENIED.is_success());
    }

    #[test]
    fn win32_folding_layout() {
        let s = NtStatus::from_win32(ERROR_ACCESS_DENIED);
        assert_eq!(s.raw(), 0xC007_0005);
        assert_eq!(s.facility(), FACILITY_NTWIN32);
        assert!(s.is_wrapped_win32());
        assert_eq!(NtStatus::from_win32(ERROR_SUCCESS), STATUS_SUCCESS);
    }

    #[test]
    fn negative_codes_pass_through() {
        let raw = Win32Error::new(0xC000_0120);
        assert_eq!(NtStatus::from_win32(raw), STATUS_CANCELLED);
    }

    #[test]
    fn win32_round_trip_full_range() {
        for code in 0..=0xFFFFu32 {
            let e = Win32Error::new(code);
            assert_eq!(NtStatus::from_win32(e).to_win32(), e, "code {}", code);
        }
    }

    #[test]
    fn kernel_statuses_map_through_table() {
        assert_eq!(STATUS_PENDING.to_win32(), ERROR_IO_PENDING);
        assert_eq!(STATUS_CANCELLED.to_win32(), ERROR_OPERATION_ABORTED);
        assert_eq!(STATUS_END_OF_FILE.to_win32(), ERROR_HANDLE_EOF);
        assert_eq!(STATUS_PIPE_BROKEN.to_win32(), ERROR_BROKEN_PIPE);
        assert_eq!(NtStatus::from_raw(0xC0FF_FFFF).to_win32(), ERROR_MR_MID_NOT_FOUND);
    }

    #[test]
    fn socket_table_is_finer_than_generic() {
        assert_eq!(STATUS_CONNECTION_RESET.to_winsock(), WSAECONNRESET);
        assert_eq!(STATUS_REMOTE_DISCONNECT.to_winsock(), WSAECONNRESET);
        assert_eq!(STATUS_GRACEFUL_DISCONNECT.to_winsock(), WSAEDISCON);
        assert_eq!(STATUS_CANCELLED.to_winsock(), WSAEINTR);
        assert_eq!(STATUS_INVALID_HANDLE.to_winsock(), WSAENOTSOCK);
        assert_eq!(STATUS_NO_MEMORY.to_winsock(), WSAENOBUFS);
        assert_eq!(STATUS_SUCCESS.to_winsock(), WSA_SUCCESS);
        assert_eq!(STATUS_PENDING.to_winsock(), WSA_IO_PENDING);
    }

    #[test]
    fn socket_table_unwraps_folded_errors() {
        let s = NtStatus::from_win32(Win32Error::new(10054));
        assert_eq!(s.to_winsock(), WSAECONNRESET);
    }

    #[test]
    fn socket_table_fallback() {
        assert_eq!(NtStatus::from_raw(0xC0FF_FFFF).to_winsock(), WSAEINVAL);
        assert_eq!(NtStatus::from_raw(0x4000_0001).to_winsock(), WSAEINVAL);
    }

    #[test]
    fn signed_view() {
        assert_eq!(STATUS_CANCELLED.as_i32(), 0xC000_0120u32 as i32);
        assert!(STATUS_CANCELLED.as_i32() < 0);
        assert_eq!(NtStatus::from_i32(STATUS_CANCELLED.as_i32()), STATUS_CANCELLED);
    }
}
