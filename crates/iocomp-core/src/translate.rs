//! Platform error → portable (POSIX errno) translation.
//!
//! Upper layers report errors to callbacks as errno values so that the
//! same code runs on every backend. Codes with no errno counterpart map to
//! `EIO`; end-of-stream conditions map to [`EOF`].

use std::io;

use crate::codes::*;

/// End of stream. Not a POSIX errno; chosen outside the errno range.
pub const EOF: i32 = 4095;

impl Win32Error {
    /// Portable errno for this platform error. `0` for success.
    pub fn to_errno(self) -> i32 {
        match self {
            ERROR_SUCCESS => 0,
            ERROR_ACCESS_DENIED | ERROR_NOACCESS => libc::EACCES,
            ERROR_ADDRESS_ALREADY_ASSOCIATED => libc::EADDRINUSE,
            ERROR_CONNECTION_ABORTED => libc::ECONNABORTED,
            ERROR_CONNECTION_REFUSED => libc::ECONNREFUSED,
            ERROR_NETNAME_DELETED => libc::ECONNRESET,
            ERROR_ALREADY_EXISTS | ERROR_FILE_EXISTS => libc::EEXIST,
            ERROR_HOST_UNREACHABLE => libc::EHOSTUNREACH,
            ERROR_OPERATION_ABORTED => libc::ECANCELED,
            ERROR_INVALID_HANDLE => libc::EBADF,
            ERROR_INVALID_PARAMETER | ERROR_INSUFFICIENT_BUFFER => libc::EINVAL,
            ERROR_INVALID_FUNCTION => libc::EISDIR,
            ERROR_TOO_MANY_OPEN_FILES => libc::EMFILE,
            ERROR_NETWORK_UNREACHABLE => libc::ENETUNREACH,
            ERROR_NO_SYSTEM_RESOURCES => libc::ENOBUFS,
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => libc::ENOENT,
            ERROR_NOT_ENOUGH_MEMORY | ERROR_OUTOFMEMORY => libc::ENOMEM,
            ERROR_PIPE_NOT_CONNECTED => libc::ENOTCONN,
            ERROR_NOT_SUPPORTED => libc::ENOTSUP,
            ERROR_NO_DATA => libc::EPIPE,
            ERROR_BROKEN_PIPE | ERROR_HANDLE_EOF => EOF,
            ERROR_SHARING_VIOLATION => libc::EBUSY,
            ERROR_SEM_TIMEOUT | ERROR_TIMEOUT => libc::ETIMEDOUT,
            ERROR_IO_PENDING => libc::EINPROGRESS,
            _ => libc::EIO,
        }
    }

    /// Build an `io::Error` carrying the portable errno.
    pub fn to_io_error(self) -> io::Error {
        errno_to_io_error(self.to_errno())
    }
}

impl WsaError {
    /// Portable errno for this socket error. `0` for success.
    pub fn to_errno(self) -> i32 {
        match self {
            WSA_SUCCESS => 0,
            WSA_IO_PENDING => libc::EINPROGRESS,
            WSAEINTR => libc::ECANCELED,
            WSAEACCES => libc::EACCES,
            WSAEFAULT => libc::EFAULT,
            WSAEINVAL => libc::EINVAL,
            WSAEMFILE => libc::EMFILE,
            WSAEWOULDBLOCK => libc::EAGAIN,
            WSAENOTSOCK => libc::ENOTSOCK,
            WSAEMSGSIZE => libc::EMSGSIZE,
            WSAEOPNOTSUPP => libc::ENOTSUP,
            WSAEADDRINUSE => libc::EADDRINUSE,
            WSAEADDRNOTAVAIL => libc::EADDRNOTAVAIL,
            WSAENETDOWN => libc::ENETDOWN,
            WSAENETUNREACH => libc::ENETUNREACH,
            WSAECONNABORTED => libc::ECONNABORTED,
            WSAECONNRESET | WSAEDISCON => libc::ECONNRESET,
            WSAENOBUFS => libc::ENOBUFS,
            WSAENOTCONN => libc::ENOTCONN,
            WSAESHUTDOWN => libc::EPIPE,
            WSAETIMEDOUT => libc::ETIMEDOUT,
            WSAECONNREFUSED => libc::ECONNREFUSED,
            WSAEHOSTUNREACH => libc::EHOSTUNREACH,
            // Folded platform errors surface unchanged from the socket table.
            other if other.code() > 0 && other.code() <= 0xFFFF => {
                Win32Error::new(other.code() as u32).to_errno()
            }
            _ => libc::EIO,
        }
    }

    pub fn to_io_error(self) -> io::Error {
        errno_to_io_error(self.to_errno())
    }
}

fn errno_to_io_error(errno: i32) -> io::Error {
    if errno == EOF {
        return io::Error::new(io::ErrorKind::UnexpectedEof, "end of stream");
    }
    cfg_errno_to_io_error(errno)
}

#[cfg(unix)]
fn cfg_errno_to_io_error(errno: i32) -> io::Error {
    io::Error::from_raw_os_error(errno)
}

#[cfg(not(unix))]
fn cfg_errno_to_io_error(errno: i32) -> io::Error {
    // Raw OS errors are not errno values here; keep the number as text.
    io::Error::new(io::ErrorKind::Other, format!("errno {}", errno))
}
