//! iocomp error types.

use std::fmt;

use crate::activity::HandleId;
use crate::codes::Win32Error;
use crate::request::ReqId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Native submission failed for a reason other than "pending".
    Submit(Win32Error),
    /// Completion port failure (poll side).
    Port(Win32Error),
    /// No live request with this id.
    UnknownRequest(ReqId),
    /// No open handle with this id.
    UnknownHandle(HandleId),
    /// Handle is closing; no new requests accepted.
    HandleClosing(HandleId),
    /// Request already registered against its handle.
    AlreadyRegistered(ReqId),
    /// Request is linked into the pending queue.
    AlreadyPending(ReqId),
    /// Request table is full.
    TableFull,
    /// Invalid loop configuration.
    Config(&'static str),
    /// OS error with errno.
    Os(i32),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit(e) => write!(f, "submission failed: {}", e),
            Self::Port(e) => write!(f, "completion port: {}", e),
            Self::UnknownRequest(id) => write!(f, "unknown request {}", id),
            Self::UnknownHandle(id) => write!(f, "unknown handle {:?}", id),
            Self::HandleClosing(id) => write!(f, "handle {:?} is closing", id),
            Self::AlreadyRegistered(id) => write!(f, "{} already registered", id),
            Self::AlreadyPending(id) => write!(f, "{} already pending", id),
            Self::TableFull => write!(f, "request table full"),
            Self::Config(msg) => write!(f, "invalid config: {}", msg),
            Self::Os(e) => write!(f, "OS error: errno {}", e),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<CoreError> for std::io::Error {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Submit(e) | CoreError::Port(e) => e.to_io_error(),
            CoreError::Os(errno) => std::io::Error::from_raw_os_error(errno),
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", CoreError::Submit(ERROR_ACCESS_DENIED)),
            "submission failed: platform error 5"
        );
        assert_eq!(format!("{}", CoreError::UnknownRequest(ReqId::new(7))), "unknown request req#7");
        assert_eq!(format!("{}", CoreError::TableFull), "request table full");
    }

    #[test]
    fn test_into_io_error() {
        let io: std::io::Error = CoreError::TableFull.into();
        assert_eq!(io.kind(), std::io::ErrorKind::Other);
    }
}
