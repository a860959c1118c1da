//! Unrecoverable infrastructure failures.
//!
//! A dropped synthetic completion means a callback that never fires and a
//! handle/loop count that never drops. There is nothing to recover to, so
//! such failures go here instead of into a `Result`.

use core::fmt;

use crate::codes::Win32Error;
use crate::kerror;

/// Platform error plus the name of the operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatalError {
    pub code: Win32Error,
    pub op: &'static str,
}

impl FatalError {
    pub const fn new(code: Win32Error, op: &'static str) -> Self {
        Self { code, op }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.op, self.code, self.code.to_io_error())
    }
}

/// Terminates the process (or, in tests, unwinds).
pub type FatalHook = fn(&FatalError) -> !;

/// Default hook: log and abort.
pub fn abort_on_fatal(err: &FatalError) -> ! {
    kerror!("fatal: {}", err);
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::ERROR_NO_SYSTEM_RESOURCES;

    #[test]
    fn display_names_op_and_code() {
        let e = FatalError::new(ERROR_NO_SYSTEM_RESOURCES, "post_queued_completion");
        let s = format!("{}", e);
        assert!(s.starts_with("post_queued_completion: platform error 1450"));
    }
}
