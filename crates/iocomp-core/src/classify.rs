//! Completion-result classification.
//!
//! A native submission call answers two independent questions: did the
//! submission succeed, and will the result arrive through the completion
//! port or has it already landed. Call sites branch on these predicates
//! instead of re-deriving the platform rules inline.

use crate::activity::handle_flags;
use crate::codes::{Win32Error, ERROR_IO_PENDING};

/// Outcome of a native submission call: `Ok` for immediate success,
/// otherwise the platform's last error.
pub type SubmitResult = Result<(), Win32Error>;

/// Immediate success on a handle configured to skip the port.
///
/// The caller enqueues the request directly; no port event will follow.
#[inline]
pub fn succeeded_without_port(result: &SubmitResult, flags: u32) -> bool {
    result.is_ok() && flags & handle_flags::SYNC_BYPASS != 0
}

/// Immediate success, or "queued, will complete later".
///
/// Either way a real port event will arrive. Anything else is a hard
/// submission failure.
#[inline]
pub fn succeeded_with_port(result: &SubmitResult) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => *e == ERROR_IO_PENDING,
    }
}

/// What a call site must do with a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Result is final; enqueue for dispatch now.
    Bypass,
    /// Wait for the port to deliver the completion.
    AwaitCompletion,
    /// Submission failed; report synchronously, register nothing.
    Rejected(Win32Error),
}

/// Combine both predicates. Bypass is tested first.
pub fn classify(result: &SubmitResult, flags: u32) -> Disposition {
    if succeeded_without_port(result, flags) {
        Disposition::Bypass
    } else if succeeded_with_port(result) {
        Disposition::AwaitCompletion
    } else {
        match result {
            Err(e) => Disposition::Rejected(*e),
            // succeeded_with_port accepts every Ok.
            Ok(()) => Disposition::AwaitCompletion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::*;

    const BYPASS: u32 = handle_flags::SYNC_BYPASS;

    #[test]
    fn pending_waits_for_port() {
        let r: SubmitResult = Err(ERROR_IO_PENDING);
        assert!(succeeded_with_port(&r));
        assert!(!succeeded_without_port(&r, BYPASS));
        assert_eq!(classify(&r, BYPASS), Disposition::AwaitCompletion);
    }

    #[test]
    fn immediate_success_with_bypass() {
        let r: SubmitResult = Ok(());
        assert!(succeeded_without_port(&r, BYPASS));
        assert_eq!(classify(&r, BYPASS), Disposition::Bypass);
    }

    #[test]
    fn immediate_success_without_bypass_still_waits() {
        let r: SubmitResult = Ok(());
        assert!(!succeeded_without_port(&r, 0));
        assert!(succeeded_with_port(&r));
        assert_eq!(classify(&r, 0), Disposition::AwaitCompletion);
    }

    #[test]
    fn other_errors_are_rejected() {
        let r: SubmitResult = Err(ERROR_ACCESS_DENIED);
        assert!(!succeeded_with_port(&r));
        assert!(!succeeded_without_port(&r, BYPASS));
        assert_eq!(classify(&r, BYPASS), Disposition::Rejected(ERROR_ACCESS_DENIED));
    }

    #[test]
    fn unrelated_flags_do_not_bypass() {
        let r: SubmitResult = Ok(());
        let flags = handle_flags::REF | handle_flags::ACTIVE;
        assert_eq!(classify(&r, flags), Disposition::AwaitCompletion);
    }
}
