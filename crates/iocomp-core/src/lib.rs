//! # iocomp-core
//!
//! Request/completion dispatch core of a completion-port event loop.
//!
//! This crate holds the data structures and contracts the loop's poll and
//! drain phases depend on. It has no OS-specific code; the default port
//! and the loop itself live in `iocomp-module`.
//!
//! ## Modules
//!
//! - `status` - Native status codec (`NtStatus`, severity, error tables)
//! - `codes` - Platform and socket error code newtypes
//! - `translate` - Platform error → POSIX errno
//! - `request` - `Request` record and `ReqId`
//! - `table` - Request arena and the `ReqLinks` seam
//! - `pending` - Intrusive circular FIFO of completed requests
//! - `activity` - Handle/loop outstanding-request counters
//! - `classify` - Submission outcome predicates
//! - `port` - Completion port, poster and notifier traits
//! - `fatal` - Fail-fast path for unrecoverable port failures
//! - `error` - Error types
//! - `kprint` - Leveled stderr logging macros
//! - `env` - Environment variable utilities

pub mod status;
pub mod codes;
pub mod translate;
pub mod request;
pub mod table;
pub mod pending;
pub mod activity;
pub mod classify;
pub mod port;
pub mod fatal;
pub mod error;
pub mod kprint;
pub mod env;

pub use activity::{
    handle_flags, register_handle_req, unregister_handle_req, HandleActivity, HandleId,
    LoopCounters,
};
pub use classify::{classify, succeeded_with_port, succeeded_without_port, Disposition, SubmitResult};
pub use codes::{Win32Error, WsaError};
pub use error::{CoreError, Result};
pub use fatal::{abort_on_fatal, FatalError, FatalHook};
pub use pending::PendingQueue;
pub use port::{CompletionEvent, CompletionPort, CompletionPoster, Notifier};
pub use request::{ReqId, ReqKind, Request};
pub use status::{NtStatus, Severity};
pub use table::{ReqLinks, RequestTable};
