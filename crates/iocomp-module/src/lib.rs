//! # iocomp-module: default implementations
//!
//! The portable completion port, its notifiers, the loop configuration and
//! the event loop that ties `iocomp-core`'s pieces together.
//!
//! ## Default stack
//!
//! | Trait / role      | Default impl      | Alternative                 |
//! |-------------------|-------------------|-----------------------------|
//! | CompletionPort    | QueuePort         | native port (external)      |
//! | Notifier          | EventFdNotifier   | CondvarNotifier (non-Linux) |
//! | Loop              | EventLoop         |                             |
//!
//! ## Usage
//!
//! ```ignore
//! use iocomp_module::{EventLoop, LoopConfig};
//! use iocomp_core::{handle_flags, ReqKind};
//!
//! let mut lp = EventLoop::with_queue_port(LoopConfig::from_env())?;
//! let h = lp.open_handle(0);
//! let id = lp.new_request(h, ReqKind::Read, |_, done| {
//!     println!("read {} bytes", done.bytes);
//! })?;
//! lp.submit(id, Err(iocomp_core::codes::ERROR_IO_PENDING))?;
//! // another thread: poster.post(CompletionEvent::completed(id, STATUS_SUCCESS, 512))
//! lp.run()?;
//! ```

pub mod config;
pub mod notifier;
pub mod queue_port;
pub mod handles;
pub mod event_loop;

pub use config::LoopConfig;
pub use event_loop::{Callback, Completion, EventLoop, LoopStats};
pub use notifier::{CondvarNotifier, DefaultNotifier};
#[cfg(target_os = "linux")]
pub use notifier::EventFdNotifier;
pub use queue_port::{QueuePort, QueuePoster};
