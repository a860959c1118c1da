//! `EventLoop`: the poll/drain cycle.
//!
//! One loop per thread. The loop owns the request table, the handle
//! table, the pending queue and the loop counters; none of it is shared.
//! The port is the only thing other threads touch.
//!
//! A request's life:
//!
//! ```text
//! new_request ──► submit ──┬─ Bypass ──────────► pending ──► process_reqs ──► callback
//!                          ├─ AwaitCompletion ─► port ─► poll ─┘
//!                          └─ Rejected ──► released, error returned
//! ```

use std::marker::PhantomData;
use std::time::Duration;

use iocomp_core::activity::{
    handle_flags, register_handle_req, unregister_handle_req, HandleActivity, HandleId,
    LoopCounters,
};
use iocomp_core::classify::{classify, Disposition, SubmitResult};
use iocomp_core::codes::{Win32Error, WsaError};
use iocomp_core::error::{CoreError, Result};
use iocomp_core::fatal::{FatalError, FatalHook};
use iocomp_core::kprint::{self, LogLevel};
use iocomp_core::pending::PendingQueue;
use iocomp_core::port::{CompletionEvent, CompletionPort, CompletionPoster};
use iocomp_core::request::{ReqId, ReqKind, Request};
use iocomp_core::status::NtStatus;
use iocomp_core::table::RequestTable;
use iocomp_core::{kdebug, ktrace, kwarn};

use crate::config::LoopConfig;
use crate::handles::HandleTable;
use crate::queue_port::QueuePort;

/// What a callback receives: the finished request's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub req: ReqId,
    pub handle: HandleId,
    pub kind: ReqKind,
    pub status: NtStatus,
    pub bytes: u32,
}

impl Completion {
    fn from_request<C>(req: ReqId, r: &Request<C>) -> Self {
        Self {
            req,
            handle: r.handle(),
            kind: r.kind(),
            status: r.status(),
            bytes: r.bytes(),
        }
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

    /// Bytes transferred, or the platform error.
    pub fn result(&self) -> std::result::Result<u32, Win32Error> {
        if self.is_success() {
            Ok(self.bytes)
        } else {
            Err(self.error())
        }
    }
}

/// Completion callback stored on each request.
pub type Callback<P> = Box<dyn FnOnce(&mut EventLoop<P>, Completion)>;

/// Loop counters for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    /// Events retrieved from the port.
    pub polled: u64,
    /// Synthetic completions posted.
    pub posted: u64,
    /// Requests enqueued directly, skipping the port.
    pub bypassed: u64,
    /// Callbacks run.
    pub dispatched: u64,
    /// Port events for requests the loop does not know.
    pub dropped: u64,
}

pub struct EventLoop<P: CompletionPort = QueuePort> {
    config: LoopConfig,
    port: P,
    requests: RequestTable<Callback<P>>,
    handles: HandleTable,
    pending: PendingQueue,
    counters: LoopCounters,
    events: Vec<CompletionEvent>,
    fatal: FatalHook,
    stats: LoopStats,
    _not_send: PhantomData<*const ()>,
}

impl EventLoop<QueuePort> {
    /// Loop over a fresh `QueuePort` sized from `config`.
    pub fn with_queue_port(config: LoopConfig) -> Result<Self> {
        config.validate().map_err(CoreError::Config)?;
        let port = QueuePort::new(config.port_capacity)?;
        Self::new(config, port)
    }
}

impl<P: CompletionPort> EventLoop<P> {
    /// Fails with `CoreError::Config` if `config` does not validate.
    pub fn new(config: LoopConfig, port: P) -> Result<Self> {
        config.validate().map_err(CoreError::Config)?;
        if config.debug_logging {
            kprint::set_log_level(LogLevel::Debug);
        }
        kdebug!("loop: {:?}", config);
        Ok(Self {
            requests: RequestTable::new(config.max_requests),
            handles: HandleTable::new(),
            pending: PendingQueue::new(),
            counters: LoopCounters::new(),
            events: Vec::with_capacity(config.max_events_per_poll),
            fatal: config.fatal_hook,
            stats: LoopStats::default(),
            port,
            config,
            _not_send: PhantomData,
        })
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Sender for completion producers on other threads.
    pub fn poster(&self) -> Box<dyn CompletionPoster> {
        self.port.poster()
    }

    pub fn set_fatal_hook(&mut self, hook: FatalHook) {
        self.fatal = hook;
    }

    pub fn counters(&self) -> LoopCounters {
        self.counters
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending request ids, head first.
    pub fn pending_ids(&self) -> Vec<ReqId> {
        self.pending.iter(&self.requests).collect()
    }

    // ── Handles ──

    pub fn open_handle(&mut self, flags: u32) -> HandleId {
        let id = self.handles.insert(HandleActivity::new(flags));
        ktrace!("open handle {:?} flags={:#x}", id, flags);
        id
    }

    pub fn handle(&self, id: HandleId) -> Option<&HandleActivity> {
        self.handles.get(id)
    }

    /// Mark the handle closing. It accepts no new requests and is released
    /// as soon as its last outstanding request is unregistered.
    pub fn close_handle(&mut self, id: HandleId) -> Result<()> {
        let h = self.handles.try_get_mut(id)?;
        if h.has_flag(handle_flags::CLOSING) {
            return Ok(());
        }
        h.set_flag(handle_flags::CLOSING, true);
        let outstanding = h.active_count();
        if outstanding == 0 {
            self.handles.remove(id);
            kdebug!("handle {:?} released", id);
        } else {
            kdebug!("handle {:?} closing with {} outstanding", id, outstanding);
        }
        Ok(())
    }

    pub fn set_handle_ref(&mut self, id: HandleId, referenced: bool) -> Result<()> {
        let h = self.handles.try_get_mut(id)?;
        h.set_ref(&mut self.counters, referenced);
        Ok(())
    }

    // ── Requests ──

    pub fn new_request<F>(&mut self, handle: HandleId, kind: ReqKind, callback: F) -> Result<ReqId>
    where
        F: FnOnce(&mut EventLoop<P>, Completion) + 'static,
    {
        let h = self.handles.get(handle).ok_or(CoreError::UnknownHandle(handle))?;
        if h.has_flag(handle_flags::CLOSING) {
            return Err(CoreError::HandleClosing(handle));
        }
        let callback: Callback<P> = Box::new(callback);
        self.requests.insert(Request::with_payload(handle, kind, callback))
    }

    pub fn request(&self, id: ReqId) -> Option<&Request<Callback<P>>> {
        self.requests.get(id)
    }

    pub fn request_mut(&mut self, id: ReqId) -> Option<&mut Request<Callback<P>>> {
        self.requests.get_mut(id)
    }

    /// Count the request against its handle and the loop.
    pub fn register_req(&mut self, id: ReqId) -> Result<()> {
        let req = self.requests.try_get_mut(id)?;
        if req.is_registered() {
            return Err(CoreError::AlreadyRegistered(id));
        }
        let h = self.handles.try_get_mut(req.handle())?;
        register_handle_req(&mut self.counters, h);
        req.set_registered(true);
        Ok(())
    }

    /// Undo `register_req`. Returns `false` if the request was not
    /// registered.
    pub fn unregister_req(&mut self, id: ReqId) -> Result<bool> {
        let req = self.requests.try_get_mut(id)?;
        if !req.is_registered() {
            return Ok(false);
        }
        req.set_registered(false);
        let handle = req.handle();
        self.release_handle_req(handle);
        Ok(true)
    }

    fn release_handle_req(&mut self, id: HandleId) {
        let release = match self.handles.try_get_mut(id) {
            Ok(h) => {
                unregister_handle_req(&mut self.counters, h);
                h.has_flag(handle_flags::CLOSING) && h.active_count() == 0
            }
            Err(_) => {
                kwarn!("unregister against missing handle {:?}", id);
                false
            }
        };
        if release {
            self.handles.remove(id);
            kdebug!("handle {:?} released", id);
        }
    }

    /// Apply the outcome of a native submission call to `id`.
    ///
    /// A request can be submitted once: a registered or pending request
    /// is refused before its result is looked at.
    pub fn submit(&mut self, id: ReqId, result: SubmitResult) -> Result<Disposition> {
        let req = self.requests.get(id).ok_or(CoreError::UnknownRequest(id))?;
        if req.is_registered() {
            return Err(CoreError::AlreadyRegistered(id));
        }
        if req.next().is_some() {
            return Err(CoreError::AlreadyPending(id));
        }
        let handle = req.handle();
        let flags = self.handles.get(handle).ok_or(CoreError::UnknownHandle(handle))?.flags();

        let disposition = classify(&result, flags);
        match disposition {
            Disposition::Bypass => {
                self.register_req(id)?;
                if let Some(req) = self.requests.get_mut(id) {
                    req.set_success();
                }
                self.insert_pending(id)?;
                self.stats.bypassed += 1;
            }
            Disposition::AwaitCompletion => self.register_req(id)?,
            Disposition::Rejected(e) => {
                // Neither registered nor linked, checked above.
                self.requests.remove(id);
                kdebug!("{} rejected: {}", id, e);
                return Err(CoreError::Submit(e));
            }
        }
        ktrace!("{} submitted: {:?}", id, disposition);
        Ok(disposition)
    }

    /// Append to the pending queue.
    ///
    /// # Panics
    ///
    /// In debug builds, if `id` is already pending.
    pub fn insert_pending(&mut self, id: ReqId) -> Result<()> {
        self.pending.insert(&mut self.requests, id)
    }

    /// Route a request whose status is already recorded through the port,
    /// so it is dispatched like any port completion.
    ///
    /// If the port refuses the event the fatal hook runs; the pending
    /// queue is not touched.
    pub fn post_completion(&mut self, id: ReqId) -> Result<()> {
        if self.requests.get(id).is_none() {
            return Err(CoreError::UnknownRequest(id));
        }
        if let Err(code) = self.port.post(CompletionEvent::synthetic(id)) {
            (self.fatal)(&FatalError::new(code, "post_queued_completion"));
        }
        self.stats.posted += 1;
        Ok(())
    }

    // ── Poll / drain ──

    /// Retrieve up to `max_events_per_poll` port events and move their
    /// requests onto the pending queue.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<usize> {
        let mut events = std::mem::take(&mut self.events);
        events.clear();
        let polled = self.port.poll(&mut events, self.config.max_events_per_poll, timeout);
        let n = match polled {
            Ok(n) => n,
            Err(e) => {
                self.events = events;
                return Err(e);
            }
        };
        for ev in events.drain(..) {
            self.complete_event(ev);
        }
        self.events = events;
        self.stats.polled += n as u64;
        Ok(n)
    }

    fn complete_event(&mut self, ev: CompletionEvent) {
        let Some(req) = self.requests.get_mut(ev.req) else {
            kwarn!("dropping completion for unknown {}", ev.req);
            self.stats.dropped += 1;
            return;
        };
        if req.next().is_some() {
            kwarn!("dropping duplicate completion for pending {}", ev.req);
            self.stats.dropped += 1;
            return;
        }
        if let Some(status) = ev.status {
            req.set_status(status);
            req.set_bytes(ev.bytes);
        }
        if let Err(e) = self.pending.insert(&mut self.requests, ev.req) {
            kwarn!("dropping completion for {}: {}", ev.req, e);
            self.stats.dropped += 1;
        }
    }

    /// Dispatch every request that was pending when the call started,
    /// head first. Returns the number dispatched.
    pub fn process_reqs(&mut self) -> usize {
        let batch = self.pending.len();
        let mut n = 0;
        while n < batch {
            let Some(id) = self.pending.pop_front(&mut self.requests) else {
                break;
            };
            n += 1;
            let Some(mut req) = self.requests.remove(id) else {
                continue;
            };
            let done = Completion::from_request(id, &req);
            let registered = req.is_registered();
            let callback = req.take_payload();
            drop(req);

            if let Some(cb) = callback {
                cb(self, done);
            }
            if registered {
                self.release_handle_req(done.handle);
            }
        }
        self.stats.dispatched += n as u64;
        n
    }

    /// Whether anything can still produce a callback.
    pub fn alive(&self) -> bool {
        self.counters.has_work() || !self.pending.is_empty()
    }

    /// Drain, poll, drain. The poll does not wait when requests are
    /// already pending.
    pub fn run_once(&mut self, timeout: Option<Duration>) -> Result<usize> {
        let mut n = self.process_reqs();
        let wait = if self.pending.is_empty() { timeout } else { Some(Duration::ZERO) };
        self.poll(wait)?;
        n += self.process_reqs();
        Ok(n)
    }

    /// Iterate until nothing keeps the loop alive.
    pub fn run(&mut self) -> Result<()> {
        let timeout = Some(self.config.poll_timeout);
        while self.alive() {
            self.run_once(timeout)?;
        }
        kdebug!("loop exhausted: {:?}", self.stats);
        Ok(())
    }
}

impl<P: CompletionPort> Drop for EventLoop<P> {
    fn drop(&mut self) {
        if !self.pending.is_empty() || self.counters.active_reqs > 0 {
            kwarn!(
                "loop dropped with {} pending, {} outstanding requests",
                self.pending.len(),
                self.counters.active_reqs
            );
        }
    }
}
