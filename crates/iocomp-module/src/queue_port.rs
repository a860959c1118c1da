//! `QueuePort`: portable in-process completion port.
//!
//! Bounded `ArrayQueue` of `CompletionEvent`s plus a `Notifier`. Any
//! thread may post through a `QueuePoster`; the loop thread is the only
//! consumer. A post pushes first and notifies second, and the notifier is
//! sticky, so a poller that found the queue empty and then waits cannot
//! miss the wakeup.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;

use iocomp_core::codes::{Win32Error, ERROR_INVALID_HANDLE, ERROR_NO_SYSTEM_RESOURCES};
use iocomp_core::error::Result;
use iocomp_core::port::{CompletionEvent, CompletionPort, CompletionPoster, Notifier};
use iocomp_core::{kerror, ktrace};

use crate::notifier::{default_notifier, DefaultNotifier};

struct PortInner<N> {
    queue: ArrayQueue<CompletionEvent>,
    notifier: N,
    closed: AtomicBool,
    posted: AtomicU64,
}

impl<N: Notifier> PortInner<N> {
    fn post(&self, event: CompletionEvent) -> std::result::Result<(), Win32Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ERROR_INVALID_HANDLE);
        }
        self.queue.push(event).map_err(|_| ERROR_NO_SYSTEM_RESOURCES)?;
        self.posted.fetch_add(1, Ordering::Relaxed);
        // The event is queued either way; a poll with a timeout still finds it.
        if let Err(e) = self.notifier.notify() {
            kerror!("port notify failed after queuing {}: {}", event.req, e);
        }
        Ok(())
    }
}

pub struct QueuePort<N: Notifier = DefaultNotifier> {
    inner: Arc<PortInner<N>>,
}

impl QueuePort<DefaultNotifier> {
    /// Port with the platform default notifier.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::with_notifier(capacity, default_notifier()?))
    }
}

impl<N: Notifier> QueuePort<N> {
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn with_notifier(capacity: usize, notifier: N) -> Self {
        Self {
            inner: Arc::new(PortInner {
                queue: ArrayQueue::new(capacity),
                notifier,
                closed: AtomicBool::new(false),
                posted: AtomicU64::new(0),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.queue.capacity()
    }

    /// Refuse further posts and wake a blocked poller. Already queued
    /// events can still be polled.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let _ = self.inner.notifier.notify();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Total events accepted since creation.
    pub fn posted(&self) -> u64 {
        self.inner.posted.load(Ordering::Relaxed)
    }

    fn drain(&self, out: &mut Vec<CompletionEvent>, max: usize) -> usize {
        let mut n = 0;
        while n < max {
            match self.inner.queue.pop() {
                Some(ev) => {
                    out.push(ev);
                    n += 1;
                }
                None => break,
            }
        }
        n
    }
}

impl<N: Notifier + 'static> CompletionPort for QueuePort<N> {
    fn post(&self, event: CompletionEvent) -> std::result::Result<(), Win32Error> {
        self.inner.post(event)
    }

    fn poll(
        &self,
        out: &mut Vec<CompletionEvent>,
        max: usize,
        timeout: Option<Duration>,
    ) -> Result<usize> {
        let n = self.drain(out, max);
        if n > 0 || max == 0 || timeout == Some(Duration::ZERO) {
            return Ok(n);
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if self.is_closed() {
                return Ok(self.drain(out, max));
            }
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            self.inner.notifier.wait(remaining)?;

            let n = self.drain(out, max);
            if n > 0 {
                ktrace!("port: polled {} events", n);
                return Ok(n);
            }
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return Ok(0);
                }
            }
        }
    }

    fn poster(&self) -> Box<dyn CompletionPoster> {
        Box::new(self.queue_poster())
    }

    fn queued(&self) -> usize {
        self.inner.queue.len()
    }
}

impl<N: Notifier> QueuePort<N> {
    /// Typed poster, for callers that want `Clone`.
    pub fn queue_poster(&self) -> QueuePoster<N> {
        QueuePoster { inner: Arc::clone(&self.inner) }
    }
}

/// Cross-thread sending half of a `QueuePort`.
pub struct QueuePoster<N: Notifier = DefaultNotifier> {
    inner: Arc<PortInner<N>>,
}

impl<N: Notifier> Clone for QueuePoster<N> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<N: Notifier> CompletionPoster for QueuePoster<N> {
    fn post(&self, event: CompletionEvent) -> std::result::Result<(), Win32Error> {
        self.inner.post(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::CondvarNotifier;
    use iocomp_core::request::ReqId;
    use iocomp_core::status::STATUS_SUCCESS;
    use std::thread;

    fn ev(id: u32) -> CompletionEvent {
        CompletionEvent::completed(ReqId::new(id), STATUS_SUCCESS, id)
    }

    #[test]
    fn test_post_poll_fifo() {
        let port = QueuePort::new(8).unwrap();
        for i in 0..5 {
            port.post(ev(i)).unwrap();
        }
        assert_eq!(port.queued(), 5);

        let mut out = Vec::new();
        assert_eq!(port.poll(&mut out, 3, Some(Duration::ZERO)).unwrap(), 3);
        assert_eq!(port.poll(&mut out, 16, Some(Duration::ZERO)).unwrap(), 2);
        let ids: Vec<u32> = out.iter().map(|e| e.req.as_u32()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(port.posted(), 5);
    }

    #[test]
    fn test_full_port_rejects() {
        let port = QueuePort::with_notifier(2, CondvarNotifier::new());
        port.post(ev(0)).unwrap();
        port.post(ev(1)).unwrap();
        assert_eq!(port.post(ev(2)), Err(ERROR_NO_SYSTEM_RESOURCES));
        assert_eq!(port.queued(), 2);
    }

    #[test]
    fn test_closed_port_rejects_but_drains() {
        let port = QueuePort::new(4).unwrap();
        port.post(ev(0)).unwrap();
        port.close();
        assert_eq!(port.post(ev(1)), Err(ERROR_INVALID_HANDLE));

        let mut out = Vec::new();
        assert_eq!(port.poll(&mut out, 4, None).unwrap(), 1);
        // Closed and empty: returns instead of blocking forever.
        assert_eq!(port.poll(&mut out, 4, None).unwrap(), 0);
    }

    #[test]
    fn test_poll_timeout_empty() {
        let port = QueuePort::new(4).unwrap();
        let mut out = Vec::new();
        let start = Instant::now();
        assert_eq!(port.poll(&mut out, 4, Some(Duration::from_millis(20))).unwrap(), 0);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_poster_from_other_thread_wakes_poll() {
        let port = QueuePort::new(64).unwrap();
        let poster = port.queue_poster();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            for i in 0..10 {
                poster.post(ev(i)).unwrap();
            }
        });

        let mut out = Vec::new();
        while out.len() < 10 {
            port.poll(&mut out, 64, Some(Duration::from_secs(5))).unwrap();
        }
        t.join().unwrap();
        let ids: Vec<u32> = out.iter().map(|e| e.req.as_u32()).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_boxed_poster() {
        let port = QueuePort::with_notifier(4, CondvarNotifier::new());
        let poster = port.poster();
        poster.post(CompletionEvent::synthetic(ReqId::new(9))).unwrap();
        let mut out = Vec::new();
        port.poll(&mut out, 4, None).unwrap();
        assert_eq!(out[0].status, None);
        assert_eq!(out[0].req, ReqId::new(9));
    }
}
