//! `Notifier` implementations.
//!
//! Both coalesce: any number of `notify()` calls before a `wait()` leave
//! exactly one wakeup behind.
//!
//! - `EventFdNotifier` (Linux): eventfd counter, `poll(2)` to wait.
//! - `CondvarNotifier`: `Mutex<bool>` + `Condvar`, everywhere else.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use iocomp_core::error::Result;
use iocomp_core::port::Notifier;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        pub use self::eventfd::EventFdNotifier;
        /// Notifier the default `QueuePort` is built with.
        pub type DefaultNotifier = EventFdNotifier;

        /// Create the platform default notifier.
        pub fn default_notifier() -> Result<DefaultNotifier> {
            EventFdNotifier::create()
        }
    } else {
        /// Notifier the default `QueuePort` is built with.
        pub type DefaultNotifier = CondvarNotifier;

        /// Create the platform default notifier.
        pub fn default_notifier() -> Result<DefaultNotifier> {
            Ok(CondvarNotifier::new())
        }
    }
}

#[cfg(target_os = "linux")]
mod eventfd {
    use std::os::unix::io::RawFd;
    use std::time::Duration;

    use iocomp_core::error::{CoreError, Result};
    use iocomp_core::port::Notifier;
    use nix::errno::Errno;

    pub struct EventFdNotifier {
        fd: RawFd,
    }

    impl EventFdNotifier {
        /// Create a non-blocking, close-on-exec eventfd. Closed on drop.
        pub fn create() -> Result<Self> {
            let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
            if fd < 0 {
                return Err(CoreError::Os(Errno::last() as i32));
            }
            Ok(Self { fd })
        }

        pub fn fd(&self) -> RawFd {
            self.fd
        }

        /// Read and reset the counter. `false` if it was already zero.
        fn drain(&self) -> Result<bool> {
            let mut val: u64 = 0;
            let ret = unsafe {
                libc::read(
                    self.fd,
                    &mut val as *mut u64 as *mut libc::c_void,
                    std::mem::size_of::<u64>(),
                )
            };
            if ret < 0 {
                return match Errno::last() {
                    Errno::EAGAIN => Ok(false),
                    e => Err(CoreError::Os(e as i32)),
                };
            }
            Ok(val > 0)
        }
    }

    impl Notifier for EventFdNotifier {
        fn notify(&self) -> Result<()> {
            let val: u64 = 1;
            let ret = unsafe {
                libc::write(
                    self.fd,
                    &val as *const u64 as *const libc::c_void,
                    std::mem::size_of::<u64>(),
                )
            };
            if ret < 0 {
                // EAGAIN: counter saturated, a wakeup is already pending.
                return match Errno::last() {
                    Errno::EAGAIN => Ok(()),
                    e => Err(CoreError::Os(e as i32)),
                };
            }
            Ok(())
        }

        fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
            let mut pfd = libc::pollfd { fd: self.fd, events: libc::POLLIN, revents: 0 };
            let ret = unsafe { libc::poll(&mut pfd, 1, poll_timeout_ms(timeout)) };
            if ret < 0 {
                return match Errno::last() {
                    Errno::EINTR => Ok(false),
                    e => Err(CoreError::Os(e as i32)),
                };
            }
            if ret == 0 {
                return Ok(false);
            }
            self.drain()
        }
    }

    /// `poll(2)` timeout. Sub-millisecond remainders round up so a short
    /// wait still sleeps instead of returning at once.
    pub(super) fn poll_timeout_ms(timeout: Option<Duration>) -> libc::c_int {
        match timeout {
            None => -1,
            Some(d) => {
                let ms = (d.as_nanos() + 999_999) / 1_000_000;
                ms.min(libc::c_int::MAX as u128) as libc::c_int
            }
        }
    }

    impl Drop for EventFdNotifier {
        fn drop(&mut self) {
            if self.fd >= 0 {
                unsafe { libc::close(self.fd); }
                self.fd = -1;
            }
        }
    }
}

/// Portable notifier: a sticky flag under a mutex.
pub struct CondvarNotifier {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl CondvarNotifier {
    pub fn new() -> Self {
        Self { signaled: Mutex::new(false), cond: Condvar::new() }
    }
}

impl Default for CondvarNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for CondvarNotifier {
    fn notify(&self) -> Result<()> {
        let mut signaled = self.signaled.lock().unwrap_or_else(|e| e.into_inner());
        *signaled = true;
        drop(signaled);
        self.cond.notify_one();
        Ok(())
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
        let mut signaled = self.signaled.lock().unwrap_or_else(|e| e.into_inner());
        match timeout {
            None => {
                while !*signaled {
                    signaled = self.cond.wait(signaled).unwrap_or_else(|e| e.into_inner());
                }
            }
            Some(t) => {
                let deadline = Instant::now() + t;
                while !*signaled {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(false);
                    }
                    let (guard, _) = self
                        .cond
                        .wait_timeout(signaled, deadline - now)
                        .unwrap_or_else(|e| e.into_inner());
                    signaled = guard;
                }
            }
        }
        *signaled = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn check_coalesce<N: Notifier>(n: &N) {
        n.notify().unwrap();
        n.notify().unwrap();
        n.notify().unwrap();
        assert!(n.wait(Some(Duration::ZERO)).unwrap());
        assert!(!n.wait(Some(Duration::from_millis(10))).unwrap());
    }

    #[test]
    fn test_condvar_coalesces() {
        check_coalesce(&CondvarNotifier::new());
    }

    #[test]
    fn test_condvar_times_out() {
        let n = CondvarNotifier::new();
        let start = Instant::now();
        assert!(!n.wait(Some(Duration::from_millis(20))).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_condvar_cross_thread_wakeup() {
        let n = Arc::new(CondvarNotifier::new());
        let n2 = Arc::clone(&n);
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            n2.notify().unwrap();
        });
        assert!(n.wait(None).unwrap());
        t.join().unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_eventfd_coalesces() {
        let n = EventFdNotifier::create().unwrap();
        assert!(n.fd() >= 0);
        check_coalesce(&n);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_eventfd_timeout_rounds_up() {
        use super::eventfd::poll_timeout_ms;
        assert_eq!(poll_timeout_ms(None), -1);
        assert_eq!(poll_timeout_ms(Some(Duration::ZERO)), 0);
        assert_eq!(poll_timeout_ms(Some(Duration::from_micros(1))), 1);
        assert_eq!(poll_timeout_ms(Some(Duration::from_micros(500))), 1);
        assert_eq!(poll_timeout_ms(Some(Duration::from_millis(3))), 3);
        assert_eq!(poll_timeout_ms(Some(Duration::from_micros(3_001))), 4);
        assert_eq!(poll_timeout_ms(Some(Duration::from_secs(u64::MAX))), libc::c_int::MAX);

        let n = EventFdNotifier::create().unwrap();
        let start = Instant::now();
        assert!(!n.wait(Some(Duration::from_micros(500))).unwrap());
        assert!(start.elapsed() >= Duration::from_micros(500));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_eventfd_cross_thread_wakeup() {
        let n = Arc::new(EventFdNotifier::create().unwrap());
        let n2 = Arc::clone(&n);
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            n2.notify().unwrap();
        });
        assert!(n.wait(Some(Duration::from_secs(5))).unwrap());
        t.join().unwrap();
    }

    #[test]
    fn test_default_notifier_creates() {
        let n = default_notifier().unwrap();
        assert!(!n.wait(Some(Duration::ZERO)).unwrap());
    }
}
