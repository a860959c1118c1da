//! Event loop configuration.
//!
//! # Environment Variables
//!
//! | Variable                 | Default | Description                         |
//! |--------------------------|---------|-------------------------------------|
//! | `IOCOMP_PORT_CAPACITY`   | 4096    | Completion port queue capacity      |
//! | `IOCOMP_MAX_EVENTS`      | 128     | Events retrieved per poll           |
//! | `IOCOMP_POLL_TIMEOUT_MS` | 100     | Poll wait used by `EventLoop::run`  |
//! | `IOCOMP_MAX_REQUESTS`    | 65536   | Live request slots                  |
//! | `IOCOMP_DEBUG`           | false   | Raise log level to debug            |

use std::time::Duration;

use iocomp_core::env::{env_get, env_get_bool, env_get_ms};
use iocomp_core::fatal::{abort_on_fatal, FatalHook};

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    pub const PORT_CAPACITY: usize = 4096;
    pub const MAX_EVENTS_PER_POLL: usize = 128;
    pub const POLL_TIMEOUT: Duration = Duration::from_millis(100);
    pub const MAX_REQUESTS: usize = 65536;
    pub const DEBUG_LOGGING: bool = false;
}

#[derive(Clone)]
pub struct LoopConfig {
    /// Completion port queue capacity.
    pub port_capacity: usize,

    /// Events pulled from the port per poll.
    pub max_events_per_poll: usize,

    /// Wait used by `run()` when nothing is pending.
    pub poll_timeout: Duration,

    /// Live request slots in the request table.
    pub max_requests: usize,

    pub debug_logging: bool,

    /// Called when a synthetic completion cannot be posted.
    pub fatal_hook: FatalHook,
}

impl LoopConfig {
    /// Create configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            port_capacity: env_get("IOCOMP_PORT_CAPACITY", defaults::PORT_CAPACITY),
            max_events_per_poll: env_get("IOCOMP_MAX_EVENTS", defaults::MAX_EVENTS_PER_POLL),
            poll_timeout: env_get_ms("IOCOMP_POLL_TIMEOUT_MS", defaults::POLL_TIMEOUT),
            max_requests: env_get("IOCOMP_MAX_REQUESTS", defaults::MAX_REQUESTS),
            debug_logging: env_get_bool("IOCOMP_DEBUG", defaults::DEBUG_LOGGING),
            fatal_hook: abort_on_fatal,
        }
    }

    /// Defaults only, environment ignored.
    pub fn new() -> Self {
        Self {
            port_capacity: defaults::PORT_CAPACITY,
            max_events_per_poll: defaults::MAX_EVENTS_PER_POLL,
            poll_timeout: defaults::POLL_TIMEOUT,
            max_requests: defaults::MAX_REQUESTS,
            debug_logging: defaults::DEBUG_LOGGING,
            fatal_hook: abort_on_fatal,
        }
    }

    // Builder methods

    pub fn port_capacity(mut self, n: usize) -> Self {
        self.port_capacity = n;
        self
    }

    pub fn max_events_per_poll(mut self, n: usize) -> Self {
        self.max_events_per_poll = n;
        self
    }

    pub fn poll_timeout(mut self, d: Duration) -> Self {
        self.poll_timeout = d;
        self
    }

    pub fn max_requests(mut self, n: usize) -> Self {
        self.max_requests = n;
        self
    }

    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    pub fn fatal_hook(mut self, hook: FatalHook) -> Self {
        self.fatal_hook = hook;
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.port_capacity == 0 {
            return Err("port_capacity must be > 0");
        }
        if self.max_events_per_poll == 0 {
            return Err("max_events_per_poll must be > 0");
        }
        if self.max_requests == 0 {
            return Err("max_requests must be > 0");
        }
        if self.max_requests > u32::MAX as usize {
            return Err("max_requests must fit in u32");
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        eprintln!("iocomp loop configuration:");
        eprintln!("  port_capacity:        {}", self.port_capacity);
        eprintln!("  max_events_per_poll:  {}", self.max_events_per_poll);
        eprintln!("  poll_timeout:         {:?}", self.poll_timeout);
        eprintln!("  max_requests:         {}", self.max_requests);
        eprintln!("  debug_logging:        {}", self.debug_logging);
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoopConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopConfig")
            .field("port_capacity", &self.port_capacity)
            .field("max_events_per_poll", &self.max_events_per_poll)
            .field("poll_timeout", &self.poll_timeout)
            .field("max_requests", &self.max_requests)
            .field("debug_logging", &self.debug_logging)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = LoopConfig::new();
        assert_eq!(config.port_capacity, defaults::PORT_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("IOCOMP_MAX_EVENTS", "7");
        let config = LoopConfig::from_env();
        std::env::remove_var("IOCOMP_MAX_EVENTS");
        assert_eq!(config.max_events_per_poll, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = LoopConfig::new()
            .port_capacity(16)
            .poll_timeout(Duration::from_millis(5))
            .debug_logging(true);

        assert_eq!(config.port_capacity, 16);
        assert_eq!(config.poll_timeout, Duration::from_millis(5));
        assert!(config.debug_logging);
    }

    #[test]
    fn test_validation() {
        assert!(LoopConfig::new().port_capacity(0).validate().is_err());
        assert!(LoopConfig::new().max_events_per_poll(0).validate().is_err());
        assert!(LoopConfig::new().max_requests(0).validate().is_err());
    }
}
