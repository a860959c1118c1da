//! Handle activity counters.
//!
//! Every registered request keeps its handle active and the loop alive.
//! `register_handle_req` / `unregister_handle_req` must be paired exactly
//! once per request: a missing unregister leaks liveness (the handle never
//! stops, the loop never runs out of work), an extra one corrupts it.

use core::fmt;

use crate::kdebug;

/// Identifier of a handle known to the loop.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HandleId(u32);

impl HandleId {
    pub const NONE: HandleId = HandleId(u32::MAX);

    #[inline]
    pub const fn new(id: u32) -> Self {
        HandleId(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == u32::MAX {
            write!(f, "HandleId(NONE)")
        } else {
            write!(f, "HandleId({})", self.0)
        }
    }
}

/// Handle flags.
pub mod handle_flags {
    /// Operations that succeed immediately skip the completion port.
    pub const SYNC_BYPASS: u32 = 1 << 0;
    /// Handle has at least one active request.
    pub const ACTIVE: u32 = 1 << 1;
    /// Active handle keeps the loop alive.
    pub const REF: u32 = 1 << 2;
    /// Close requested; released once no requests remain.
    pub const CLOSING: u32 = 1 << 3;
}

/// Loop-wide aggregate counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopCounters {
    /// Outstanding registered requests across all handles.
    pub active_reqs: u32,
    /// Handles that are active and referenced.
    pub active_handles: u32,
}

impl LoopCounters {
    pub const fn new() -> Self {
        Self { active_reqs: 0, active_handles: 0 }
    }

    /// Whether the counters alone keep the loop alive.
    #[inline]
    pub fn has_work(&self) -> bool {
        self.active_reqs > 0 || self.active_handles > 0
    }
}

/// Per-handle activity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleActivity {
    active: u32,
    flags: u32,
}

impl HandleActivity {
    /// New, inactive, referenced handle.
    pub fn new(flags: u32) -> Self {
        Self {
            active: 0,
            flags: (flags | handle_flags::REF) & !handle_flags::ACTIVE,
        }
    }

    #[inline]
    pub fn active_count(&self) -> u32 {
        self.active
    }

    #[inline]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.has_flag(handle_flags::ACTIVE)
    }

    #[inline]
    pub fn is_ref(&self) -> bool {
        self.has_flag(handle_flags::REF)
    }

    pub fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Reference or unreference the handle.
    ///
    /// Only active handles contribute to `active_handles`, so the counter
    /// moves only when the handle is currently active.
    pub fn set_ref(&mut self, counters: &mut LoopCounters, referenced: bool) {
        if self.is_ref() == referenced {
            return;
        }
        self.set_flag(handle_flags::REF, referenced);
        if self.is_active() {
            if referenced {
                counters.active_handles += 1;
            } else {
                counters.active_handles = counters.active_handles.saturating_sub(1);
            }
        }
    }

    fn start(&mut self, counters: &mut LoopCounters) {
        self.set_flag(handle_flags::ACTIVE, true);
        if self.is_ref() {
            counters.active_handles += 1;
        }
    }

    fn stop(&mut self, counters: &mut LoopCounters) {
        self.set_flag(handle_flags::ACTIVE, false);
        if self.is_ref() {
            counters.active_handles = counters.active_handles.saturating_sub(1);
        }
    }
}

/// Count one more outstanding request against `handle` and the loop.
///
/// Call once per request, before it can possibly complete.
pub fn register_handle_req(counters: &mut LoopCounters, handle: &mut HandleActivity) {
    handle.active += 1;
    if handle.active == 1 {
        handle.start(counters);
    }
    counters.active_reqs += 1;
}

/// Inverse of [`register_handle_req`]. Call once per request at final
/// disposal, whatever the outcome.
pub fn unregister_handle_req(counters: &mut LoopCounters, handle: &mut HandleActivity) {
    debug_assert!(handle.active > 0, "unregister without matching register");
    debug_assert!(counters.active_reqs > 0, "loop request count underflow");

    if handle.active == 0 {
        kdebug!("unbalanced unregister ignored");
        return;
    }
    handle.active -= 1;
    if handle.active == 0 {
        handle.stop(counters);
    }
    counters.active_reqs = counters.active_reqs.saturating_sub(1);
}
