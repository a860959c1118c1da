//! Request table
//!
//! Arena of request slots addressed by `ReqId`. Freed slots go on a LIFO
//! stack so recently released ids (and their cache lines) are reused first.
//! Loop-thread only: no locking.

use crate::error::{CoreError, Result};
use crate::request::{ReqId, Request};

/// Read/write access to the intrusive `next` link of a request.
///
/// The pending queue only needs this, not the whole table.
pub trait ReqLinks {
    fn contains(&self, id: ReqId) -> bool;
    fn next_of(&self, id: ReqId) -> Option<ReqId>;
    fn set_next(&mut self, id: ReqId, next: Option<ReqId>);
}

struct Slot<C> {
    gen: u32,
    req: Option<Request<C>>,
}

pub struct RequestTable<C = ()> {
    slots: Vec<Slot<C>>,
    free: Vec<u32>,
    max_slots: u32,
    live: usize,
}

impl<C> RequestTable<C> {
    /// Table holding at most `max_slots` live requests.
    pub fn new(max_slots: usize) -> Self {
        let max_slots = max_slots.min(u32::MAX as usize - 1) as u32;
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            max_slots,
            live: 0,
        }
    }

    /// Store a request, returning its id.
    pub fn insert(&mut self, req: Request<C>) -> Result<ReqId> {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.req = Some(req);
            self.live += 1;
            return Ok(ReqId::with_gen(idx, slot.gen));
        }
        let idx = self.slots.len();
        if idx >= self.max_slots as usize {
            return Err(CoreError::TableFull);
        }
        self.slots.push(Slot { gen: 0, req: Some(req) });
        self.live += 1;
        Ok(ReqId::new(idx as u32))
    }

    /// Take a request out of the table. The slot becomes reusable under
    /// the next generation; `id` no longer resolves.
    pub fn remove(&mut self, id: ReqId) -> Option<Request<C>> {
        let slot = self.slots.get_mut(id.as_usize())?;
        if slot.gen != id.generation() {
            return None;
        }
        let req = slot.req.take()?;
        slot.gen = slot.gen.wrapping_add(1);
        self.free.push(id.as_u32());
        self.live -= 1;
        Some(req)
    }

    #[inline]
    pub fn get(&self, id: ReqId) -> Option<&Request<C>> {
        self.slots
            .get(id.as_usize())
            .filter(|s| s.gen == id.generation())
            .and_then(|s| s.req.as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, id: ReqId) -> Option<&mut Request<C>> {
        self.slots
            .get_mut(id.as_usize())
            .filter(|s| s.gen == id.generation())
            .and_then(|s| s.req.as_mut())
    }

    /// Like `get_mut`, but as a `Result` for `?` call sites.
    pub fn try_get_mut(&mut self, id: ReqId) -> Result<&mut Request<C>> {
        self.get_mut(id).ok_or(CoreError::UnknownRequest(id))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }
}

impl<C> ReqLinks for RequestTable<C> {
    #[inline]
    fn contains(&self, id: ReqId) -> bool {
        self.get(id).is_some()
    }

    #[inline]
    fn next_of(&self, id: ReqId) -> Option<ReqId> {
        self.get(id).and_then(|r| r.next)
    }

    #[inline]
    fn set_next(&mut self, id: ReqId, next: Option<ReqId>) {
        if let Some(r) = self.get_mut(id) {
            r.next = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::HandleId;
    use crate::request::ReqKind;

    fn req() -> Request {
        Request::new(HandleId::new(0), ReqKind::Custom)
    }

    #[test]
    fn insert_and_remove() {
        let mut t = RequestTable::new(8);
        let a = t.insert(req()).unwrap();
        let b = t.insert(req()).unwrap();
        assert_ne!(a, b);
        assert_eq!(t.len(), 2);
        assert!(t.remove(a).is_some());
        assert!(t.remove(a).is_none());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn lifo_reuse() {
        let mut t = RequestTable::new(8);
        let a = t.insert(req()).unwrap();
        let b = t.insert(req()).unwrap();
        t.remove(a);
        t.remove(b);
        assert_eq!(t.insert(req()).unwrap().as_u32(), b.as_u32());
        assert_eq!(t.insert(req()).unwrap().as_u32(), a.as_u32());
    }

    #[test]
    fn stale_id_does_not_reach_new_occupant() {
        let mut t = RequestTable::new(8);
        let old = t.insert(req()).unwrap();
        t.remove(old);
        let new = t.insert(req()).unwrap();
        assert_eq!(new.as_u32(), old.as_u32());
        assert_ne!(new.generation(), old.generation());

        assert!(t.get(old).is_none());
        assert!(t.get_mut(old).is_none());
        assert!(!t.contains(old));
        assert!(t.remove(old).is_none());
        assert!(t.get(new).is_some());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn capacity_enforced() {
        let mut t = RequestTable::new(2);
        t.insert(req()).unwrap();
        t.insert(req()).unwrap();
        assert!(matches!(t.insert(req()), Err(CoreError::TableFull)));
    }

    #[test]
    fn unknown_ids() {
        let mut t: RequestTable = RequestTable::new(2);
        assert!(t.get(ReqId::new(5)).is_none());
        assert!(t.get(ReqId::NONE).is_none());
        assert!(matches!(
            t.try_get_mut(ReqId::new(1)),
            Err(CoreError::UnknownRequest(_))
        ));
    }
}
