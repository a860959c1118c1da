//! Pending-completion queue.
//!
//! Requests whose completion is ready for dispatch, in strict FIFO order.
//! The list is circular and singly linked through each request's own
//! `next` field, and reachable only through `tail`:
//!
//! ```text
//!         tail ──► [C] ──next──► [A] ──next──► [B] ──next──┐
//!                   ▲             head                       │
//!                   └────────────────────────────────────────┘
//! ```
//!
//! `tail.next` is the head. Appending links after the tail and moves the
//! tail; popping detaches `tail.next`. Both are O(1) with no allocation.
//!
//! Not thread-safe. Completions produced on other threads must travel
//! through the completion port and be inserted by the loop thread.

use crate::error::{CoreError, Result};
use crate::request::ReqId;
use crate::table::ReqLinks;

#[derive(Debug, Default)]
pub struct PendingQueue {
    tail: Option<ReqId>,
    len: usize,
}

impl PendingQueue {
    pub const fn new() -> Self {
        Self { tail: None, len: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn tail(&self) -> Option<ReqId> {
        self.tail
    }

    /// Next request to be dispatched.
    #[inline]
    pub fn head<L: ReqLinks>(&self, links: &L) -> Option<ReqId> {
        self.tail.and_then(|t| links.next_of(t))
    }

    /// Append `id` after the current tail.
    ///
    /// # Panics
    ///
    /// In debug builds, if `id` is already linked into this queue. The
    /// check runs before any link is written, so the queue is intact when
    /// the panic unwinds.
    pub fn insert<L: ReqLinks>(&mut self, links: &mut L, id: ReqId) -> Result<()> {
        if !links.contains(id) {
            return Err(CoreError::UnknownRequest(id));
        }

        match self.tail {
            Some(tail) => {
                #[cfg(debug_assertions)]
                self.assert_not_linked(links, tail, id);

                let head = links.next_of(tail);
                links.set_next(id, head);
                links.set_next(tail, Some(id));
            }
            None => {
                links.set_next(id, Some(id));
            }
        }
        self.tail = Some(id);
        self.len += 1;
        Ok(())
    }

    /// Detach and return the head.
    ///
    /// The returned request is unlinked (`next == None`).
    pub fn pop_front<L: ReqLinks>(&mut self, links: &mut L) -> Option<ReqId> {
        let tail = self.tail?;
        let head = links.next_of(tail)?;
        if head == tail {
            self.tail = None;
        } else {
            let after = links.next_of(head);
            links.set_next(tail, after);
        }
        links.set_next(head, None);
        self.len -= 1;
        Some(head)
    }

    /// Ids from head to tail. For diagnostics and tests.
    pub fn iter<'a, L: ReqLinks>(&self, links: &'a L) -> Iter<'a, L> {
        Iter {
            links,
            tail: self.tail,
            cur: self.head(links),
            done: self.tail.is_none(),
        }
    }

    #[cfg(debug_assertions)]
    fn assert_not_linked<L: ReqLinks>(&self, links: &L, tail: ReqId, id: ReqId) {
        let mut cur = tail;
        loop {
            assert!(cur != id, "{} is already in the pending queue", id);
            match links.next_of(cur) {
                Some(next) if next != tail => cur = next,
                _ => break,
            }
        }
    }
}

pub struct Iter<'a, L> {
    links: &'a L,
    tail: Option<ReqId>,
    cur: Option<ReqId>,
    done: bool,
}

impl<'a, L: ReqLinks> Iterator for Iter<'a, L> {
    type Item = ReqId;

    fn next(&mut self) -> Option<ReqId> {
        if self.done {
            return None;
        }
        let cur = self.cur?;
        if Some(cur) == self.tail {
            self.done = true;
        } else {
            self.cur = self.links.next_of(cur);
        }
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::HandleId;
    use crate::request::{ReqKind, Request};
    use crate::table::RequestTable;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn table_with(n: usize) -> (RequestTable, Vec<ReqId>) {
        let mut t = RequestTable::new(64);
        let ids = (0..n)
            .map(|_| t.insert(Request::new(HandleId::new(0), ReqKind::Custom)).unwrap())
            .collect();
        (t, ids)
    }

    /// Follow links from the head and check the walk returns to the tail.
    fn assert_single_cycle(q: &PendingQueue, t: &RequestTable) {
        let tail = match q.tail() {
            Some(t) => t,
            None => return,
        };
        let mut cur = t.next_of(tail).unwrap();
        let mut steps = 1;
        while cur != tail {
            cur = t.next_of(cur).unwrap();
            steps += 1;
            assert!(steps <= q.len(), "cycle longer than queue");
        }
        assert_eq!(steps, q.len());
    }

    #[test]
    fn empty_queue() {
        let (mut t, _) = table_with(0);
        let mut q = PendingQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.pop_front(&mut t), None);
        assert_eq!(q.head(&t), None);
    }

    #[test]
    fn single_entry_self_loops() {
        let (mut t, ids) = table_with(1);
        let mut q = PendingQueue::new();
        q.insert(&mut t, ids[0]).unwrap();
        assert_eq!(t.next_of(ids[0]), Some(ids[0]));
        assert_eq!(q.tail(), Some(ids[0]));

        assert_eq!(q.pop_front(&mut t), Some(ids[0]));
        assert!(q.is_empty());
        assert_eq!(q.tail(), None);
        assert_eq!(t.next_of(ids[0]), None);
    }

    #[test]
    fn fifo_order_and_single_cycle() {
        for n in [1usize, 2, 3, 7, 32] {
            let (mut t, ids) = table_with(n);
            let mut q = PendingQueue::new();
            for &id in &ids {
                q.insert(&mut t, id).unwrap();
                assert_single_cycle(&q, &t);
            }
            assert_eq!(q.iter(&t).collect::<Vec<_>>(), ids);

            let mut drained = Vec::new();
            while let Some(id) = q.pop_front(&mut t) {
                drained.push(id);
                assert_single_cycle(&q, &t);
            }
            assert_eq!(drained, ids);
            assert!(q.is_empty());
        }
    }

    #[test]
    fn interleaved_insert_and_pop() {
        let (mut t, ids) = table_with(4);
        let mut q = PendingQueue::new();
        q.insert(&mut t, ids[0]).unwrap();
        q.insert(&mut t, ids[1]).unwrap();
        assert_eq!(q.pop_front(&mut t), Some(ids[0]));
        q.insert(&mut t, ids[2]).unwrap();
        q.insert(&mut t, ids[0]).unwrap();
        assert_eq!(q.iter(&t).collect::<Vec<_>>(), vec![ids[1], ids[2], ids[0]]);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let (mut t, _) = table_with(1);
        let mut q = PendingQueue::new();
        assert!(matches!(
            q.insert(&mut t, ReqId::new(9)),
            Err(CoreError::UnknownRequest(_))
        ));
        assert!(q.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "already in the pending queue")]
    fn double_insert_panics() {
        let (mut t, ids) = table_with(2);
        let mut q = PendingQueue::new();
        q.insert(&mut t, ids[0]).unwrap();
        q.insert(&mut t, ids[1]).unwrap();
        let _ = q.insert(&mut t, ids[0]);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn double_insert_leaves_queue_intact() {
        let (mut t, ids) = table_with(3);
        let mut q = PendingQueue::new();
        for &id in &ids {
            q.insert(&mut t, id).unwrap();
        }
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = q.insert(&mut t, ids[1]);
        }));
        assert!(result.is_err());
        assert_eq!(q.len(), 3);
        assert_eq!(q.iter(&t).collect::<Vec<_>>(), ids);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "already in the pending queue")]
    fn double_insert_of_sole_entry_panics() {
        let (mut t, ids) = table_with(1);
        let mut q = PendingQueue::new();
        q.insert(&mut t, ids[0]).unwrap();
        let _ = q.insert(&mut t, ids[0]);
    }
}
