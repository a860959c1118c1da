//! Loop-owned handle records.
//!
//! Same slot discipline as the request table: `Vec<Option<_>>` plus a
//! LIFO free stack, ids are slot indices.

use iocomp_core::activity::{HandleActivity, HandleId};
use iocomp_core::error::{CoreError, Result};

#[derive(Debug, Default)]
pub struct HandleTable {
    slots: Vec<Option<HandleActivity>>,
    free: Vec<u32>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, activity: HandleActivity) -> HandleId {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(activity);
                HandleId::new(idx)
            }
            None => {
                let idx = self.slots.len() as u32;
                self.slots.push(Some(activity));
                HandleId::new(idx)
            }
        }
    }

    pub fn remove(&mut self, id: HandleId) -> Option<HandleActivity> {
        let taken = self.slots.get_mut(id.as_usize())?.take();
        if taken.is_some() {
            self.free.push(id.as_u32());
        }
        taken
    }

    pub fn get(&self, id: HandleId) -> Option<&HandleActivity> {
        self.slots.get(id.as_usize())?.as_ref()
    }

    pub fn try_get_mut(&mut self, id: HandleId) -> Result<&mut HandleActivity> {
        self.slots
            .get_mut(id.as_usize())
            .and_then(Option::as_mut)
            .ok_or(CoreError::UnknownHandle(id))
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
