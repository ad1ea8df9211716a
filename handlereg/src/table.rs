//! Composite handle table
//!
//! One vector of slots, one capacity. Slots are appended, never compacted and
//! never reused: retiring an entry empties its slot and bumps the slot's
//! generation. The table itself is not synchronized; registries wrap it in a
//! `parking_lot::RwLock`.

use crate::growth;
use crate::handle::Handle;

struct Slot<T> {
    generation: u32,
    entry: Option<T>,
}

/// Append-only table of entries addressed by [`Handle`]
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    allocated: usize,
    live: usize,
}

impl<T> HandleTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            allocated: 0,
            live: 0,
        }
    }

    /// Table with room for `page` entries before the first growth step.
    #[must_use]
    pub fn with_page(page: usize) -> Self {
        let slots = Vec::with_capacity(page);
        let allocated = slots.capacity();
        Self {
            slots,
            allocated,
            live: 0,
        }
    }

    /// Number of slots ever appended (live and retired).
    #[must_use]
    pub fn used(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding an entry.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Current capacity.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Append an entry, growing the table first if it is full.
    ///
    /// # Panics
    /// Panics if the table would exceed `u32::MAX` slots.
    pub fn insert(&mut self, entry: T) -> Handle {
        if self.slots.len() == self.allocated {
            growth::grow(&mut self.slots, &mut self.allocated);
        }
        let index = u32::try_from(self.slots.len()).expect("handle table index overflow");
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        self.live += 1;
        debug_assert!(self.slots.len() <= self.allocated);
        Handle::new(index, 0)
    }

    /// Entry behind `handle`, if the handle is current.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_ref())
    }

    /// Take the entry out of its slot and invalidate every outstanding handle
    /// to it. Returns `None` for stale handles.
    pub fn retire(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.live -= 1;
        Some(entry)
    }

    /// Index of the first live entry matching `pred`.
    pub fn position(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.entry.as_ref().is_some_and(&mut pred))
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.entry.as_ref())
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
