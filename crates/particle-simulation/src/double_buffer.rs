//! Two backing allocations with a single published index.
//!
//! Writers only ever touch the inactive slot; `publish` flips the index after
//! the write has been recorded. Readers that grabbed the active slot earlier
//! keep seeing unchanged data until the following regeneration.

/// Which of the two slots to address, relative to the current publish state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferSlot {
    Active,
    Inactive,
}

#[derive(Debug)]
pub struct DoubleBuffer<T> {
    slots: [Option<T>; 2],
    active: usize,
    generation: u64,
}

impl<T> Default for DoubleBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DoubleBuffer<T> {
    pub fn new() -> Self {
        Self {
            slots: [None, None],
            active: 0,
            generation: 0,
        }
    }

    fn index(&self, slot: BufferSlot) -> usize {
        match slot {
            BufferSlot::Active => self.active,
            BufferSlot::Inactive => 1 - self.active,
        }
    }

    pub fn get(&self, slot: BufferSlot) -> Option<&T> {
        self.slots[self.index(slot)].as_ref()
    }

    pub fn active(&self) -> Option<&T> {
        self.get(BufferSlot::Active)
    }

    /// Mutable access to the inactive slot.
    ///
    /// `init` runs when the slot is empty or `reuse` rejects the existing
    /// allocation; otherwise the existing value is handed back for writing.
    pub fn write_inactive(
        &mut self,
        reuse: impl FnOnce(&T) -> bool,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        let index = 1 - self.active;
        let slot = &mut self.slots[index];
        if !slot.as_ref().is_some_and(reuse) {
            *slot = None;
        }
        slot.get_or_insert_with(init)
    }

    /// Make the inactive slot active. No-op while it is empty.
    pub fn publish(&mut self) -> bool {
        if self.slots[1 - self.active].is_none() {
            return false;
        }
        self.active = 1 - self.active;
        self.generation += 1;
        true
    }

    /// Bumped on every successful publish.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.active().is_some()
    }
}
