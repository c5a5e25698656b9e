/// Fixed-size binding table with per-slot dirty bits

/// Iterator over the set bits of a mask, lowest first
#[derive(Debug, Clone, Copy)]
pub struct BitIter(u64);

impl BitIter {
    pub fn new(mask: u64) -> Self {
        Self(mask)
    }
}

impl Iterator for BitIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(index)
    }
}

/// `N` binding slots, each optionally holding a `T`.
///
/// Setting a slot to a value equal to the one it already holds leaves the
/// slot clean. Indices outside `0..N` panic.
#[derive(Debug, Clone)]
pub struct SlotTable<T, const N: usize> {
    slots: [Option<T>; N],
    dirty: u64,
}

impl<T: PartialEq, const N: usize> SlotTable<T, N> {
    const CAPACITY_CHECK: () = assert!(N <= 64, "SlotTable supports at most 64 slots");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CAPACITY_CHECK;
        Self {
            slots: std::array::from_fn(|_| None),
            dirty: 0,
        }
    }

    fn check_index(index: usize) {
        assert!(index < N, "Binding slot {} out of range (max {})", index, N);
    }

    /// Store `value` in slot `index`; returns whether the slot changed
    pub fn set(&mut self, index: usize, value: Option<T>) -> bool {
        Self::check_index(index);
        if self.slots[index] == value {
            return false;
        }
        self.slots[index] = value;
        self.dirty |= 1 << index;
        true
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        Self::check_index(index);
        self.slots[index].as_ref()
    }

    /// Force a slot to be re-issued at the next flush
    pub fn mark_dirty(&mut self, index: usize) {
        Self::check_index(index);
        self.dirty |= 1 << index;
    }

    /// Mark every occupied slot dirty (after the consumer lost its state)
    pub fn mark_bound_dirty(&mut self) {
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.is_some() {
                self.dirty |= 1 << i;
            }
        }
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        Self::check_index(index);
        self.dirty & (1 << index) != 0
    }

    pub fn dirty_mask(&self) -> u64 {
        self.dirty
    }

    /// Return the dirty slots and clear their bits
    pub fn take_dirty(&mut self) -> BitIter {
        let mask = self.dirty;
        self.dirty = 0;
        BitIter::new(mask)
    }

    /// Hand each dirty slot to `issue`, lowest first.
    ///
    /// A slot's bit is cleared only once `issue` accepts it; after an error
    /// the failing slot and every later one are still dirty.
    pub fn flush_dirty<E>(
        &mut self,
        mut issue: impl FnMut(usize, Option<&T>) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        for index in BitIter::new(self.dirty) {
            issue(index, self.slots[index].as_ref())?;
            self.dirty &= !(1u64 << index);
        }
        Ok(())
    }

    /// Forget every binding
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.dirty = 0;
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<T: PartialEq, const N: usize> Default for SlotTable<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "slot_table_tests.rs"]
mod tests;
