use crate::error::{QueueError, Result};

/// Fixed-capacity slot array plus the cursor arithmetic shared by both queues.
///
/// Cursors are stamps: `lap * one_lap + index`, where `one_lap` is the
/// smallest power of two not below the capacity. The index selects a slot, the
/// lap part only ever grows, so a stalled thread holding an old stamp can never
/// mistake a slot from a later lap for the one it read.
pub(crate) struct Ring<S> {
    slots: Box<[S]>,
    one_lap: usize,
}

impl<S> Ring<S> {
    pub(crate) fn new(capacity: usize, make_slot: impl FnMut(usize) -> S) -> Result<Self> {
        if capacity < 2 {
            return Err(QueueError::InvalidCapacity { capacity });
        }
        let one_lap = capacity
            .checked_next_power_of_two()
            .ok_or(QueueError::InvalidCapacity { capacity })?;
        let slots = (0..capacity)
            .map(make_slot)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Self { slots, one_lap })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn one_lap(&self) -> usize {
        self.one_lap
    }

    #[inline]
    pub(crate) fn index(&self, stamp: usize) -> usize {
        stamp & (self.one_lap - 1)
    }

    /// Next position after `stamp`, rolling into the next lap after the last slot.
    #[inline]
    pub(crate) fn increment(&self, stamp: usize) -> usize {
        if self.index(stamp) + 1 < self.capacity() {
            stamp + 1
        } else {
            (stamp & !(self.one_lap - 1)).wrapping_add(self.one_lap)
        }
    }

    /// `next_put` is `increment(put)`; full when it lands on `take` one lap later.
    #[inline]
    pub(crate) fn is_full(&self, next_put: usize, take: usize) -> bool {
        next_put == take.wrapping_add(self.one_lap)
    }

    #[inline]
    pub(crate) fn len(&self, take: usize, put: usize) -> usize {
        let cap = self.capacity();
        (self.index(put) + cap - self.index(take)) % cap
    }

    #[inline]
    pub(crate) fn slot(&self, stamp: usize) -> &S {
        &self.slots[self.index(stamp)]
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [S] {
        &mut self.slots
    }
}
