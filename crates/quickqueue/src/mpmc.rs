use crate::error::{QueueError, Result};
use crate::ring::Ring;
use crate::traits::{Offer, Offered, Poll, QueueState};
use core::fmt;
use core::hint;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};
use crossbeam_epoch::{self as epoch, Guard, Shared};
use crossbeam_utils::CachePadded;
use tracing::{debug, trace};

/// Heap cell carrying one item through one slot for one lap.
///
/// `stamp` is the put cursor the item was installed at; consumers compare it
/// against their own take cursor so a stale reader never drains an item that
/// belongs to a later lap.
struct Node<T> {
    stamp: usize,
    item: ManuallyDrop<T>,
}

/// Slot word for "empty, waiting for the producer at `stamp`". Node pointers
/// are at least word aligned, so an odd word is never a pointer.
#[inline]
fn vacant(stamp: usize) -> usize {
    (stamp << 1) | 1
}

/// Lock-free bounded MPMC queue.
///
/// Every slot is a single atomic word: either a vacancy tag or a pointer to a
/// [`Node`]. Producers install items with one CAS on the slot and then try to
/// advance `put`; consumers drain with one CAS and then try to advance `take`.
/// A thread that finds a peer's slot CAS already done but the cursor not yet
/// moved advances the cursor itself ("helping") before retrying, so no thread
/// waits on another's unfinished bookkeeping.
///
/// Drained nodes are retired through `crossbeam-epoch`, which keeps `peek` and
/// iteration safe against concurrent `poll` and rules out pointer reuse while
/// a reader is pinned.
pub struct MpmcQueue<T> {
    put: CachePadded<AtomicUsize>,
    take: CachePadded<AtomicUsize>,
    ring: Ring<AtomicUsize>,
    _marker: PhantomData<Box<Node<T>>>,
}

unsafe impl<T: Send> Send for MpmcQueue<T> {}
unsafe impl<T: Send> Sync for MpmcQueue<T> {}

impl<T> MpmcQueue<T> {
    /// Create a queue with `capacity` slots, `capacity - 1` of them usable.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let ring = Ring::new(capacity, |index| AtomicUsize::new(vacant(index)))?;
        debug!(capacity, one_lap = ring.one_lap(), "created mpmc queue");
        Ok(Self {
            put: CachePadded::new(AtomicUsize::new(0)),
            take: CachePadded::new(AtomicUsize::new(0)),
            ring,
            _marker: PhantomData,
        })
    }

    pub fn offer<I: Into<Option<T>>>(&self, item: I) -> Result<Offered<T>> {
        let item = item.into().ok_or(QueueError::NullItem)?;
        let put = self.put.load(Ordering::Acquire);
        if self
            .ring
            .is_full(self.ring.increment(put), self.take.load(Ordering::Acquire))
        {
            return Ok(Offered::Full(item));
        }

        let node = Box::into_raw(Box::new(Node {
            stamp: 0,
            item: ManuallyDrop::new(item),
        }));

        loop {
            let put = self.put.load(Ordering::Acquire);
            let next = self.ring.increment(put);
            let take = self.take.load(Ordering::Acquire);
            if self.ring.is_full(next, take) {
                // The node was never published, so it is still ours.
                let node = unsafe { Box::from_raw(node) };
                return Ok(Offered::Full(ManuallyDrop::into_inner(node.item)));
            }

            unsafe { (*node).stamp = put };
            let slot = self.ring.slot(put);
            match slot.compare_exchange(
                vacant(put),
                node as usize,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    // Losing this CAS means a helper already advanced `put` for us.
                    let _ = self
                        .put
                        .compare_exchange(put, next, Ordering::AcqRel, Ordering::Relaxed);
                    return Ok(Offered::Accepted);
                }
                Err(_) => {
                    trace!(put, "slot filled by a peer producer, helping put cursor");
                    let _ = self
                        .put
                        .compare_exchange(put, next, Ordering::AcqRel, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn poll(&self) -> Option<T> {
        let guard = &epoch::pin();
        loop {
            let take = self.take.load(Ordering::Acquire);
            let put = self.put.load(Ordering::Acquire);
            if take == put {
                return None;
            }

            let next = self.ring.increment(take);
            let slot = self.ring.slot(take);
            let word = slot.load(Ordering::Acquire);
            match self.occupant(word, guard) {
                Some(node) if node.stamp == take => {
                    let drained = vacant(take.wrapping_add(self.ring.one_lap()));
                    if slot
                        .compare_exchange(word, drained, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.help_take(take, next);
                        // The slot CAS made this node ours; readers still pinned
                        // on it only ever borrow.
                        let item = unsafe { ptr::read(&*node.item) };
                        unsafe { guard.defer_destroy(Shared::from(word as *const Node<T>)) };
                        return Some(item);
                    }
                    trace!(take, "slot drained by a peer consumer, helping take cursor");
                    self.help_take(take, next);
                }
                Some(_) => {
                    // Snapshot of `take` is from an earlier lap.
                }
                None if self.is_drained(word, take) => {
                    self.help_take(take, next);
                }
                None => {
                    // Producer has not landed its item yet.
                    hint::spin_loop();
                }
            }
        }
    }

    /// Copy of the head item without consuming it. Only helps `take` past
    /// slots that were already drained.
    ///
    /// Limited to `Copy` items: a concurrent `poll` hands the same bytes to its
    /// caller, who may then mutate or free anything the item owns.
    ///
    /// ```compile_fail
    /// let q = quickqueue::MpmcQueue::<Vec<u8>>::with_capacity(4).unwrap();
    /// let _ = q.peek();
    /// ```
    pub fn peek(&self) -> Option<T>
    where
        T: Copy,
    {
        let guard = &epoch::pin();
        loop {
            let take = self.take.load(Ordering::Acquire);
            let put = self.put.load(Ordering::Acquire);
            if take == put {
                return None;
            }

            let word = self.ring.slot(take).load(Ordering::Acquire);
            match self.occupant(word, guard) {
                Some(node) if node.stamp == take => return Some(*node.item),
                Some(_) => {}
                None if self.is_drained(word, take) => {
                    self.help_take(take, self.ring.increment(take));
                }
                None => hint::spin_loop(),
            }
        }
    }

    /// Weakly consistent, single-pass view of the queued items, see [`Iter`].
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            cursor: self.take.load(Ordering::Acquire),
            remaining: self.ring.capacity() - 1,
            done: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn size(&self) -> usize {
        let take = self.take.load(Ordering::Acquire);
        let put = self.put.load(Ordering::Acquire);
        self.ring.len(take, put)
    }

    pub fn is_empty(&self) -> bool {
        self.put.load(Ordering::Acquire) == self.take.load(Ordering::Acquire)
    }

    #[inline]
    fn occupant<'g>(&self, word: usize, _guard: &'g Guard) -> Option<&'g Node<T>> {
        if word & 1 == 1 {
            None
        } else {
            // Nodes are only freed through the epoch collector, and the caller
            // is pinned, so a pointer loaded from a slot stays valid for 'g.
            Some(unsafe { &*(word as *const Node<T>) })
        }
    }

    /// A consumer already emptied the slot for `take` but has not moved the cursor.
    #[inline]
    fn is_drained(&self, word: usize, take: usize) -> bool {
        word == vacant(take.wrapping_add(self.ring.one_lap()))
    }

    #[inline]
    fn help_take(&self, take: usize, next: usize) {
        let _ = self
            .take
            .compare_exchange(take, next, Ordering::AcqRel, Ordering::Relaxed);
    }
}

impl<T> Drop for MpmcQueue<T> {
    fn drop(&mut self) {
        let mut remaining = 0usize;
        for slot in self.ring.slots_mut() {
            let word = *slot.get_mut();
            if word & 1 == 0 {
                let mut node = unsafe { Box::from_raw(word as *mut Node<T>) };
                unsafe { ManuallyDrop::drop(&mut node.item) };
                remaining += 1;
            }
        }
        if remaining > 0 {
            debug!(remaining, "dropped undelivered items with mpmc queue");
        }
    }
}

impl<T> fmt::Debug for MpmcQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpmcQueue")
            .field("capacity", &self.capacity())
            .field("size", &self.size())
            .finish()
    }
}

impl<T> QueueState for MpmcQueue<T> {
    fn capacity(&self) -> usize {
        MpmcQueue::capacity(self)
    }

    fn size(&self) -> usize {
        MpmcQueue::size(self)
    }

    fn is_empty(&self) -> bool {
        MpmcQueue::is_empty(self)
    }
}

impl<T> Offer<T> for MpmcQueue<T> {
    fn offer<I: Into<Option<T>>>(&self, item: I) -> Result<Offered<T>> {
        MpmcQueue::offer(self, item)
    }
}

impl<T> Poll<T> for MpmcQueue<T> {
    fn poll(&self) -> Option<T> {
        MpmcQueue::poll(self)
    }

    fn peek(&self) -> Result<Option<T>>
    where
        T: Copy,
    {
        Ok(MpmcQueue::peek(self))
    }
}

/// Iterator returned by [`MpmcQueue::iter`].
///
/// Starts at the take cursor observed at creation and walks forward, yielding
/// copies of the items it finds. It stops at the current put cursor, at a slot
/// that is still empty on two consecutive reads, or after one lap of usable
/// slots, whichever comes first. Items added or removed while it runs may or
/// may not be seen. Slots drained under it are skipped, helping `take` past
/// them if it still points there.
pub struct Iter<'a, T> {
    queue: &'a MpmcQueue<T>,
    cursor: usize,
    remaining: usize,
    done: bool,
}

impl<T: Copy> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.done {
            return None;
        }
        let q = self.queue;
        let guard = &epoch::pin();
        let mut empty_reads = 0;
        loop {
            if self.remaining == 0 || self.cursor == q.put.load(Ordering::Acquire) {
                self.done = true;
                return None;
            }

            let next = q.ring.increment(self.cursor);
            let word = q.ring.slot(self.cursor).load(Ordering::Acquire);
            match q.occupant(word, guard) {
                Some(node) if node.stamp == self.cursor => {
                    let item = *node.item;
                    self.cursor = next;
                    self.remaining -= 1;
                    return Some(item);
                }
                None if word == vacant(self.cursor) => {
                    empty_reads += 1;
                    if empty_reads == 2 {
                        self.done = true;
                        return None;
                    }
                    hint::spin_loop();
                }
                _ => {
                    // Drained (or refilled in a later lap) since we started.
                    q.help_take(self.cursor, next);
                    self.cursor = next;
                    self.remaining -= 1;
                    empty_reads = 0;
                }
            }
        }
    }
}

impl<'a, T: Copy> IntoIterator for &'a MpmcQueue<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
