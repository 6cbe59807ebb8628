use crate::error::{QueueError, Result};
use crate::ring::Ring;
use crate::shim::atomic::{AtomicUsize, Ordering};
use crate::shim::sync::Arc;
use crate::traits::{Offer, Offered, Poll, QueueState};
use core::cell::{Cell, UnsafeCell};
use core::marker::PhantomData;
use crossbeam_utils::CachePadded;
use tracing::debug;

/// Wait-free SPSC bounded ring buffer queue.
///
/// - One dedicated producer, one dedicated consumer
/// - No CAS: each cursor has a single writer, published with Release and
///   observed by the other side with Acquire
/// - One slot stays free so that `put == take` always means empty
pub struct SpscQueue<T> {
    take: CachePadded<AtomicUsize>,
    put: CachePadded<AtomicUsize>,
    ring: Ring<UnsafeCell<Option<T>>>,
}

// Safety: producer and consumer touch disjoint slots, handed over through the cursors
unsafe impl<T: Send> Send for SpscQueue<T> {}
unsafe impl<T: Send> Sync for SpscQueue<T> {}

impl<T> SpscQueue<T> {
    /// Create a queue with `capacity` slots, `capacity - 1` of them usable,
    /// and split it into its two halves.
    pub fn with_capacity(capacity: usize) -> Result<(Producer<T>, Consumer<T>)> {
        let ring = Ring::new(capacity, |_| UnsafeCell::new(None))?;
        debug!(capacity, "created spsc queue");
        let shared = Arc::new(SpscQueue {
            take: CachePadded::new(AtomicUsize::new(0)),
            put: CachePadded::new(AtomicUsize::new(0)),
            ring,
        });
        Ok((
            Producer {
                queue: Arc::clone(&shared),
                _unsync: PhantomData,
            },
            Consumer {
                queue: shared,
                _unsync: PhantomData,
            },
        ))
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    fn size(&self) -> usize {
        let take = self.take.load(Ordering::Acquire);
        let put = self.put.load(Ordering::Acquire);
        self.ring.len(take, put)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.put.load(Ordering::Acquire) == self.take.load(Ordering::Acquire)
    }
}

impl<T> Drop for SpscQueue<T> {
    fn drop(&mut self) {
        let remaining = self.size();
        if remaining > 0 {
            debug!(remaining, "dropping spsc queue with undelivered items");
        }
    }
}

/// Producer side of the SPSC queue. `Send` but not `Sync`: exactly one
/// thread at a time can offer.
pub struct Producer<T> {
    queue: Arc<SpscQueue<T>>,
    _unsync: PhantomData<Cell<()>>,
}

/// Consumer side of the SPSC queue. `Send` but not `Sync`.
pub struct Consumer<T> {
    queue: Arc<SpscQueue<T>>,
    _unsync: PhantomData<Cell<()>>,
}

impl<T> Producer<T> {
    #[inline]
    pub fn offer<I: Into<Option<T>>>(&self, item: I) -> Result<Offered<T>> {
        let item = item.into().ok_or(QueueError::NullItem)?;
        let q = &*self.queue;
        let put = q.put.load(Ordering::Relaxed);
        let take = q.take.load(Ordering::Acquire);
        let next = q.ring.increment(put);
        if q.ring.is_full(next, take) {
            return Ok(Offered::Full(item));
        }
        // Slot write must land before `put` is published.
        unsafe { *q.ring.slot(put).get() = Some(item) };
        q.put.store(next, Ordering::Release);
        Ok(Offered::Accepted)
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn size(&self) -> usize {
        self.queue.size()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Consumer<T> {
    #[inline]
    pub fn poll(&self) -> Option<T> {
        let q = &*self.queue;
        let take = q.take.load(Ordering::Relaxed);
        let put = q.put.load(Ordering::Acquire);
        if take == put {
            return None;
        }
        // Acquire on `put` makes the producer's slot write visible here.
        let item = unsafe { (*q.ring.slot(take).get()).take() };
        q.take.store(q.ring.increment(take), Ordering::Release);
        item
    }

    /// Not offered: a stable view of the head would need extra bookkeeping
    /// between the two sides.
    pub fn peek(&self) -> Result<Option<T>>
    where
        T: Copy,
    {
        Err(QueueError::Unsupported("peek on an spsc queue"))
    }

    pub fn iter(&self) -> Result<core::iter::Empty<T>> {
        Err(QueueError::Unsupported("iteration over an spsc queue"))
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn size(&self) -> usize {
        self.queue.size()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> QueueState for Producer<T> {
    fn capacity(&self) -> usize {
        Producer::capacity(self)
    }

    fn size(&self) -> usize {
        Producer::size(self)
    }

    fn is_empty(&self) -> bool {
        Producer::is_empty(self)
    }
}

impl<T> Offer<T> for Producer<T> {
    fn offer<I: Into<Option<T>>>(&self, item: I) -> Result<Offered<T>> {
        Producer::offer(self, item)
    }
}

impl<T> QueueState for Consumer<T> {
    fn capacity(&self) -> usize {
        Consumer::capacity(self)
    }

    fn size(&self) -> usize {
        Consumer::size(self)
    }

    fn is_empty(&self) -> bool {
        Consumer::is_empty(self)
    }
}

impl<T> Poll<T> for Consumer<T> {
    fn poll(&self) -> Option<T> {
        Consumer::poll(self)
    }

    fn peek(&self) -> Result<Option<T>>
    where
        T: Copy,
    {
        Consumer::peek(self)
    }
}
