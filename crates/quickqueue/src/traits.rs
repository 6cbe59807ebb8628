use crate::error::Result;

/// Outcome of a non-blocking `offer`.
///
/// A full queue is an ordinary outcome, not an error: the rejected item is
/// handed back so the caller can spin, back off, or drop it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Offered<T> {
    Accepted,
    Full(T),
}

impl<T> Offered<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Offered::Accepted)
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Offered::Full(_))
    }

    /// The item handed back by a full queue.
    pub fn into_rejected(self) -> Option<T> {
        match self {
            Offered::Accepted => None,
            Offered::Full(item) => Some(item),
        }
    }
}

/// Point-in-time view of a bounded queue. Values may be stale as soon as they
/// are returned when other threads are operating on the queue.
pub trait QueueState {
    /// Number of slots; one of them is always kept free.
    fn capacity(&self) -> usize;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool;
}

/// Producer-side capability.
pub trait Offer<T>: QueueState {
    /// Enqueue `item` without blocking. `None` is rejected with
    /// [`QueueError::NullItem`](crate::QueueError::NullItem).
    fn offer<I: Into<Option<T>>>(&self, item: I) -> Result<Offered<T>>;
}

/// Consumer-side capability.
pub trait Poll<T>: QueueState {
    fn poll(&self) -> Option<T>;

    /// Copy of the head item without removing it, where the variant supports it.
    fn peek(&self) -> Result<Option<T>>
    where
        T: Copy;
}
