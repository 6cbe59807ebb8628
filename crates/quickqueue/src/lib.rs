//! Bounded, array-backed lock-free queues for inter-thread communication
//!
//! - `spsc`: Wait-free single-producer single-consumer queue (acquire/release only)
//! - `mpmc`: Lock-free multi-producer multi-consumer queue (slot CAS + helping)
//! - `config`: Layered configuration for building either queue
//!
//! Neither queue blocks: `offer` on a full queue hands the item back and
//! `poll` on an empty queue returns `None`. Callers that need waiting layer
//! their own spin, backoff or park/notify loop on top.
//!
//! ```
//! use quickqueue::{MpmcQueue, Offered};
//!
//! let q = MpmcQueue::<u32>::with_capacity(4)?;
//! for i in 1..=3 {
//!     assert!(q.offer(i)?.is_accepted());
//! }
//! assert_eq!(q.offer(4)?, Offered::Full(4));
//! assert_eq!(q.poll(), Some(1));
//! # Ok::<(), quickqueue::QueueError>(())
//! ```

pub mod config;
pub mod error;
pub mod mpmc;
mod ring;
mod shim;
pub mod spsc;
pub mod traits;

pub use self::config::{ConfiguredQueue, QueueConfig, QueueKind};
pub use self::error::{QueueError, Result};
pub use self::mpmc::{Iter, MpmcQueue};
pub use self::spsc::{Consumer, Producer, SpscQueue};
pub use self::traits::{Offer, Offered, Poll, QueueState};
