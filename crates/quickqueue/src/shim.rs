//! Switches the SPSC cursors between `std` and `loom` primitives.
//!
//! Build with `RUSTFLAGS="--cfg loom"` to run the model checks in
//! `tests/loom_queues.rs`.

#[cfg(not(loom))]
pub(crate) mod atomic {
    pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};
}

#[cfg(loom)]
pub(crate) mod atomic {
    pub(crate) use loom::sync::atomic::{AtomicUsize, Ordering};
}

#[cfg(not(loom))]
pub(crate) mod sync {
    pub(crate) use std::sync::Arc;
}

#[cfg(loom)]
pub(crate) mod sync {
    pub(crate) use loom::sync::Arc;
}
