//! Queues that serialize every operation through a single Mutex
//!
//! These are reference implementations for the lock-free
//! [`sequence`](super::sequence) Queue. They share the same
//! [`ConcurrentQueue`](super::ConcurrentQueue) Interface and the same FIFO
//! semantics, but every operation briefly takes a lock. No operation ever
//! waits on anything else while holding it.
//!
//! # Unbounded
//! The [`unbounded`] Queue accepts a Capacity when it is created but never
//! enforces it, so its enqueue operation never fails.
//!
//! # Circular
//! The [`circular`] Queue stores its Elements in a fixed Ring-Buffer and
//! rejects Elements once it is full, just like the lock-free Queue.

pub mod circular;
pub mod unbounded;
