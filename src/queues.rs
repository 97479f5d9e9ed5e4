//! This module provides the different Queue implementations, which all share
//! the [`ConcurrentQueue`] Interface
//!
//! # Sequence
//! The [`sequence`] Queue is the lock-free one. It stores the Elements in a
//! fixed Array of Slots, where every Slot carries its own atomic sequence
//! number, and two atomic Cursors decide which Thread gets to write or read
//! which Slot.
//!
//! # Locking
//! The [`locking`] Queues protect their Storage with a single Mutex and exist
//! as a reference point, both for correctness and for performance
//! comparisons:
//! * [`locking::circular`] enforces the same fixed Capacity as the lock-free
//!   Queue
//! * [`locking::unbounded`] accepts a Capacity but never enforces it, so its
//!   enqueue operation never fails

use std::{error::Error, fmt};

#[cfg(feature = "locking")]
pub mod locking;
pub mod sequence;

/// The Capacity used by the `Default` implementations of the Queues
pub const DEFAULT_CAPACITY: usize = 100_000;

/// The Error returned when a Queue could not be constructed with the
/// requested Capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    /// A Queue needs room for at least one Element
    Zero,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "queue capacity must be at least 1"),
        }
    }
}

impl Error for CapacityError {}

/// Rejects Capacities that no Queue can be built with
pub(crate) fn check_capacity(capacity: usize) -> Result<usize, CapacityError> {
    if capacity == 0 {
        crate::trace::warn!("rejected queue construction with zero capacity");
        return Err(CapacityError::Zero);
    }

    Ok(capacity)
}

/// The shared Interface of all the Queues in this crate
///
/// None of the operations ever block. A full or empty Queue is an expected
/// outcome and the caller decides whether to retry, back off or drop the
/// Element.
///
/// # Example
/// ```
/// use seqqueue::queues::{sequence, ConcurrentQueue};
///
/// fn fill<Q: ConcurrentQueue<u64>>(queue: &Q) -> u64 {
///     let mut count = 0;
///     while queue.try_enqueue(count).is_ok() {
///         count += 1;
///     }
///     count
/// }
///
/// let queue = sequence::Queue::<u64>::with_capacity(4).unwrap();
/// assert_eq!(4, fill(&queue));
/// ```
pub trait ConcurrentQueue<T>: Sized {
    /// Creates a new empty Queue that can hold `capacity` Elements
    ///
    /// # Errors
    /// Returns [`CapacityError::Zero`] if `capacity` is 0
    fn with_capacity(capacity: usize) -> Result<Self, CapacityError>;

    /// Attempts to enqueue the given Data
    ///
    /// # Returns
    /// * `Ok(())` if the Data was enqueued
    /// * `Err(data)` if the Queue was full, handing the Data back
    fn try_enqueue(&self, data: T) -> Result<(), T>;

    /// Attempts to dequeue the oldest Element
    ///
    /// Returns `None` if there is currently no Element ready to be dequeued
    fn try_dequeue(&self) -> Option<T>;

    /// The maximum number of Elements the Queue holds at once, `None` if the
    /// Queue is unbounded
    fn capacity(&self) -> Option<usize>;

    /// The number of Elements currently stored in the Queue
    ///
    /// Under concurrent modification this is only a snapshot.
    fn len(&self) -> usize;

    /// Checks if the Queue currently contains no Elements
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the Queue currently has no room for another Element
    fn is_full(&self) -> bool {
        match self.capacity() {
            Some(capacity) => self.len() >= capacity,
            None => false,
        }
    }
}
