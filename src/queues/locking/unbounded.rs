//! A Queue protected by a single Mutex around a growable Buffer
//!
//! The Capacity given at construction is only used to pre-allocate the
//! Buffer, the Queue grows past it whenever needed and
//! [`try_enqueue`](Queue::try_enqueue) therefore always succeeds.
//!
//! # Example
//! ```
//! use seqqueue::queues::locking::unbounded;
//!
//! let queue = unbounded::queue(1).unwrap();
//!
//! // The Capacity is not enforced
//! assert_eq!(Ok(()), queue.try_enqueue(13));
//! assert_eq!(Ok(()), queue.try_enqueue(14));
//!
//! assert_eq!(Some(13), queue.try_dequeue());
//! ```

use std::{
    collections::VecDeque,
    fmt::{self, Debug},
};

use parking_lot::Mutex;

use crate::{
    queues::{check_capacity, CapacityError, ConcurrentQueue, DEFAULT_CAPACITY},
    trace,
};

/// The Mutex protected unbounded Queue
pub struct Queue<T> {
    buffer: Mutex<VecDeque<T>>,
}

/// Creates a new empty Queue, pre-allocating room for `capacity` Elements
///
/// # Errors
/// Returns [`CapacityError::Zero`] if `capacity` is 0
pub fn queue<T>(capacity: usize) -> Result<Queue<T>, CapacityError> {
    Queue::new(capacity)
}

impl<T> Queue<T> {
    /// Creates a new empty Queue, pre-allocating room for `capacity` Elements
    ///
    /// # Errors
    /// Returns [`CapacityError::Zero`] if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        let capacity = check_capacity(capacity)?;
        Ok(Self::allocate(capacity))
    }

    fn allocate(capacity: usize) -> Self {
        trace::debug!(capacity, "created unbounded locking queue");

        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Enqueues the given Data
    ///
    /// This never fails, the `Result` only exists to match the other Queues.
    pub fn try_enqueue(&self, data: T) -> Result<(), T> {
        self.buffer.lock().push_back(data);
        Ok(())
    }

    /// Attempts to dequeue the oldest Element
    pub fn try_dequeue(&self) -> Option<T> {
        self.buffer.lock().pop_front()
    }

    /// The number of Elements currently stored in the Queue
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Checks if the Queue currently contains no Elements
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}

impl<T> ConcurrentQueue<T> for Queue<T> {
    fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        Self::new(capacity)
    }

    fn try_enqueue(&self, data: T) -> Result<(), T> {
        Queue::try_enqueue(self, data)
    }

    fn try_dequeue(&self) -> Option<T> {
        Queue::try_dequeue(self)
    }

    fn capacity(&self) -> Option<usize> {
        None
    }

    fn len(&self) -> usize {
        Queue::len(self)
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::allocate(DEFAULT_CAPACITY)
    }
}

impl<T> Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("unbounded::Queue")
            .field("len", &self.len())
            .finish()
    }
}
