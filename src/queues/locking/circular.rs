//! A Queue protected by a single Mutex around a fixed Ring-Buffer
//!
//! # Example
//! ```
//! use seqqueue::queues::locking::circular;
//!
//! let queue = circular::queue(1).unwrap();
//!
//! assert_eq!(Ok(()), queue.try_enqueue(13));
//! assert_eq!(Err(14), queue.try_enqueue(14));
//!
//! assert_eq!(Some(13), queue.try_dequeue());
//! ```

use std::fmt::{self, Debug};

use parking_lot::Mutex;

use crate::{
    queues::{check_capacity, CapacityError, ConcurrentQueue, DEFAULT_CAPACITY},
    trace,
};

/// The Ring-Buffer itself, only ever accessed while holding the Lock
struct Ring<T> {
    buffer: Box<[Option<T>]>,
    /// The number of Elements currently stored
    size: usize,
    /// The Index of the next Element to read
    read: usize,
    /// The Index of the next Element to write
    write: usize,
}

/// Calculates the Index of the next Element in the Buffer and wraps around
/// if the End of the Buffer has been reached
#[inline(always)]
const fn next_element(current: usize, length: usize) -> usize {
    let target = current + 1;
    if target >= length {
        0
    } else {
        target
    }
}

impl<T> Ring<T> {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: (0..capacity).map(|_| None).collect(),
            size: 0,
            read: 0,
            write: 0,
        }
    }

    fn push(&mut self, data: T) -> Result<(), T> {
        if self.size >= self.buffer.len() {
            return Err(data);
        }

        self.buffer[self.write] = Some(data);
        self.write = next_element(self.write, self.buffer.len());
        self.size += 1;
        Ok(())
    }

    fn pop(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }

        let data = self.buffer[self.read].take();
        self.read = next_element(self.read, self.buffer.len());
        self.size -= 1;
        data
    }
}

/// The Mutex protected fixed-capacity Queue
pub struct Queue<T> {
    capacity: usize,
    ring: Mutex<Ring<T>>,
}

/// Creates a new empty Queue with room for `capacity` Elements
///
/// # Errors
/// Returns [`CapacityError::Zero`] if `capacity` is 0
pub fn queue<T>(capacity: usize) -> Result<Queue<T>, CapacityError> {
    Queue::new(capacity)
}

impl<T> Queue<T> {
    /// Creates a new empty Queue with room for `capacity` Elements
    ///
    /// # Errors
    /// Returns [`CapacityError::Zero`] if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        let capacity = check_capacity(capacity)?;
        Ok(Self::allocate(capacity))
    }

    fn allocate(capacity: usize) -> Self {
        trace::debug!(capacity, "created circular locking queue");

        Self {
            capacity,
            ring: Mutex::new(Ring::new(capacity)),
        }
    }

    /// Attempts to enqueue the given Data
    ///
    /// # Returns
    /// * `Ok(())` if the Data was enqueued
    /// * `Err(data)` if the Queue was full, handing the Data back
    pub fn try_enqueue(&self, data: T) -> Result<(), T> {
        self.ring.lock().push(data)
    }

    /// Attempts to dequeue the oldest Element
    pub fn try_dequeue(&self) -> Option<T> {
        self.ring.lock().pop()
    }

    /// The maximum number of Elements the Queue holds at once
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of Elements currently stored in the Queue
    pub fn len(&self) -> usize {
        self.ring.lock().size
    }

    /// Checks if the Queue currently contains no Elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the Queue currently has no room for another Element
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
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
        Some(self.capacity)
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
        f.debug_struct("circular::Queue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
