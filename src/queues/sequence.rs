//! A bounded lock-free Multi-Producer-Multi-Consumer Queue, where every Slot
//! carries its own sequence number
//!
//! # Design
//! The Queue has two ever increasing Cursors: the write Cursor is the next
//! Generation a Producer can claim and the read Cursor is the next Generation
//! a Consumer can claim. Generation `g` lives in the Slot `g % L`, where `L`
//! is the number of Slots.
//!
//! A Producer first checks that the Queue is not full, claims its Generation
//! by advancing the write Cursor with a CAS, stores its Data into the Slot and
//! then publishes the Slot by setting its Marker to `g + 1`. A Consumer only
//! claims Generation `g` once the Marker of its Slot reads `g + 1`, so it never
//! sees a partially written Slot. Once the Data has been moved out, the
//! Consumer releases the Slot for the Producer one lap ahead by setting the
//! Marker to `g + L`.
//!
//! Neither side ever blocks: a full or empty Queue is reported immediately
//! and only a lost CAS race causes a retry.
//!
//! # Example
//! ```
//! use std::{sync::Arc, thread};
//!
//! use seqqueue::queues::sequence;
//!
//! let queue = Arc::new(sequence::queue::<u64>(16).unwrap());
//!
//! let producer = {
//!     let queue = queue.clone();
//!     thread::spawn(move || {
//!         for i in 0..100 {
//!             let mut data = i;
//!             while let Err(d) = queue.try_enqueue(data) {
//!                 data = d;
//!                 std::hint::spin_loop();
//!             }
//!         }
//!     })
//! };
//!
//! let mut received = Vec::new();
//! while received.len() < 100 {
//!     if let Some(data) = queue.try_dequeue() {
//!         received.push(data);
//!     }
//! }
//! producer.join().unwrap();
//!
//! assert_eq!((0..100).collect::<Vec<_>>(), received);
//! ```
//!
//! # Reference
//! * [Bounded MPMC queue](https://www.1024cores.net/home/lock-free-algorithms/queues/bounded-mpmc-queue)

use std::fmt::{self, Debug};

use crossbeam_utils::CachePadded;

use super::{check_capacity, CapacityError, ConcurrentQueue, DEFAULT_CAPACITY};
use crate::{sync::atomic, trace};

mod slot;
use slot::Slot;

/// The lock-free sequence-number Queue
pub struct Queue<T> {
    /// The next Generation that will be claimed by a Producer
    write_cursor: CachePadded<atomic::AtomicU64>,
    /// The next Generation that will be claimed by a Consumer
    read_cursor: CachePadded<atomic::AtomicU64>,
    /// The fixed Buffer of Slots
    slots: Box<[Slot<T>]>,
    /// The maximum distance between the write and the read Cursor
    capacity: u64,
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
        // With a single Slot a released Marker (`g + 1`) could not be told
        // apart from a published one, so there are always at least two Slots.
        // The Capacity itself is still enforced through the Cursors
        let slot_count = capacity.max(2) as u64;

        // Slot `i` starts out empty and writable by Generation `i`
        let slots = (0..slot_count).map(Slot::new).collect();

        trace::debug!(capacity, "created lock-free sequence queue");

        Self {
            write_cursor: CachePadded::new(atomic::AtomicU64::new(0)),
            read_cursor: CachePadded::new(atomic::AtomicU64::new(0)),
            slots,
            capacity: capacity as u64,
        }
    }

    /// The number of Generations between two uses of the same Slot
    #[inline(always)]
    fn lap(&self) -> u64 {
        self.slots.len() as u64
    }

    #[inline(always)]
    fn slot(&self, generation: u64) -> &Slot<T> {
        &self.slots[(generation % self.lap()) as usize]
    }

    /// Attempts to enqueue the given Data
    ///
    /// # Returns
    /// * `Ok(())` if the Data was enqueued
    /// * `Err(data)` if the Queue was full, handing the Data back
    pub fn try_enqueue(&self, data: T) -> Result<(), T> {
        // Only an optimistic guess, the CAS below validates it
        let mut write = self.write_cursor.load(atomic::Ordering::Relaxed);

        loop {
            let read = self.read_cursor.load(atomic::Ordering::Acquire);
            // A stale write Cursor may lag behind the read Cursor, in which
            // case the CAS below fails and refreshes it
            if write.saturating_sub(read) >= self.capacity {
                return Err(data);
            }

            let slot = self.slot(write);
            let marker = slot.marker();
            if marker < write {
                // The Consumer of the previous lap claimed the Slot but has
                // not moved its Data out yet
                return Err(data);
            }
            if marker > write {
                // Some other Producer already wrote this Generation
                write = self.write_cursor.load(atomic::Ordering::Relaxed);
                continue;
            }

            match self.write_cursor.compare_exchange_weak(
                write,
                write + 1,
                atomic::Ordering::AcqRel,
                atomic::Ordering::Relaxed,
            ) {
                Ok(_) => {
                    // # Safety:
                    // The CAS hands out every Generation exactly once and the
                    // Marker matched the Generation, so this Thread is the only
                    // one accessing the Slot until it publishes the Data.
                    unsafe { slot.store(write, data) };
                    return Ok(());
                }
                Err(current) => {
                    write = current;
                }
            };
        }
    }

    /// Attempts to dequeue the oldest published Element
    ///
    /// Returns `None` if the Queue is empty or the Producer of the next
    /// Generation has not finished writing it yet.
    pub fn try_dequeue(&self) -> Option<T> {
        // Only an optimistic guess, the CAS below validates it
        let mut read = self.read_cursor.load(atomic::Ordering::Relaxed);

        loop {
            let slot = self.slot(read);
            let marker = slot.marker();
            if marker < read + 1 {
                return None;
            }
            if marker > read + 1 {
                // Some other Consumer already took this Generation
                read = self.read_cursor.load(atomic::Ordering::Relaxed);
                continue;
            }

            match self.read_cursor.compare_exchange_weak(
                read,
                read + 1,
                atomic::Ordering::AcqRel,
                atomic::Ordering::Relaxed,
            ) {
                Ok(_) => {
                    // # Safety:
                    // The Marker showed the Data of this Generation as
                    // published and the CAS made this Thread the only Consumer
                    // of it. The Slot is not handed to the next Producer until
                    // `take` released it.
                    return Some(unsafe { slot.take(read, self.lap()) });
                }
                Err(current) => {
                    read = current;
                }
            };
        }
    }

    /// The maximum number of Elements the Queue holds at once
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// The number of Elements in the Queue, which is the distance between the
    /// write and the read Cursor
    ///
    /// This includes Generations that have been claimed by a Producer but are
    /// not published yet.
    pub fn len(&self) -> usize {
        loop {
            let write = self.write_cursor.load(atomic::Ordering::SeqCst);
            let read = self.read_cursor.load(atomic::Ordering::SeqCst);

            // Only if the write Cursor did not move in between, the two values
            // belong together
            if self.write_cursor.load(atomic::Ordering::SeqCst) == write {
                return write.saturating_sub(read).min(self.capacity) as usize;
            }
        }
    }

    /// Checks if the Queue currently contains no Elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the Queue currently has no room for another Element
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
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
        Some(Queue::capacity(self))
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
        f.debug_struct("sequence::Queue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        let read = self.read_cursor.load(atomic::Ordering::Relaxed);
        let write = self.write_cursor.load(atomic::Ordering::Relaxed);

        if write > read {
            trace::trace!(remaining = write - read, "dropping remaining elements");
        }

        for generation in read..write {
            // # Safety:
            // Every Generation between the Cursors has been published and not
            // taken yet, and nobody else can access the Queue anymore.
            unsafe { self.slot(generation).drop_in_place() };
        }
    }
}

// Safety:
// The Data in the Slots is only ever accessed by the single Thread that
// claimed the corresponding Generation, so sharing the Queue only requires the
// Data itself to be sendable between Threads
unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

#[cfg(all(test, not(loom)))]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn new() {
        queue::<u64>(10).unwrap();
    }
    #[test]
    fn new_zero_capacity() {
        assert_eq!(CapacityError::Zero, queue::<u64>(0).unwrap_err());
    }
    #[test]
    fn default_capacity() {
        let queue = Queue::<u64>::default();
        assert_eq!(DEFAULT_CAPACITY, queue.capacity());
    }

    #[test]
    fn dequeue_empty() {
        let queue = queue::<u64>(1).unwrap();

        assert_eq!(None, queue.try_dequeue());
    }
    #[test]
    fn enqueue_dequeue() {
        let queue = queue(10).unwrap();

        assert_eq!(Ok(()), queue.try_enqueue(13));
        assert_eq!(Some(13), queue.try_dequeue());
        assert_eq!(None, queue.try_dequeue());
    }
    #[test]
    fn enqueue_full() {
        let queue = queue(2).unwrap();

        assert_eq!(Ok(()), queue.try_enqueue(13));
        assert_eq!(Ok(()), queue.try_enqueue(14));
        assert_eq!(Err(15), queue.try_enqueue(15));
        assert_eq!(2, queue.len());
        assert!(queue.is_full());
    }
    #[test]
    fn enqueue_after_full_dequeue() {
        let queue = queue(2).unwrap();

        queue.try_enqueue(13).unwrap();
        queue.try_enqueue(14).unwrap();
        assert_eq!(Some(13), queue.try_dequeue());
        assert_eq!(Ok(()), queue.try_enqueue(15));

        assert_eq!(Some(14), queue.try_dequeue());
        assert_eq!(Some(15), queue.try_dequeue());
        assert!(queue.is_empty());
    }
    #[test]
    fn enqueue_dequeue_wraps_around() {
        let queue = queue(3).unwrap();

        for index in 0..(5 * 3) {
            assert_eq!(Ok(()), queue.try_enqueue(index));
            assert_eq!(Some(index), queue.try_dequeue());
        }
        assert!(queue.is_empty());
    }
    #[test]
    fn capacity_one() {
        let queue = queue(1).unwrap();

        for index in 0..5 {
            assert_eq!(Ok(()), queue.try_enqueue(index));
            assert_eq!(Err(100), queue.try_enqueue(100));
            assert_eq!(1, queue.len());
            assert_eq!(Some(index), queue.try_dequeue());
            assert_eq!(None, queue.try_dequeue());
        }
    }
    #[test]
    fn fifo_order() {
        let queue = queue(8).unwrap();

        for index in 0..8 {
            queue.try_enqueue(index).unwrap();
        }
        for index in 0..8 {
            assert_eq!(Some(index), queue.try_dequeue());
        }
    }
    #[test]
    fn len_follows_operations() {
        let queue = queue(4).unwrap();
        assert_eq!(0, queue.len());

        queue.try_enqueue(1).unwrap();
        queue.try_enqueue(2).unwrap();
        assert_eq!(2, queue.len());

        queue.try_dequeue().unwrap();
        assert_eq!(1, queue.len());
    }
    #[test]
    fn moves_owned_data() {
        let queue = queue(2).unwrap();

        queue.try_enqueue(String::from("first")).unwrap();
        queue.try_enqueue(String::from("second")).unwrap();
        assert_eq!(
            Err(String::from("third")),
            queue.try_enqueue(String::from("third"))
        );

        assert_eq!(Some(String::from("first")), queue.try_dequeue());
        assert_eq!(Some(String::from("second")), queue.try_dequeue());
    }
    #[test]
    fn drop_remaining_elements() {
        let element = Arc::new(());

        let queue = queue(4).unwrap();
        for _ in 0..4 {
            queue.try_enqueue(element.clone()).unwrap();
        }
        drop(queue.try_dequeue());
        assert_eq!(4, Arc::strong_count(&element));

        drop(queue);
        assert_eq!(1, Arc::strong_count(&element));
    }
    #[test]
    fn drop_after_wrap_around() {
        let element = Arc::new(());

        let queue = queue(3).unwrap();
        for _ in 0..7 {
            queue.try_enqueue(element.clone()).unwrap();
            drop(queue.try_dequeue());
        }
        queue.try_enqueue(element.clone()).unwrap();
        queue.try_enqueue(element.clone()).unwrap();
        assert_eq!(3, Arc::strong_count(&element));

        drop(queue);
        assert_eq!(1, Arc::strong_count(&element));
    }
    #[test]
    fn debug_output() {
        let queue = queue::<u64>(4).unwrap();
        queue.try_enqueue(1).unwrap();

        assert_eq!(
            "sequence::Queue { capacity: 4, len: 1 }",
            format!("{:?}", queue)
        );
    }

    #[test]
    fn concurrent_producers_consumers() {
        const PRODUCERS: u64 = 4;
        const ITERATIONS: u64 = 10_000;

        let queue = Arc::new(queue::<u64>(16).unwrap());

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|id| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..ITERATIONS {
                        let mut data = id * ITERATIONS + i;
                        while let Err(d) = queue.try_enqueue(data) {
                            data = d;
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || {
                    let mut received = Vec::new();
                    while (received.len() as u64) < PRODUCERS * ITERATIONS / 2 {
                        match queue.try_dequeue() {
                            Some(data) => received.push(data),
                            None => thread::yield_now(),
                        };
                    }
                    received
                })
            })
            .collect();

        for th in producers {
            th.join().unwrap();
        }
        let mut received: Vec<u64> = consumers
            .into_iter()
            .flat_map(|th| th.join().unwrap())
            .collect();
        received.sort_unstable();

        assert_eq!((0..PRODUCERS * ITERATIONS).collect::<Vec<_>>(), received);
        assert!(queue.is_empty());
    }
}

#[cfg(all(test, loom))]
mod loom_tests {
    use loom::sync::Arc;
    use loom::thread;

    use super::*;

    fn enqueue_spin(queue: &Queue<u64>, mut data: u64) {
        while let Err(d) = queue.try_enqueue(data) {
            data = d;
            thread::yield_now();
        }
    }

    fn dequeue_spin(queue: &Queue<u64>) -> u64 {
        loop {
            if let Some(data) = queue.try_dequeue() {
                return data;
            }
            thread::yield_now();
        }
    }

    #[test]
    fn spsc_wrap_around() {
        loom::model(|| {
            let queue = Arc::new(Queue::<u64>::new(1).unwrap());

            let producer = {
                let queue = queue.clone();
                thread::spawn(move || {
                    enqueue_spin(&queue, 1);
                    enqueue_spin(&queue, 2);
                })
            };

            assert_eq!(1, dequeue_spin(&queue));
            assert_eq!(2, dequeue_spin(&queue));

            producer.join().unwrap();
            assert!(queue.is_empty());
        });
    }

    #[test]
    fn concurrent_producers() {
        loom::model(|| {
            let queue = Arc::new(Queue::<u64>::new(2).unwrap());

            let producers: Vec<_> = (0..2)
                .map(|i| {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        queue.try_enqueue(i).unwrap();
                    })
                })
                .collect();

            for th in producers {
                th.join().unwrap();
            }

            let mut received = vec![
                queue.try_dequeue().unwrap(),
                queue.try_dequeue().unwrap(),
            ];
            received.sort_unstable();
            assert_eq!(vec![0, 1], received);
        });
    }

    #[test]
    fn concurrent_consumers_single_element() {
        loom::model(|| {
            let queue = Arc::new(Queue::<u64>::new(1).unwrap());
            queue.try_enqueue(13).unwrap();

            let consumers: Vec<_> = (0..2)
                .map(|_| {
                    let queue = queue.clone();
                    thread::spawn(move || queue.try_dequeue())
                })
                .collect();

            let received: Vec<_> = consumers
                .into_iter()
                .filter_map(|th| th.join().unwrap())
                .collect();
            assert_eq!(vec![13], received);
        });
    }

    #[test]
    fn full_queue_race() {
        loom::model(|| {
            let queue = Arc::new(Queue::<u64>::new(1).unwrap());

            let producers: Vec<_> = (0..2)
                .map(|i| {
                    let queue = queue.clone();
                    thread::spawn(move || queue.try_enqueue(i).is_ok())
                })
                .collect();

            let succeeded = producers
                .into_iter()
                .map(|th| th.join().unwrap())
                .filter(|ok| *ok)
                .count();

            assert_eq!(1, succeeded);
            assert_eq!(1, queue.len());
        });
    }
}
