#![deny(missing_docs)]
#![warn(rust_2018_idioms, missing_debug_implementations)]
//! This crate provides a bounded lock-free Queue, based on per-Slot sequence
//! numbers, together with lock-based reference Queues that share the same
//! Interface
//!
//! # Feature-Flags
//! * `locking`: Enables the lock-based reference Queues
//! * `tracing`: Enables diagnostic output through the `tracing` crate
//! * `full`: Enables all the Feature-Flags
//!
//! # Example
//! ```
//! use seqqueue::queues::sequence;
//!
//! let queue = sequence::queue(2).unwrap();
//!
//! assert_eq!(Ok(()), queue.try_enqueue(13));
//! assert_eq!(Ok(()), queue.try_enqueue(14));
//! // The Queue is full, so the Value is handed back
//! assert_eq!(Err(15), queue.try_enqueue(15));
//!
//! assert_eq!(Some(13), queue.try_dequeue());
//! ```

pub mod queues;
pub mod trace;

mod sync;
