use core::mem::MaybeUninit;

use crate::sync::{atomic, UnsafeCell};

/// A Slot is a single Entry in the Buffer of the Queue
///
/// The Marker of the Slot at Index `i` moves through the Generations that map
/// onto that Index (`i`, `i + L`, `i + 2L`, ... for `L` Slots):
/// * `marker == g`: the Slot is empty and can be written by the Producer that
///   claimed Generation `g`
/// * `marker == g + 1`: the Slot contains the Data of Generation `g` and can
///   be read by the Consumer that claims Generation `g`
pub(super) struct Slot<T> {
    /// The actual Data stored in the Slot, only initialized while the Marker
    /// is one past a Generation
    data: UnsafeCell<MaybeUninit<T>>,
    /// The sequence Marker of the Slot
    marker: atomic::AtomicU64,
}

impl<T> Slot<T> {
    /// Creates a new empty Slot, that can be written by the Producer of the
    /// given Generation
    pub fn new(generation: u64) -> Self {
        Self {
            data: UnsafeCell::new(MaybeUninit::uninit()),
            marker: atomic::AtomicU64::new(generation),
        }
    }

    /// Loads the current Marker, synchronizing with the Thread that last
    /// stored or took Data from this Slot
    #[inline]
    pub fn marker(&self) -> u64 {
        self.marker.load(atomic::Ordering::Acquire)
    }

    /// Stores the given Data into the Slot and publishes it for the Consumer
    /// of the given Generation
    ///
    /// # Safety
    /// The caller must have claimed `generation` on the write Cursor while the
    /// Marker was equal to `generation`, which guarantees that no other Thread
    /// accesses the Data of this Slot until the Marker is published.
    #[inline]
    pub unsafe fn store(&self, generation: u64, data: T) {
        self.data.with_mut(|ptr| unsafe { ptr.write(MaybeUninit::new(data)) });

        self.marker.store(generation + 1, atomic::Ordering::Release);
    }

    /// Moves the Data out of the Slot and hands the Slot over to the Producer
    /// of the Generation one lap ahead
    ///
    /// # Safety
    /// The caller must have claimed `generation` on the read Cursor while the
    /// Marker was equal to `generation + 1`, so the Data is initialized and
    /// no other Thread touches it until the Marker is released again.
    #[inline]
    pub unsafe fn take(&self, generation: u64, lap: u64) -> T {
        let data = self.data.with_mut(|ptr| unsafe { ptr.read().assume_init() });

        self.marker.store(generation + lap, atomic::Ordering::Release);

        data
    }

    /// Drops the Data stored in the Slot without updating the Marker
    ///
    /// # Safety
    /// The Slot must contain initialized Data and there must not be any other
    /// access to it, which is only the case while the Queue itself is dropped.
    pub unsafe fn drop_in_place(&self) {
        self.data
            .with_mut(|ptr| unsafe { (*ptr).assume_init_drop() });
    }
}
