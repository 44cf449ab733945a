//! Bounded lock-free single-producer/single-consumer queue.
//!
//! Decouples the high-rate capture thread from a slower consumer without
//! blocking either side. The producer exclusively owns the write counter and
//! the consumer exclusively owns the read counter; the only synchronization
//! is the acquire/release pairing on the *other* side's counter, which
//! guarantees a slot write is visible before the counter update announcing it.
//!
//! This structure is SPSC only. Multiple producers or consumers would need a
//! compare-and-swap retry strategy and must not be retrofitted here.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pads an atomic counter out to its own cache line so that producer and
/// consumer counter writes never invalidate each other's cached copy.
#[repr(align(64))]
struct CacheAligned<T>(T);

/// Shared queue storage. Constructed through [`SpscQueue::new`], which hands
/// out the single [`Producer`] and single [`Consumer`] handle.
pub struct SpscQueue<T, const N: usize> {
    /// Next write position. Only the producer stores to it.
    write_pos: CacheAligned<AtomicU64>,
    /// Next read position. Only the consumer stores to it.
    read_pos: CacheAligned<AtomicU64>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// The slots are only touched by the producer (writes) and consumer (reads),
// partitioned by the counters; the counters themselves are atomic.
unsafe impl<T: Send, const N: usize> Sync for SpscQueue<T, N> {}

impl<T: Send, const N: usize> SpscQueue<T, N> {
    const CAPACITY_OK: () = assert!(
        N.is_power_of_two() && N >= 2,
        "queue capacity must be a power of two, at least 2"
    );

    /// Create a queue and split it into its two endpoint handles.
    ///
    /// The handles are `Send` but not clonable, so the one-writer/one-reader
    /// discipline is enforced by the type system.
    #[allow(clippy::let_unit_value)]
    pub fn new() -> (Producer<T, N>, Consumer<T, N>) {
        let () = Self::CAPACITY_OK;

        let mut slots = Vec::with_capacity(N);
        for _ in 0..N {
            slots.push(UnsafeCell::new(MaybeUninit::uninit()));
        }

        let queue = Arc::new(Self {
            write_pos: CacheAligned(AtomicU64::new(0)),
            read_pos: CacheAligned(AtomicU64::new(0)),
            slots: slots.into_boxed_slice(),
        });

        (
            Producer {
                queue: Arc::clone(&queue),
            },
            Consumer { queue },
        )
    }

    /// Approximate number of unread items. Monitoring only: the counters move
    /// concurrently, so the value may be stale by the time it is returned.
    fn len(&self) -> usize {
        let write = self.write_pos.0.load(Ordering::Acquire);
        let read = self.read_pos.0.load(Ordering::Acquire);
        write.saturating_sub(read) as usize
    }

    fn is_empty(&self) -> bool {
        let read = self.read_pos.0.load(Ordering::Acquire);
        let write = self.write_pos.0.load(Ordering::Acquire);
        read == write
    }

    fn is_full(&self) -> bool {
        let write = self.write_pos.0.load(Ordering::Acquire);
        let read = self.read_pos.0.load(Ordering::Acquire);
        write + 1 - read >= N as u64
    }
}

impl<T, const N: usize> Drop for SpscQueue<T, N> {
    fn drop(&mut self) {
        // Both handles are gone at this point, so plain loads are enough.
        let read = self.read_pos.0.load(Ordering::Relaxed);
        let write = self.write_pos.0.load(Ordering::Relaxed);
        for pos in read..write {
            let index = (pos as usize) & (N - 1);
            unsafe { (*self.slots[index].get()).assume_init_drop() };
        }
    }
}

/// Write endpoint. Exactly one per queue; lives on the capture thread.
pub struct Producer<T, const N: usize> {
    queue: Arc<SpscQueue<T, N>>,
}

impl<T: Send, const N: usize> Producer<T, N> {
    /// Attempt to enqueue an item without blocking.
    ///
    /// Returns the item back untouched when the queue is full; the caller
    /// decides whether to retry, drop, or back off, and owns any drop
    /// accounting. The queue itself never retries.
    pub fn try_push(&mut self, item: T) -> Result<(), T> {
        let queue = &*self.queue;

        // Only this thread writes the write position, so a relaxed read of
        // our own counter is sufficient.
        let write = queue.write_pos.0.load(Ordering::Relaxed);
        let next_write = write + 1;

        // Acquire: must observe the consumer's latest progress, or a stale
        // read position could make a non-full queue look full.
        let read = queue.read_pos.0.load(Ordering::Acquire);
        if next_write - read >= N as u64 {
            return Err(item);
        }

        let index = (write as usize) & (N - 1);
        unsafe { (*queue.slots[index].get()).write(item) };

        // Release: the slot write above must be visible before the position
        // update that announces it to the consumer.
        queue.write_pos.0.store(next_write, Ordering::Release);
        Ok(())
    }

    /// Approximate occupancy; monitoring only.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Approximate emptiness; monitoring only.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Approximate fullness; monitoring only.
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Fraction of slots occupied (0.0 to 1.0); monitoring only.
    pub fn utilization(&self) -> f32 {
        self.queue.len() as f32 / N as f32
    }
}

/// Read endpoint. Exactly one per queue; lives on the consumer thread.
pub struct Consumer<T, const N: usize> {
    queue: Arc<SpscQueue<T, N>>,
}

impl<T: Send, const N: usize> Consumer<T, N> {
    /// Attempt to dequeue an item without blocking.
    pub fn try_pop(&mut self) -> Option<T> {
        let queue = &*self.queue;

        // Only this thread writes the read position.
        let read = queue.read_pos.0.load(Ordering::Relaxed);

        // Acquire: pairs with the producer's release store, making the slot
        // contents visible before we read them.
        let write = queue.write_pos.0.load(Ordering::Acquire);
        if read == write {
            return None;
        }

        let index = (read as usize) & (N - 1);
        let item = unsafe { (*queue.slots[index].get()).assume_init_read() };

        // Release: the slot is free again once the producer observes this.
        queue.read_pos.0.store(read + 1, Ordering::Release);
        Some(item)
    }

    /// Approximate occupancy; monitoring only.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Approximate emptiness; monitoring only.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Fraction of slots occupied (0.0 to 1.0); monitoring only.
    pub fn utilization(&self) -> f32 {
        self.queue.len() as f32 / N as f32
    }
}
