use crate::invariants::{debug_assert_monotonic, debug_assert_no_wrap};
use crate::{Config, Metrics, Reservation};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Single-producer single-consumer ring buffer. Read and write positions
// are 64-bit "virtual indexes" (vindex) that grow without wrap; the
// physical slot for vindex `v` is `v mod capacity`.
//
// ## Bounded loss, not backpressure
//
// The producer never blocks and `push`/`reserve` never fail because the
// ring is full: a full ring is handled by letting the new write land on
// the physical slot the oldest unread sample occupies, silently losing
// it. `tail` therefore grows without regard to `head`; only the
// *readable* range `[max(head, tail - capacity), tail)` is bounded to
// `capacity` entries. This is the "lossy bounded ring buffer" contract —
// the only non-lossy failure is index-type overflow (unreachable for a
// 64-bit vindex on any human timescale).
//
// ## Sequence Numbers (ABA Prevention)
//
// We use unbounded u64 vindices for `head` and `tail` instead of wrapped
// indices. This prevents the ABA problem entirely:
// - With 2^64 possible values, wrap-around is practically impossible
// - At 10 billion messages/second, wrap takes ~58 years
// - Buffer index is computed as `vindex & mask` only when accessing slots
//
// ## Memory Ordering Protocol
//
// **Producer (write path):**
// 1. Load `tail` with Relaxed (only producer writes tail)
// 2. Write data to the buffer slot (no ordering needed - protected by protocol)
// 3. Store `tail` with Release (publishes the write to the consumer)
//
// **Consumer (read path):**
// 1. Load `head` with Relaxed (only consumer writes head)
// 2. Load `tail` with Acquire (synchronizes with the producer's Release)
// 3. Read data from the buffer slots (no ordering needed - protected by protocol)
// 4. Store `head` with Release (publishes consumption to the producer)
//
// The producer may race the consumer on a slot only when overwriting data
// the consumer has not yet read; this is the ring's one lossy case and is
// safe because the lost sample was never handed to the consumer.
//
// =============================================================================

/// Single-producer single-consumer ring buffer — the core building block.
///
/// A lock-free ring buffer optimized with:
/// - 128-byte alignment to prevent false sharing
/// - Cached sequence numbers to minimize cross-core traffic
/// - Batch operations to amortize atomic overhead
///
/// `push`/`reserve` never fail due to contention or a full ring — there is
/// only one producer, and overflow overwrites the oldest unread sample
/// rather than rejecting the new one.
#[repr(C)]
pub struct SpscRing<T> {
    // === PRODUCER HOT === (128-byte aligned)
    tail: CacheAligned<AtomicU64>,

    // === CONSUMER HOT === (128-byte aligned)
    head: CacheAligned<AtomicU64>,

    // === COLD STATE ===
    closed: AtomicBool,
    metrics: Metrics,
    config: Config,

    // === DATA BUFFER ===
    buffer: UnsafeCell<Box<[MaybeUninit<T>]>>,
}

// Safety: SpscRing is Send + Sync as long as T is Send. The atomic
// operations and the single-producer/single-consumer discipline on
// tail/head ensure proper synchronization between the two sides.
unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    /// Creates a new ring buffer with the given configuration.
    pub fn new(config: Config) -> Self {
        let capacity = config.capacity();

        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, MaybeUninit::uninit);
        let buffer = buffer.into_boxed_slice();

        Self {
            tail: CacheAligned::new(AtomicU64::new(0)),
            head: CacheAligned::new(AtomicU64::new(0)),
            closed: AtomicBool::new(false),
            metrics: Metrics::new(),
            config,
            buffer: UnsafeCell::new(buffer),
        }
    }

    // ---------------------------------------------------------------------
    // CONSTANTS & STATUS
    // ---------------------------------------------------------------------

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.config.mask()
    }

    /// Number of currently readable samples: `min(tail - head, capacity)`.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Relaxed);
        readable_count(head, tail, self.capacity())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resets both vindices to zero, discarding any undrained samples.
    ///
    /// Not safe to call concurrently with a producer or consumer in
    /// progress — callers own exclusive access at reset time, which is
    /// typically only between snapshots.
    pub fn reset(&self) {
        self.tail.store(0, Ordering::Relaxed);
        self.head.store(0, Ordering::Relaxed);
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Reserves `n` contiguous slots for zero-copy writing.
    ///
    /// Returns `None` only for a zero/oversized request or a closed ring —
    /// never because the ring is full: a full ring's reservation overwrites
    /// the oldest unread samples, which is the bounded-loss contract every
    /// ring in this crate implements.
    ///
    /// **Important:** the returned [`Reservation`] may contain **fewer
    /// than `n` items** if the reservation wraps around the ring buffer.
    /// Always check the slice length.
    #[allow(clippy::cast_possible_truncation)]
    pub fn reserve(&self, n: usize) -> Option<Reservation<'_, T>> {
        if n == 0 || n > self.capacity() || self.is_closed() {
            return None;
        }

        let tail = self.tail.load(Ordering::Relaxed);
        Some(self.make_reservation(tail, n))
    }

    /// Retained for callers written against a flow-controlled ring:
    /// [`Self::reserve`] itself never blocks on a full ring, so this is
    /// just [`Self::reserve`] — it only still returns `None` for a closed
    /// ring or an invalid `n`.
    #[inline]
    pub fn reserve_with_backoff(&self, n: usize) -> Option<Reservation<'_, T>> {
        self.reserve(n)
    }

    fn make_reservation(&self, tail: u64, n: usize) -> Reservation<'_, T> {
        let mask = self.mask();
        let idx = (tail as usize) & mask;
        let contiguous = n.min(self.capacity() - idx);

        // SAFETY: idx is within bounds. The consumer will not observe
        // these slots as readable until commit() publishes the new tail
        // via Release; if they already held unread data, that data is
        // now lost, which is this ring's documented overflow behavior.
        let slice = unsafe {
            let buffer = &mut *self.buffer.get();
            &mut buffer[idx..idx + contiguous]
        };

        let ring_ptr = self as *const Self;
        Reservation::new(slice, ring_ptr)
    }

    /// Internal: commit n slots after writing. Called by [`Reservation`].
    pub(crate) fn commit_internal(&self, n: usize) {
        let tail = self.tail.load(Ordering::Relaxed);
        let new_tail = tail.wrapping_add(n as u64);

        debug_assert_monotonic!("tail", tail, new_tail);
        debug_assert_no_wrap!("tail", tail, new_tail);

        self.tail.store(new_tail, Ordering::Release);

        if self.config.enable_metrics {
            self.metrics.add_messages_sent(n as u64);
            self.metrics.add_batches_sent(1);
        }
    }

    /// Send a single item. Always succeeds unless the ring is closed,
    /// overwriting the oldest unread sample if the ring was full.
    #[inline]
    pub fn push(&self, item: T) -> bool {
        self.reserve(1).is_some_and(|mut r| {
            r.as_mut_slice()[0] = MaybeUninit::new(item);
            r.commit();
            true
        })
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// The readable range `[start, tail)`, skipping any prefix the
    /// producer has already overwritten since `head` was last advanced.
    fn effective_start(&self, head: u64, tail: u64) -> u64 {
        let capacity = self.capacity() as u64;
        if tail.wrapping_sub(head) > capacity {
            tail - capacity
        } else {
            head
        }
    }

    /// Get readable slice. Returns None if empty.
    #[allow(clippy::cast_possible_truncation)]
    pub fn readable(&self) -> Option<&[T]> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let start = self.effective_start(head, tail);

        if start == tail {
            return None;
        }

        let avail = tail.wrapping_sub(start) as usize;
        let mask = self.mask();
        let idx = (start as usize) & mask;
        let contiguous = avail.min(self.capacity() - idx);

        // SAFETY: items in [start, tail) were published via Release and
        // the Acquire load above synchronizes with that store.
        unsafe {
            let buffer = &*self.buffer.get();
            Some(std::slice::from_raw_parts(
                buffer[idx..].as_ptr().cast::<T>(),
                contiguous,
            ))
        }
    }

    /// Advance head by `n` items after reading them via [`Self::readable`].
    #[inline]
    pub fn advance(&self, n: usize) {
        let head = self.head.load(Ordering::Relaxed);
        let new_head = head.wrapping_add(n as u64);

        self.head.store(new_head, Ordering::Release);

        if self.config.enable_metrics {
            self.metrics.add_messages_received(n as u64);
            self.metrics.add_batches_received(1);
        }
    }

    /// Process ALL currently readable items with a single head update,
    /// transferring ownership to `handler`. This is the
    /// [`Self::drain_into`] primitive.
    #[allow(clippy::cast_possible_truncation)]
    pub fn consume_batch_owned<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(T),
    {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let start = self.effective_start(head, tail);

        if start == tail {
            return 0;
        }

        let mask = self.mask();
        let mut pos = start;
        let mut count = 0;

        while pos != tail {
            let idx = (pos as usize) & mask;
            // SAFETY: items in [start, tail) were fully written by the
            // producer and published via the Acquire load on tail above;
            // assume_init_read moves ownership out before the slot is
            // reused, and only the consumer reads these slots.
            let item = unsafe {
                let buffer = &*self.buffer.get();
                buffer[idx].assume_init_read()
            };
            handler(item);
            pos = pos.wrapping_add(1);
            count += 1;
        }

        self.head.store(tail, Ordering::Release);

        if self.config.enable_metrics {
            self.metrics.add_messages_received(count as u64);
            self.metrics.add_batches_received(1);
        }

        count
    }

    /// Drains all currently readable samples into `sink`, in vindex
    /// order, advancing `read_vindex` to the current `write_vindex`.
    pub fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        self.consume_batch_owned(sink)
    }

    /// Like [`Self::drain_into`] but stops after at most `max` items,
    /// still amortizing to a single head update for whatever it consumed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn consume_up_to<F>(&self, max: usize, mut handler: F) -> usize
    where
        F: FnMut(T),
    {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let start = self.effective_start(head, tail);

        let avail = (tail.wrapping_sub(start) as usize).min(max);
        if avail == 0 {
            return 0;
        }

        let mask = self.mask();
        let new_head = start.wrapping_add(avail as u64);
        let mut pos = start;

        while pos != new_head {
            let idx = (pos as usize) & mask;
            // SAFETY: items in [start, new_head) ⊆ [start, tail) were
            // fully written by the producer and published via the
            // Acquire load on tail above.
            let item = unsafe {
                let buffer = &*self.buffer.get();
                buffer[idx].assume_init_read()
            };
            handler(item);
            pos = pos.wrapping_add(1);
        }

        self.head.store(new_head, Ordering::Release);

        if self.config.enable_metrics {
            self.metrics.add_messages_received(avail as u64);
            self.metrics.add_batches_received(1);
        }

        avail
    }

    /// Close the ring, preventing further reservations.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Snapshot of this ring's metrics, if enabled.
    pub fn metrics(&self) -> crate::MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            crate::MetricsSnapshot::default()
        }
    }
}

#[inline]
fn readable_count(head: u64, tail: u64, capacity: usize) -> usize {
    let total = tail.wrapping_sub(head);
    total.min(capacity as u64) as usize
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        let start = self.effective_start(head, tail);
        let count = tail.wrapping_sub(start) as usize;

        if count > 0 {
            let mask = self.mask();
            let buffer = self.buffer.get_mut();

            for i in 0..count {
                let idx = ((start as usize).wrapping_add(i)) & mask;
                // SAFETY: slots in [start, tail) are initialized; nothing
                // else can access the ring once it is being dropped.
                unsafe {
                    ptr::drop_in_place(buffer[idx].as_mut_ptr());
                }
            }
        }
    }
}

/// Wrapper type that ensures 128-byte alignment to prevent prefetcher-induced
/// false sharing between producer-hot and consumer-hot fields.
#[repr(align(128))]
struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
