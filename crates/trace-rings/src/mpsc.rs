use crate::invariants::debug_assert_slot_transition;
use crate::{Backoff, Config, Metrics, MetricsSnapshot};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use thiserror::Error;

const EMPTY: u8 = 0;
const RESERVED: u8 = 1;
const WRITTEN: u8 = 2;

/// Bounded spin budget for the one genuine producer-side hazard this ring
/// has left once pushes are no longer gated on capacity: a producer that
/// claims vindex `v` must wait if the physical slot at `v mod capacity` is
/// still `Reserved` by a producer that claimed `v - capacity` and has not
/// finished writing it yet. This requires a producer to still be mid-write
/// a full lap behind, which needs pathological scheduling to occur at all.
const MAX_SLOT_WAIT_ATTEMPTS: u32 = 10_000;

/// Error returned when a producer could not publish a slot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TryPushError {
    /// A producer a full lap behind never finished publishing its slot
    /// within the retry budget. This is the ring's only non-lossy
    /// contention failure; it does not indicate the ring is full (the
    /// ring has no "full" state — it overwrites the oldest unread sample
    /// instead).
    #[error("sample not pushed: a lapped producer never released its slot")]
    NotPushedDueToContention,
}

struct Slot<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Wrapper type that ensures 128-byte alignment to prevent false sharing
/// between the producer-shared write cursor and the consumer-only read
/// cursor.
#[repr(align(128))]
struct CacheAligned<T> {
    value: T,
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// Multi-producer single-consumer ring buffer with a shared, per-slot
/// tagged transaction state.
///
/// Producers claim a vindex with an atomic fetch-add on the shared write
/// cursor — unconditional, since the ring has no "full" rejection: an
/// overflowing claim simply reuses (and overwrites) the physical slot the
/// oldest unread sample occupies, per this crate's bounded-loss contract.
/// Each slot additionally carries an `Empty/Reserved/Written` tag so the
/// single consumer can tell a slot that is mid-write (`Reserved`) from one
/// that is safely readable (`Written`), and never reads a slot its
/// producer has claimed but not yet finished filling in.
pub struct MpscRing<T> {
    write_vindex: CacheAligned<AtomicU64>,
    read_vindex: CacheAligned<AtomicU64>,
    slots: Box<[Slot<T>]>,
    config: Config,
    metrics: Metrics,
}

unsafe impl<T: Send> Send for MpscRing<T> {}
unsafe impl<T: Send> Sync for MpscRing<T> {}

impl<T> MpscRing<T> {
    pub fn new(config: Config) -> Self {
        let capacity = config.capacity();
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::new);

        Self {
            write_vindex: CacheAligned {
                value: AtomicU64::new(0),
            },
            read_vindex: CacheAligned {
                value: AtomicU64::new(0),
            },
            slots: slots.into_boxed_slice(),
            config,
            metrics: Metrics::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.config.mask()
    }

    /// Number of currently readable samples: `min(write - read, capacity)`.
    #[inline]
    pub fn len(&self) -> usize {
        let write = self.write_vindex.load(Ordering::Relaxed);
        let read = self.read_vindex.load(Ordering::Relaxed);
        let total = write.wrapping_sub(read);
        total.min(self.capacity() as u64) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resets both vindices and all slot states. Not safe to call while
    /// any producer or consumer may be concurrently active.
    pub fn reset(&self) {
        self.write_vindex.store(0, Ordering::Relaxed);
        self.read_vindex.store(0, Ordering::Relaxed);
        for slot in self.slots.iter() {
            slot.state.store(EMPTY, Ordering::Relaxed);
        }
    }

    /// Claims the next vindex and publishes `item` into its slot.
    ///
    /// Never fails due to a full ring — overflow overwrites the oldest
    /// unread sample. The only failure is [`TryPushError::NotPushedDueToContention`],
    /// returned if a producer a full lap behind is still occupying the
    /// target physical slot after the retry budget is exhausted.
    pub fn try_push(&self, item: T) -> Result<(), TryPushError> {
        let claimed = self.write_vindex.fetch_add(1, Ordering::Relaxed);
        let idx = (claimed as usize) & self.mask();
        let slot = &self.slots[idx];

        let mut backoff = Backoff::new();
        let mut attempts = 0u32;
        loop {
            let prev = slot.state.load(Ordering::Acquire);
            if prev != RESERVED {
                break;
            }
            if attempts >= MAX_SLOT_WAIT_ATTEMPTS {
                return Err(TryPushError::NotPushedDueToContention);
            }
            if self.config.enable_metrics {
                self.metrics.add_reserve_spins(1);
            }
            backoff.snooze();
            attempts += 1;
        }

        slot.state.store(RESERVED, Ordering::Relaxed);

        // SAFETY: this producer uniquely holds vindex `claimed`; the wait
        // loop above ensures no other producer is still writing this
        // physical slot, and the consumer will not touch it until it
        // observes state == WRITTEN. Any unread value already there is
        // overwritten and lost, which is this ring's documented overflow
        // behavior.
        unsafe {
            (*slot.value.get()).write(item);
        }

        let prev = slot.state.swap(WRITTEN, Ordering::Release);
        debug_assert_slot_transition!(prev, WRITTEN, RESERVED);

        if self.config.enable_metrics {
            self.metrics.add_messages_sent(1);
        }

        Ok(())
    }

    /// Drains all contiguously readable samples starting at the first
    /// unconsumed vindex still within the last `capacity` claims, in
    /// vindex order, stopping at the first slot not yet published (a
    /// producer may have claimed it but not yet written it).
    ///
    /// Only safe to call from a single consumer at a time — see
    /// [`crate::MpmcRing`] for a variant safe under concurrent consumers.
    pub fn drain_into<F: FnMut(T)>(&self, mut sink: F) -> usize {
        let read = self.read_vindex.load(Ordering::Relaxed);
        let write = self.write_vindex.load(Ordering::Relaxed);
        let capacity = self.capacity() as u64;
        let mut pos = if write.wrapping_sub(read) > capacity {
            write - capacity
        } else {
            read
        };
        let mut count = 0usize;

        loop {
            let idx = (pos as usize) & self.mask();
            let slot = &self.slots[idx];

            if slot.state.load(Ordering::Acquire) != WRITTEN {
                break;
            }

            // SAFETY: slot is WRITTEN, so the producer's write happened
            // before this Acquire load observed it; assume_init_read moves
            // ownership out exactly once before the slot resets to EMPTY.
            let item = unsafe { (*slot.value.get()).assume_init_read() };

            let prev = slot.state.swap(EMPTY, Ordering::Release);
            debug_assert_slot_transition!(prev, EMPTY, WRITTEN);

            sink(item);
            pos = pos.wrapping_add(1);
            count += 1;
        }

        if pos != read {
            self.read_vindex.store(pos, Ordering::Release);
        }
        if count > 0 && self.config.enable_metrics {
            self.metrics.add_messages_received(count as u64);
            self.metrics.add_batches_received(1);
        }

        count
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl<T> Drop for MpscRing<T> {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            if *slot.state.get_mut() == WRITTEN {
                // SAFETY: state WRITTEN means the value is initialized and
                // nothing else can be accessing it during drop.
                unsafe {
                    std::ptr::drop_in_place((*slot.value.get()).as_mut_ptr());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn single_producer_roundtrip() {
        let ring = MpscRing::<u64>::new(Config::new(4, false));
        for i in 0..10 {
            ring.try_push(i).unwrap();
        }
        let mut out = Vec::new();
        let consumed = ring.drain_into(|item| out.push(item));
        assert_eq!(consumed, 10);
        assert_eq!(out, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn overflow_overwrites_oldest_and_never_fails() {
        let ring = MpscRing::<u64>::new(Config::new(2, false)); // 4 slots
        for i in 1..=6u64 {
            ring.try_push(i).unwrap();
        }
        let mut out = Vec::new();
        ring.drain_into(|item| out.push(item));
        assert_eq!(out, vec![3, 4, 5, 6]);
    }

    #[test]
    fn many_producers_all_items_eventually_drained() {
        // Capacity 4096 comfortably exceeds the 1600 items this test
        // produces, so the concurrent consumer falling behind can never
        // cause an overwrite — the exact counts below stay deterministic
        // regardless of scheduling.
        let ring = Arc::new(MpscRing::<u64>::new(Config::new(12, false)));
        let produced = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|p| {
                let ring = Arc::clone(&ring);
                let produced = Arc::clone(&produced);
                thread::spawn(move || {
                    for i in 0..200u64 {
                        ring.try_push(p * 1000 + i).unwrap();
                        produced.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        let mut total_consumed = 0usize;
        while total_consumed < 1600 {
            total_consumed += ring.drain_into(|_item| {});
            thread::yield_now();
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(produced.load(Ordering::SeqCst), 1600);
        assert_eq!(total_consumed, 1600);
        assert!(ring.is_empty());
    }

    #[test]
    fn drop_runs_for_undrained_items() {
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct Tracker;
        impl Drop for Tracker {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);
        {
            // Capacity 8 comfortably holds 5 items without overwrite, so
            // dropping the ring drops all 5 exactly once.
            let ring = MpscRing::<Tracker>::new(Config::new(3, false));
            for _ in 0..5 {
                ring.try_push(Tracker).unwrap();
            }
        }
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 5);
    }
}
