//! Per-processor storage adapter: one ring per CPU, selected on each
//! push via the processor-id lookup.

use crate::clock::Clock;
use crate::processor_id::{get_current_processor_id, get_maximum_processor_id, ProcessorIdCache};
use crate::sample::{Sample, SampleKind};
use crate::snapshot::{build_snapshot_from_sorted_shards, SamplesSnapshot};
use crate::storage::StorageAdapter;
use crate::thread_names::{current_thread_id, ThreadNameSet};
use std::cell::RefCell;
use std::sync::Mutex;
use trace_rings::{Backoff, Config, MpscRing};

/// One ring per CPU, sized to `max_processor_id + 1` at construction.
/// Each shard is an `MpscRing` since more than one producer thread can
/// be scheduled on the same processor over time.
pub struct PerProcessorStorage<C: Clock> {
    rings: Vec<MpscRing<Sample<C::Sample>>>,
    pending_names: Mutex<ThreadNameSet>,
    /// Snapshot-wide lock: a drain reads every shard, so two concurrent
    /// drains must be serialized the same way a single-consumer ring
    /// would be.
    drain_lock: Mutex<()>,
}

impl<C: Clock> PerProcessorStorage<C> {
    pub fn new(config: Config) -> Self {
        let shard_count = get_maximum_processor_id() as usize + 1;
        let rings = (0..shard_count).map(|_| MpscRing::new(config)).collect();
        Self {
            rings,
            pending_names: Mutex::new(ThreadNameSet::new()),
            drain_lock: Mutex::new(()),
        }
    }

    /// Number of processor shards this adapter was sized for.
    pub fn shard_count(&self) -> usize {
        self.rings.len()
    }
}

impl<C: Clock> StorageAdapter<C> for PerProcessorStorage<C> {
    fn add_sample(
        &self,
        category: &'static str,
        name: &'static str,
        kind: SampleKind,
        clock_sample: C::Sample,
        thread_id: Option<u64>,
    ) {
        thread_local! {
            static CACHE: RefCell<ProcessorIdCache> = RefCell::new(ProcessorIdCache::new());
        }

        let processor_id =
            CACHE.with(|cache| get_current_processor_id(&cache.borrow())) as usize;
        // CPU hot-plug beyond the shard count sized at construction is
        // not tracked; clamp rather than index out of bounds.
        let shard = processor_id.min(self.rings.len() - 1);

        let sample = Sample {
            category,
            name,
            kind,
            thread_id: thread_id.unwrap_or_else(current_thread_id),
            clock_sample,
        };

        // Per spec.md §4.3.3/§7.2, only this shard's overflow is allowed
        // to lose a sample — a `NotPushedDueToContention` failure is a
        // lapped producer still mid-write, not a full ring, so it must be
        // retried until it succeeds rather than dropped.
        let mut backoff = Backoff::new();
        while self.rings[shard].try_push(sample).is_err() {
            backoff.snooze();
        }
    }

    fn reset(&self) {
        let _guard = self.drain_lock.lock().unwrap_or_else(|e| e.into_inner());
        for ring in &self.rings {
            ring.reset();
        }
        self.pending_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reset();
    }

    fn take_all_samples(&self, clock: &C) -> SamplesSnapshot {
        let _guard = self.drain_lock.lock().unwrap_or_else(|e| e.into_inner());

        let shards: Vec<Vec<Sample<C::Sample>>> = self
            .rings
            .iter()
            .map(|ring| {
                let mut shard = Vec::new();
                ring.drain_into(|s| shard.push(s));
                shard
            })
            .collect();

        let names = std::mem::take(
            &mut *self
                .pending_names
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
        build_snapshot_from_sorted_shards(shards, clock, names)
    }

    fn remember_current_thread_name_for_next_snapshot(&self) {
        self.pending_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fetch_and_remember_name_of_current_thread();
    }
}
