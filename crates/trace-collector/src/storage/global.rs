use crate::clock::Clock;
use crate::sample::{Sample, SampleKind};
use crate::snapshot::{build_snapshot, SamplesSnapshot};
use crate::storage::StorageAdapter;
use crate::thread_names::{current_thread_id, ThreadNameSet};
use std::sync::Mutex;
use trace_rings::{Backoff, Config, MpscRing};

/// One shared ring, all producers.
pub struct GlobalStorage<C: Clock> {
    ring: MpscRing<Sample<C::Sample>>,
    pending_names: Mutex<ThreadNameSet>,
}

impl<C: Clock> GlobalStorage<C> {
    pub fn new(config: Config) -> Self {
        Self {
            ring: MpscRing::new(config),
            pending_names: Mutex::new(ThreadNameSet::new()),
        }
    }
}

impl<C: Clock> StorageAdapter<C> for GlobalStorage<C> {
    fn add_sample(
        &self,
        category: &'static str,
        name: &'static str,
        kind: SampleKind,
        clock_sample: C::Sample,
        thread_id: Option<u64>,
    ) {
        let sample = Sample {
            category,
            name,
            kind,
            thread_id: thread_id.unwrap_or_else(current_thread_id),
            clock_sample,
        };
        // Per spec.md §4.3.1/§7.2, only ring overflow is allowed to lose a
        // sample — a `NotPushedDueToContention` failure is a lapped
        // producer that hasn't finished publishing yet, not a full ring,
        // so it must be retried until it succeeds rather than dropped.
        let mut backoff = Backoff::new();
        while self.ring.try_push(sample).is_err() {
            backoff.snooze();
        }
    }

    fn reset(&self) {
        self.ring.reset();
        self.pending_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reset();
    }

    fn take_all_samples(&self, clock: &C) -> SamplesSnapshot {
        let mut drained = Vec::new();
        self.ring.drain_into(|s| drained.push(s));

        let names = std::mem::take(&mut *self.pending_names.lock().unwrap_or_else(|e| e.into_inner()));
        build_snapshot(drained, clock, names)
    }

    fn remember_current_thread_name_for_next_snapshot(&self) {
        self.pending_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fetch_and_remember_name_of_current_thread();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;

    #[test]
    fn single_thread_spsc_overflow_keeps_newest() {
        let storage = GlobalStorage::<MonotonicClock>::new(Config::new(2, false)); // 4 slots
        let clock = MonotonicClock::new();

        for i in 1..=6u32 {
            storage.add_sample("cat", "span", SampleKind::Enter, clock.query(), Some(i as u64));
        }

        let snapshot = storage.take_all_samples(&clock);
        assert_eq!(snapshot.size(), 4);
        let tids: Vec<u64> = snapshot.samples().iter().map(|s| s.thread_id).collect();
        assert_eq!(tids, vec![3, 4, 5, 6]);
    }
}
