//! Snapshot builder: converts a drained, (at least locally) timestamp-
//! ordered stream of producer-side samples into an immutable, globally
//! timestamp-ordered [`SamplesSnapshot`] with an attached thread-name set.

use crate::clock::Clock;
use crate::sample::{Sample, SnapshotSample};
use crate::thread_names::ThreadNameSet;

/// An immutable, timestamp-ordered sequence of samples with an attached
/// thread-id → name mapping.
#[derive(Debug, Clone, Default)]
pub struct SamplesSnapshot {
    samples: Vec<SnapshotSample>,
    thread_names: ThreadNameSet,
}

impl SamplesSnapshot {
    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn at(&self, i: usize) -> &SnapshotSample {
        &self.samples[i]
    }

    pub fn samples(&self) -> &[SnapshotSample] {
        &self.samples
    }

    pub fn thread_name(&self, tid: u64) -> Option<&str> {
        self.thread_names.name_for(tid)
    }

    /// Thread ids referenced by at least one sample, in first-occurrence
    /// order.
    pub fn thread_ids(&self) -> Vec<u64> {
        let mut seen = Vec::new();
        for sample in &self.samples {
            if !seen.contains(&sample.thread_id) {
                seen.push(sample.thread_id);
            }
        }
        seen
    }

    pub fn thread_names(&self) -> &ThreadNameSet {
        &self.thread_names
    }
}

/// Converts drained producer-side samples into a [`SamplesSnapshot`]:
/// applies the clock's `make_time_point` to each, stably sorts by
/// timestamp (the single general mechanism that gives every storage
/// adapter a non-decreasing timestamp order; the per-processor adapter
/// additionally does its own cheaper shard-at-a-time merge before
/// calling this, since its shards are already locally sorted), then
/// resolves the name of every referenced thread id not already in
/// `thread_names`.
pub fn build_snapshot<C: Clock>(
    drained: Vec<Sample<C::Sample>>,
    clock: &C,
    mut thread_names: ThreadNameSet,
) -> SamplesSnapshot {
    let mut samples: Vec<SnapshotSample> = drained
        .into_iter()
        .map(|s| SnapshotSample {
            category: s.category,
            name: s.name,
            kind: s.kind,
            thread_id: s.thread_id,
            timestamp: clock.make_time_point(s.clock_sample),
        })
        .collect();

    samples.sort_by_key(|s| s.timestamp);

    for sample in &samples {
        if thread_names.name_for(sample.thread_id).is_none() {
            thread_names.fetch_and_remember_thread_name_for_id(sample.thread_id);
        }
    }

    SamplesSnapshot {
        samples,
        thread_names,
    }
}

/// Builds a snapshot from per-shard streams that are each already sorted
/// by timestamp, merging them one shard boundary at a time rather than
/// running a single sort over the whole output.
pub fn build_snapshot_from_sorted_shards<C: Clock>(
    shards: Vec<Vec<Sample<C::Sample>>>,
    clock: &C,
    mut thread_names: ThreadNameSet,
) -> SamplesSnapshot {
    let mut out: Vec<SnapshotSample> = Vec::new();

    for shard in shards {
        let mark = out.len();
        out.extend(shard.into_iter().map(|s| SnapshotSample {
            category: s.category,
            name: s.name,
            kind: s.kind,
            thread_id: s.thread_id,
            timestamp: clock.make_time_point(s.clock_sample),
        }));
        inplace_merge_by_timestamp(&mut out, mark);
    }

    for sample in &out {
        if thread_names.name_for(sample.thread_id).is_none() {
            thread_names.fetch_and_remember_thread_name_for_id(sample.thread_id);
        }
    }

    SamplesSnapshot {
        samples: out,
        thread_names,
    }
}

/// Merges the two already-sorted runs `out[..mark]` and `out[mark..]`
/// into a single run sorted by timestamp, leaving the result in `out`.
fn inplace_merge_by_timestamp(out: &mut Vec<SnapshotSample>, mark: usize) {
    if mark == 0 || mark == out.len() {
        return;
    }

    let mut merged = Vec::with_capacity(out.len());
    let (left, right) = out.split_at(mark);
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        if left[i].timestamp <= right[j].timestamp {
            merged.push(left[i]);
            i += 1;
        } else {
            merged.push(right[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);

    *out = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use crate::sample::SampleKind;

    #[test]
    fn build_snapshot_sorts_by_timestamp() {
        let clock = MonotonicClock::new();
        let t0 = clock.query();
        std::thread::sleep(std::time::Duration::from_micros(5));
        let t1 = clock.query();

        let drained = vec![
            Sample {
                category: "cat",
                name: "b",
                kind: SampleKind::Enter,
                thread_id: 1,
                clock_sample: t1,
            },
            Sample {
                category: "cat",
                name: "a",
                kind: SampleKind::Enter,
                thread_id: 1,
                clock_sample: t0,
            },
        ];

        let snapshot = build_snapshot(drained, &clock, ThreadNameSet::new());
        assert_eq!(snapshot.size(), 2);
        assert_eq!(snapshot.at(0).name, "a");
        assert_eq!(snapshot.at(1).name, "b");
    }
}
