//! Storage adapters: compositions of a ring primitive with a sharding
//! policy, sharing one outward producer/consumer contract.
//!
//! A single `Storage<R, C>` generic over ring topology is too constraining
//! for three genuinely different sharding strategies (global, per-thread,
//! per-processor need different registration and teardown machinery), so
//! each gets its own concrete type behind this shared trait instead.

mod global;
mod per_processor;
mod per_thread;

pub use global::GlobalStorage;
pub use per_processor::PerProcessorStorage;
pub use per_thread::PerThreadStorage;

use crate::clock::Clock;
use crate::sample::SampleKind;
use crate::snapshot::SamplesSnapshot;

/// Shared contract all three sharding strategies present.
pub trait StorageAdapter<C: Clock> {
    /// Records one sample. Lossy on overflow — never reports an error.
    fn add_sample(
        &self,
        category: &'static str,
        name: &'static str,
        kind: SampleKind,
        clock_sample: C::Sample,
        thread_id: Option<u64>,
    );

    /// Discards all undrained samples and all remembered thread names.
    fn reset(&self);

    /// Drains all shards, timestamps, merges by timestamp, attaches
    /// thread names, and returns an immutable snapshot.
    fn take_all_samples(&self, clock: &C) -> SamplesSnapshot;

    /// Records the calling thread's OS name for inclusion in the next
    /// snapshot.
    fn remember_current_thread_name_for_next_snapshot(&self);
}
