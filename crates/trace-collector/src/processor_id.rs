//! Processor-id lookup.
//!
//! Per-processor storage shards rings by the id of the CPU currently
//! running the calling thread. Ideally the cache would reuse a
//! previously observed id until a kernel-published "scheduler
//! generation" counter advances, proving the thread migrated in between
//! — but stable Rust on Linux has no safe, dependency-free way to read
//! that counter without a syscall-level `rseq` registration. Rather than
//! pay a direct `sched_getcpu()` on every call, this cache amortizes
//! with a coarse `Instant`-based revalidation window instead: reuse the
//! last observed id until the window elapses, then requery. This trades
//! a small amount of staleness (a migration inside the window is
//! invisible until the next requery) for avoiding the syscall on every
//! hot-path call; see DESIGN.md for the full rationale.

use std::cell::Cell;
use std::sync::Once;
use std::time::{Duration, Instant};

/// How long a cached processor id is trusted before the next call pays
/// for a fresh `sched_getcpu()`. Chosen short enough that a migrated
/// thread's samples land in a stale shard for at most a handful of calls.
const REVALIDATION_WINDOW: Duration = Duration::from_micros(50);

/// Per-thread cache slot: the last observed processor id and when it was
/// observed. Not `Sync` — callers are expected to hold one per thread,
/// typically behind a `thread_local!`.
#[derive(Debug, Default)]
pub struct ProcessorIdCache {
    last_seen: Cell<Option<(u32, Instant)>>,
}

impl ProcessorIdCache {
    pub fn new() -> Self {
        Self::default()
    }
}

static LOG_PROCESSOR_ID_FAILURE_ONCE: Once = Once::new();

/// Returns a small dense id of the CPU currently executing the calling
/// thread, refreshing `cache` only once the revalidation window has
/// elapsed since the last query on this thread.
pub fn get_current_processor_id(cache: &ProcessorIdCache) -> u32 {
    if let Some((id, observed_at)) = cache.last_seen.get() {
        if observed_at.elapsed() < REVALIDATION_WINDOW {
            return id;
        }
    }

    let id = query_current_processor_id();
    cache.last_seen.set(Some((id, Instant::now())));
    id
}

#[cfg(target_os = "linux")]
fn query_current_processor_id() -> u32 {
    // SAFETY: sched_getcpu takes no arguments and has no preconditions; a
    // negative return (e.g. ENOSYS) is handled below.
    let cpu = unsafe { libc::sched_getcpu() };
    if cpu < 0 {
        LOG_PROCESSOR_ID_FAILURE_ONCE.call_once(|| {
            eprintln!("trace-collector: sched_getcpu() failed, reporting processor id 0");
        });
        0
    } else {
        cpu as u32
    }
}

#[cfg(not(target_os = "linux"))]
fn query_current_processor_id() -> u32 {
    LOG_PROCESSOR_ID_FAILURE_ONCE.call_once(|| {
        eprintln!("trace-collector: processor-id lookup unsupported on this platform, reporting 0");
    });
    0
}

/// Upper bound on processor ids valid for the process lifetime. Used by
/// the per-processor storage adapter to size its ring array at
/// construction (CPU hot-plug beyond this bound is out of scope).
#[cfg(target_os = "linux")]
pub fn get_maximum_processor_id() -> u32 {
    // SAFETY: no preconditions; a non-positive result is treated as
    // "unknown", falling back to a single-shard configuration.
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n > 0 {
        (n - 1) as u32
    } else {
        0
    }
}

#[cfg(not(target_os = "linux"))]
pub fn get_maximum_processor_id() -> u32 {
    0
}
