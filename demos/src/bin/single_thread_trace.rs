//! Nests a few spans on a single thread and dumps the resulting trace as
//! Chrome Trace Event JSON: a small, printable, end-to-end walkthrough.

use trace_collector::clock::MonotonicClock;
use trace_collector::span_guard::SpanConfig;
use trace_collector::storage::{GlobalStorage, StorageAdapter};
use trace_collector::{json, span};
use trace_rings::Config;

struct Tracing {
    storage: GlobalStorage<MonotonicClock>,
    clock: MonotonicClock,
}

impl SpanConfig for Tracing {
    type Clock = MonotonicClock;
    type Storage = GlobalStorage<MonotonicClock>;

    fn storage(&self) -> &Self::Storage {
        &self.storage
    }
    fn clock(&self) -> &Self::Clock {
        &self.clock
    }
}

fn sort_group(tracing: &Tracing, n: u32) {
    span!(tracing, "sort", "sort group");
    std::thread::sleep(std::time::Duration::from_micros(50));
    let _ = n;
}

fn main() {
    let tracing = Tracing {
        storage: GlobalStorage::new(Config::default()),
        clock: MonotonicClock::new(),
    };
    tracing.storage.remember_current_thread_name_for_next_snapshot();

    {
        span!(&tracing, "io", "read");
        std::thread::sleep(std::time::Duration::from_micros(100));
    }
    {
        span!(&tracing, "sort", "sort_grouped_lines");
        for n in 0..5 {
            sort_group(&tracing, n);
        }
    }

    let snapshot = tracing.storage.take_all_samples(&tracing.clock);
    let trace = json::to_chrome_trace_json(&snapshot);
    println!("{}", serde_json::to_string_pretty(&trace).unwrap());
}
