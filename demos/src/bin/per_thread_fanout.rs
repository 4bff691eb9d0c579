//! Fans four named producer threads out across a [`PerThreadStorage`],
//! each emitting a handful of spans, then prints the merged, timestamp-
//! ordered snapshot: a small, printable, end-to-end walkthrough of the
//! per-thread sharding strategy instead of a single shared ring.

use trace_collector::clock::MonotonicClock;
use trace_collector::sample::SampleKind;
use trace_collector::storage::{PerThreadStorage, StorageAdapter};
use trace_rings::Config;

fn main() {
    let storage = PerThreadStorage::<MonotonicClock>::new(Config::new(10, false));
    let clock = MonotonicClock::new();

    let handles: Vec<_> = ["alpha", "beta", "gamma", "delta"]
        .into_iter()
        .map(|name| {
            let storage = storage.clone();
            std::thread::Builder::new()
                .name(name.to_string())
                .spawn(move || {
                    let clock = MonotonicClock::new();
                    storage.remember_current_thread_name_for_next_snapshot();
                    for i in 0..20 {
                        storage.add_sample(
                            "worker",
                            "task",
                            SampleKind::Enter,
                            clock.query(),
                            None,
                        );
                        std::thread::sleep(std::time::Duration::from_micros(10));
                        storage.add_sample(
                            "worker",
                            "task",
                            SampleKind::Exit,
                            clock.query(),
                            None,
                        );
                        let _ = i;
                    }
                })
                .unwrap()
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let snapshot = storage.take_all_samples(&clock);
    println!("collected {} samples across {} named threads", snapshot.size(), snapshot.thread_ids().len());
    for tid in snapshot.thread_ids() {
        let name = snapshot.thread_name(tid).unwrap_or("<unnamed>");
        let count = snapshot.samples().iter().filter(|s| s.thread_id == tid).count();
        println!("  thread {tid} ({name}): {count} samples");
    }
}
