use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use trace_rings::{Config, MpscRing};

fn main() {
    println!("trace-rings zero-copy throughput example");
    println!("=========================================\n");

    let config = Config::new(16, false); // 64K slots, metrics disabled for max throughput
    let ring = Arc::new(MpscRing::<[u64; 8]>::new(config));

    const N_PRODUCERS: usize = 4;
    const ITEMS_PER_PRODUCER: usize = 200_000;

    println!("Configuration:");
    println!("  Ring capacity: {} slots", config.capacity());
    println!("  Producers: {N_PRODUCERS}");
    println!("  Items per producer: {ITEMS_PER_PRODUCER}");
    println!("  Total items: {}\n", N_PRODUCERS * ITEMS_PER_PRODUCER);

    let start = Instant::now();

    let mut handles = vec![];
    for id in 0..N_PRODUCERS {
        let ring = Arc::clone(&ring);
        handles.push(thread::spawn(move || {
            for i in 0..ITEMS_PER_PRODUCER {
                let value = (id * ITEMS_PER_PRODUCER + i) as u64;
                while ring.try_push([value; 8]).is_err() {
                    thread::yield_now();
                }
            }
        }));
    }

    // The ring overwrites the oldest unread item on overflow rather than
    // blocking a producer, so a lagging consumer may never see exactly
    // `target` items: drain until every producer is done, then once more
    // to catch anything published right before they exited.
    let consumer_ring = Arc::clone(&ring);
    let done = Arc::new(AtomicBool::new(false));
    let consumer_done = Arc::clone(&done);
    let consumer = thread::spawn(move || {
        let mut total = 0usize;
        loop {
            total += consumer_ring.drain_into(|item| {
                let _ = item[0]; // touch the data
            });
            if consumer_done.load(Ordering::Acquire) {
                total += consumer_ring.drain_into(|item| {
                    let _ = item[0];
                });
                break;
            }
            thread::yield_now();
        }
        total
    });

    for handle in handles {
        handle.join().unwrap();
    }
    done.store(true, Ordering::Release);
    let total = consumer.join().unwrap();
    let duration = start.elapsed();

    let items_per_sec = total as f64 / duration.as_secs_f64();
    let bytes_per_sec = items_per_sec * 64.0; // 64 bytes per item

    println!("\nResults:");
    println!("  Items consumed: {total}");
    println!("  Duration: {duration:.2?}");
    println!(
        "  Throughput: {:.2} million items/sec",
        items_per_sec / 1_000_000.0
    );
    println!(
        "  Bandwidth: {:.2} GB/sec",
        bytes_per_sec / 1_000_000_000.0
    );
}
