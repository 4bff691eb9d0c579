//! Lock-free ring buffer primitives for in-process sample collection.
//!
//! This crate provides the five ring-queue topologies a producer/consumer
//! sample pipeline needs — single-threaded, SPSC, SPMC, MPSC, and MPMC —
//! plus the shared `Config`/`Backoff`/`Reservation`/`Metrics` support types
//! they're built from. All five share the same lossy-overflow contract: a
//! full ring never blocks a producer, it either overwrites (the
//! single-producer variants) or reports contention for the caller to
//! retry or drop (the CAS-arbitrated multi-producer variants).

mod backoff;
mod config;
mod invariants;
mod metrics;
mod mpmc;
mod mpsc;
mod reservation;
mod rq;
mod spmc;
mod spsc;

pub use backoff::Backoff;
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use metrics::{Metrics, MetricsSnapshot};
pub use mpmc::MpmcRing;
pub use mpsc::{MpscRing, TryPushError};
pub use reservation::Reservation;
pub use rq::RqRing;
pub use spmc::SpmcRing;
pub use spsc::SpscRing;

/// Common read-side contract shared by all five ring topologies.
///
/// Storage adapters in the collector crate are written generically over
/// this trait so a sharding strategy can swap ring topology without
/// touching its merge/snapshot logic.
pub trait RingQueue<T> {
    /// Total number of slots.
    fn capacity(&self) -> usize;

    /// Number of samples currently readable.
    fn len(&self) -> usize;

    /// Drains all currently readable samples into `sink`, in vindex order.
    fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize;

    /// True when no samples are currently readable.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> RingQueue<T> for RqRing<T> {
    fn capacity(&self) -> usize {
        RqRing::capacity(self)
    }
    fn len(&self) -> usize {
        RqRing::len(self)
    }
    fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        RqRing::drain_into(self, sink)
    }
}

impl<T> RingQueue<T> for SpscRing<T> {
    fn capacity(&self) -> usize {
        SpscRing::capacity(self)
    }
    fn len(&self) -> usize {
        SpscRing::len(self)
    }
    fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        SpscRing::drain_into(self, sink)
    }
}

impl<T> RingQueue<T> for SpmcRing<T> {
    fn capacity(&self) -> usize {
        SpmcRing::capacity(self)
    }
    fn len(&self) -> usize {
        SpmcRing::len(self)
    }
    fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        SpmcRing::drain_into(self, sink)
    }
}

impl<T> RingQueue<T> for MpscRing<T> {
    fn capacity(&self) -> usize {
        MpscRing::capacity(self)
    }
    fn len(&self) -> usize {
        MpscRing::len(self)
    }
    fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        MpscRing::drain_into(self, sink)
    }
}

impl<T> RingQueue<T> for MpmcRing<T> {
    fn capacity(&self) -> usize {
        MpmcRing::capacity(self)
    }
    fn len(&self) -> usize {
        MpmcRing::len(self)
    }
    fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        MpmcRing::drain_into(self, sink)
    }
}
