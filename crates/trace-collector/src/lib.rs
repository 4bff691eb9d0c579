//! Sample-collection substrate for in-process span tracing: storage
//! adapters that accept timestamped Enter/Exit samples from arbitrarily
//! many producer threads and a snapshot builder that drains them into a
//! single, timestamp-ordered, exportable snapshot.
//!
//! Built on [`trace_rings`]'s lock-free ring primitives. A typical call
//! site looks like:
//!
//! ```
//! use trace_collector::clock::MonotonicClock;
//! use trace_collector::span_guard::SpanConfig;
//! use trace_collector::storage::{GlobalStorage, StorageAdapter};
//! use trace_collector::{json, span};
//! use trace_rings::Config;
//!
//! struct AppTracing {
//!     storage: GlobalStorage<MonotonicClock>,
//!     clock: MonotonicClock,
//! }
//!
//! impl SpanConfig for AppTracing {
//!     type Clock = MonotonicClock;
//!     type Storage = GlobalStorage<MonotonicClock>;
//!     fn storage(&self) -> &Self::Storage { &self.storage }
//!     fn clock(&self) -> &Self::Clock { &self.clock }
//! }
//!
//! let app = AppTracing { storage: GlobalStorage::new(Config::default()), clock: MonotonicClock::new() };
//! {
//!     span!(&app, "request", "handle");
//! }
//! let snapshot = app.storage.take_all_samples(&app.clock);
//! let trace = json::to_chrome_trace_json(&snapshot);
//! assert!(trace["traceEvents"].is_array());
//! ```

pub mod clock;
pub mod json;
pub mod processor_id;
pub mod sample;
pub mod snapshot;
pub mod span_guard;
pub mod storage;
pub mod thread_names;

pub use clock::{Clock, ClockTraits, MonotonicClock, SystemClock};
pub use sample::{Sample, SampleKind, SnapshotSample, TimePoint};
pub use snapshot::SamplesSnapshot;
pub use span_guard::{enter, SpanConfig, SpanGuard};
pub use storage::{GlobalStorage, PerProcessorStorage, PerThreadStorage, StorageAdapter};
pub use thread_names::ThreadNameSet;
