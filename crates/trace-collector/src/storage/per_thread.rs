//! Per-thread storage adapter: one ring per producer thread, registered
//! in an insertion-ordered `thread_list`.
//!
//! The tricky part is two cooperating lifetimes: the producer thread
//! owns its ring, the adapter borrows it for draining. This is modeled
//! without raw pointers: each thread's ring lives in an `Arc` shared
//! between a `thread_local!` registration (the producer's copy) and the
//! adapter's `thread_list` (the consumer's copy); the registration holds
//! a `Weak` back-reference to the adapter so its `Drop` impl can
//! deregister and hand off any undrained samples to `disowned_samples`
//! without ever assuming the adapter outlives the thread.

use crate::clock::Clock;
use crate::sample::{Sample, SampleKind};
use crate::snapshot::{build_snapshot, SamplesSnapshot};
use crate::storage::StorageAdapter;
use crate::thread_names::{current_thread_id, ThreadNameSet};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use trace_rings::{Config, SpscRing};

struct RingBlock<C: Clock> {
    thread_id: u64,
    ring: SpscRing<Sample<C::Sample>>,
}

struct Inner<C: Clock> {
    config: Config,
    thread_list: Mutex<Vec<Arc<RingBlock<C>>>>,
    disowned_samples: Mutex<Vec<Sample<C::Sample>>>,
    pending_names: Mutex<ThreadNameSet>,
}

/// One ring per producer thread.
pub struct PerThreadStorage<C: Clock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for PerThreadStorage<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock + 'static> PerThreadStorage<C> {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                thread_list: Mutex::new(Vec::new()),
                disowned_samples: Mutex::new(Vec::new()),
                pending_names: Mutex::new(ThreadNameSet::new()),
            }),
        }
    }

    /// Looks up (or lazily creates and registers) this thread's ring,
    /// then hands it to `f`. The lazy-creation path takes the
    /// `thread_list` mutex once; every subsequent call on the same
    /// thread is lock-free.
    fn with_local_block<R>(&self, f: impl FnOnce(&Arc<RingBlock<C>>) -> R) -> R {
        thread_local! {
            static LOCAL: RefCell<HashMap<usize, LocalRegistration<C>>> =
                RefCell::new(HashMap::new());
        }

        let key = Arc::as_ptr(&self.inner) as usize;

        LOCAL.with(|local| {
            let mut map = local.borrow_mut();
            let registration = map.entry(key).or_insert_with(|| {
                let block = Arc::new(RingBlock {
                    thread_id: current_thread_id(),
                    ring: SpscRing::new(self.inner.config),
                });
                self.inner
                    .thread_list
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(Arc::clone(&block));
                LocalRegistration {
                    block,
                    owner: Arc::downgrade(&self.inner),
                }
            });
            f(&registration.block)
        })
    }
}

/// The producer thread's handle on its own block. Its `Drop` impl
/// deregisters the block and drains its ring into `disowned_samples` so
/// a detached thread's samples still survive to the next snapshot.
struct LocalRegistration<C: Clock> {
    block: Arc<RingBlock<C>>,
    owner: Weak<Inner<C>>,
}

impl<C: Clock> Drop for LocalRegistration<C> {
    fn drop(&mut self) {
        let Some(inner) = self.owner.upgrade() else {
            // Adapter already gone; nothing left to hand samples to.
            return;
        };

        {
            let mut list = inner.thread_list.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(pos) = list.iter().position(|b| Arc::ptr_eq(b, &self.block)) {
                list.remove(pos);
            }
        }

        let mut disowned = inner
            .disowned_samples
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        self.block.ring.drain_into(|s| disowned.push(s));
    }
}

impl<C: Clock + 'static> StorageAdapter<C> for PerThreadStorage<C> {
    fn add_sample(
        &self,
        category: &'static str,
        name: &'static str,
        kind: SampleKind,
        clock_sample: C::Sample,
        thread_id: Option<u64>,
    ) {
        self.with_local_block(|block| {
            let sample = Sample {
                category,
                name,
                kind,
                thread_id: thread_id.unwrap_or(block.thread_id),
                clock_sample,
            };
            // SpscRing's push never fails: a full ring overwrites the
            // oldest unread sample rather than rejecting the new one.
            block.ring.push(sample);
        });
    }

    fn reset(&self) {
        let list = self
            .inner
            .thread_list
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for block in list.iter() {
            block.ring.reset();
        }
        drop(list);

        self.inner
            .disowned_samples
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.inner
            .pending_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reset();
    }

    fn take_all_samples(&self, clock: &C) -> SamplesSnapshot {
        let list = self
            .inner
            .thread_list
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let mut drained = Vec::new();
        for block in list.iter() {
            block.ring.drain_into(|s| drained.push(s));
        }
        drop(list);

        drained.append(
            &mut self
                .inner
                .disowned_samples
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );

        let names = std::mem::take(
            &mut *self
                .inner
                .pending_names
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
        build_snapshot(drained, clock, names)
    }

    fn remember_current_thread_name_for_next_snapshot(&self) {
        self.inner
            .pending_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fetch_and_remember_name_of_current_thread();
    }
}
