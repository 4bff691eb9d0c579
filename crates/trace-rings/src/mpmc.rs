use crate::{Config, MetricsSnapshot, MpscRing, TryPushError};
use std::sync::Mutex;

/// Multi-producer multi-consumer ring buffer.
///
/// Wraps an [`MpscRing`] and serializes the consumer side with a
/// `Mutex<()>`, the same way [`crate::SpmcRing`] wraps [`crate::SpscRing`].
/// The producer-side CAS claim path is untouched.
pub struct MpmcRing<T> {
    inner: MpscRing<T>,
    consumer_lock: Mutex<()>,
}

impl<T> MpmcRing<T> {
    pub fn new(config: Config) -> Self {
        Self {
            inner: MpscRing::new(config),
            consumer_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn reset(&self) {
        self.inner.reset();
    }

    #[inline]
    pub fn try_push(&self, item: T) -> Result<(), TryPushError> {
        self.inner.try_push(item)
    }

    /// Drains all currently published samples, serialized against other
    /// concurrent consumers via an internal mutex.
    pub fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        let _guard = self.consumer_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.drain_into(sink)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics()
    }
}
