use crate::{Config, MetricsSnapshot, Reservation, SpscRing};
use std::sync::Mutex;

/// Single-producer multi-consumer ring buffer.
///
/// Wraps an [`SpscRing`] and serializes the consumer side with a
/// `Mutex<()>` so multiple threads may call [`Self::drain_into`]
/// concurrently without corrupting the head cursor; the single producer's
/// path is untouched by the lock.
pub struct SpmcRing<T> {
    inner: SpscRing<T>,
    consumer_lock: Mutex<()>,
}

impl<T> SpmcRing<T> {
    pub fn new(config: Config) -> Self {
        Self {
            inner: SpscRing::new(config),
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
    pub fn reserve(&self, n: usize) -> Option<Reservation<'_, T>> {
        self.inner.reserve(n)
    }

    #[inline]
    pub fn reserve_with_backoff(&self, n: usize) -> Option<Reservation<'_, T>> {
        self.inner.reserve_with_backoff(n)
    }

    #[inline]
    pub fn push(&self, item: T) -> bool {
        self.inner.push(item)
    }

    pub fn close(&self) {
        self.inner.close();
    }

    /// Drains all currently readable samples, serialized against other
    /// concurrent consumers via an internal mutex.
    pub fn drain_into<F: FnMut(T)>(&self, sink: F) -> usize {
        let _guard = self.consumer_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.drain_into(sink)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn single_producer_many_consumers_no_duplicate_drain() {
        let ring = Arc::new(SpmcRing::<u64>::new(Config::new(8, false)));

        for i in 0..200u64 {
            assert!(ring.push(i));
        }

        let totals: Vec<usize> = (0..4)
            .map(|_| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    let mut count = 0usize;
                    ring.drain_into(|_item| count += 1);
                    count
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert_eq!(totals.iter().sum::<usize>(), 200);
        assert!(ring.is_empty());
    }
}
