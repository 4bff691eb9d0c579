//! Scoped span guard: emits a matched Enter/Exit sample pair bracketing
//! a scope.
//!
//! "Emit Exit on every exit path, once and only once, on the same
//! thread" is naturally a `Drop` guard in Rust. Since stable Rust has no
//! way to forbid a local binding from being moved out of its scope, the
//! non-movable half of that contract is realized instead by making the
//! guard `!Send` (it cannot be handed to another thread, which is the
//! concrete hazard a "strictly on one thread" invariant guards against)
//! via a `PhantomData<*const ()>` marker, and by never implementing
//! `Clone` or `Copy`.

use crate::clock::Clock;
use crate::sample::SampleKind;
use crate::storage::StorageAdapter;
use std::marker::PhantomData;

/// Bundles a storage adapter and a clock so a call site can write
/// `span_guard::enter(&config, "cat", "name")` without repeating both.
pub trait SpanConfig {
    type Clock: Clock;
    type Storage: StorageAdapter<Self::Clock>;

    fn storage(&self) -> &Self::Storage;
    fn clock(&self) -> &Self::Clock;
}

/// Emits an Enter sample on construction, an Exit sample (same category
/// and name) on drop — including unwind, so the pair is complete even
/// when the scope is left by an error.
#[must_use = "a span guard emits its Exit sample when dropped; binding it to `_` drops it immediately"]
pub struct SpanGuard<'a, Cfg: SpanConfig> {
    config: &'a Cfg,
    category: &'static str,
    name: &'static str,
    // Not `Send`: the guard must stay on the thread that created it, so
    // its Exit carries the same thread id as its Enter.
    _not_send: PhantomData<*const ()>,
}

impl<'a, Cfg: SpanConfig> SpanGuard<'a, Cfg> {
    fn new(config: &'a Cfg, category: &'static str, name: &'static str) -> Self {
        let clock_sample = config.clock().query();
        config
            .storage()
            .add_sample(category, name, SampleKind::Enter, clock_sample, None);
        Self {
            config,
            category,
            name,
            _not_send: PhantomData,
        }
    }
}

impl<'a, Cfg: SpanConfig> Drop for SpanGuard<'a, Cfg> {
    fn drop(&mut self) {
        let clock_sample = self.config.clock().query();
        self.config.storage().add_sample(
            self.category,
            self.name,
            SampleKind::Exit,
            clock_sample,
            None,
        );
    }
}

/// Pushes an Enter sample and returns a guard that pushes the matching
/// Exit sample when it goes out of scope.
pub fn enter<'a, Cfg: SpanConfig>(
    config: &'a Cfg,
    category: &'static str,
    name: &'static str,
) -> SpanGuard<'a, Cfg> {
    SpanGuard::new(config, category, name)
}

/// Binds a guard named `_span` so the Exit fires at the end of the
/// enclosing scope, without requiring the caller to name the guard type.
#[macro_export]
macro_rules! span {
    ($config:expr, $category:expr, $name:expr) => {
        let _span = $crate::span_guard::enter($config, $category, $name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use crate::storage::GlobalStorage;
    use trace_rings::Config;

    struct TestConfig {
        storage: GlobalStorage<MonotonicClock>,
        clock: MonotonicClock,
    }

    impl SpanConfig for TestConfig {
        type Clock = MonotonicClock;
        type Storage = GlobalStorage<MonotonicClock>;

        fn storage(&self) -> &Self::Storage {
            &self.storage
        }
        fn clock(&self) -> &Self::Clock {
            &self.clock
        }
    }

    #[test]
    fn nested_spans_emit_matched_enter_exit_pairs() {
        let config = TestConfig {
            storage: GlobalStorage::new(Config::default()),
            clock: MonotonicClock::new(),
        };

        {
            span!(&config, "ex", "main");
            {
                span!(&config, "ex", "inner");
            }
        }

        let snapshot = config.storage.take_all_samples(&config.clock);
        assert_eq!(snapshot.size(), 4);

        let kinds: Vec<_> = snapshot.samples().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SampleKind::Enter,
                SampleKind::Enter,
                SampleKind::Exit,
                SampleKind::Exit,
            ]
        );
        assert_eq!(snapshot.at(0).name, "main");
        assert_eq!(snapshot.at(1).name, "inner");
        assert_eq!(snapshot.at(2).name, "inner");
        assert_eq!(snapshot.at(3).name, "main");
    }

    #[test]
    fn exit_sample_is_emitted_on_unwind() {
        let config = TestConfig {
            storage: GlobalStorage::new(Config::default()),
            clock: MonotonicClock::new(),
        };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            span!(&config, "ex", "risky");
            panic!("boom");
        }));
        assert!(result.is_err());

        let snapshot = config.storage.take_all_samples(&config.clock);
        assert_eq!(snapshot.size(), 2);
        assert_eq!(snapshot.at(0).kind, SampleKind::Enter);
        assert_eq!(snapshot.at(1).kind, SampleKind::Exit);
    }
}
