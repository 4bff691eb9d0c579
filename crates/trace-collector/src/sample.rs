/// The kind of event a sample records — the two halves of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Enter,
    Exit,
}

impl SampleKind {
    /// The Chrome Trace Event `ph` field for this kind.
    pub(crate) fn phase_char(self) -> char {
        match self {
            SampleKind::Enter => 'B',
            SampleKind::Exit => 'E',
        }
    }
}

/// A non-negative nanosecond count from an unspecified but clock-stable
/// epoch. Equal time points are only expected from clocks documented as
/// non-strictly-monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(pub u64);

impl TimePoint {
    #[inline]
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_micros_fractional(self) -> (u64, u32) {
        (self.0 / 1_000, (self.0 % 1_000) as u32)
    }
}

/// Producer-side sample record: trivially copyable, carries an opaque
/// clock sample rather than an absolute timestamp.
///
/// `category` and `name` are borrowed — in practice `'static` string
/// literals at the instrumentation call site — and must outlive every
/// snapshot that contains them.
#[derive(Debug, Clone, Copy)]
pub struct Sample<C: Copy> {
    pub category: &'static str,
    pub name: &'static str,
    pub kind: SampleKind,
    pub thread_id: u64,
    pub clock_sample: C,
}

/// Snapshot-side sample record: identical to [`Sample`] but with the
/// producer-side clock sample resolved to an absolute [`TimePoint`],
/// constructed exactly once per export via the clock's `make_time_point`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSample {
    pub category: &'static str,
    pub name: &'static str,
    pub kind: SampleKind,
    pub thread_id: u64,
    pub timestamp: TimePoint,
}
