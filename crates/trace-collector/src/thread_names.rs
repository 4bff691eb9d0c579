//! Thread-name set: a mapping from thread id to its OS-reported name,
//! accumulated across snapshots until `reset`.

use std::collections::HashMap;

/// Mapping `thread_id → name`, keys inserted lazily. Insertion is
/// idempotent: the last write for a given thread id wins.
#[derive(Debug, Default, Clone)]
pub struct ThreadNameSet {
    names: HashMap<u64, String>,
}

impl ThreadNameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries the OS for the calling thread's current name and records
    /// it. A `None` or empty OS name is not recorded — the serializer
    /// treats an absent entry the same as an empty one.
    pub fn fetch_and_remember_name_of_current_thread(&mut self) {
        let tid = current_thread_id();
        if let Some(name) = std::thread::current().name() {
            if !name.is_empty() {
                self.names.insert(tid, name.to_string());
            }
        }
    }

    /// Queries by arbitrary thread id. No safe stable-Rust facade exists
    /// cross-platform for looking up another thread's name by raw id; on
    /// Linux this reads `/proc/<pid>/task/<tid>/comm`, elsewhere it is a
    /// no-op.
    pub fn fetch_and_remember_thread_name_for_id(&mut self, tid: u64) {
        if let Some(name) = platform_thread_name_for_id(tid) {
            if !name.is_empty() {
                self.names.insert(tid, name);
            }
        }
    }

    /// Records an already-known name (used by storage adapters when a
    /// producer calls `remember_current_thread_name_for_next_snapshot`).
    pub(crate) fn insert(&mut self, tid: u64, name: String) {
        if !name.is_empty() {
            self.names.insert(tid, name);
        }
    }

    pub fn name_for(&self, tid: u64) -> Option<&str> {
        self.names.get(&tid).map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.names.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.names.iter().map(|(&tid, name)| (tid, name.as_str()))
    }
}

/// The numeric thread id samples are tagged with. On Linux this is the
/// kernel `tid` (queried via `SYS_gettid`), matching what
/// `platform_thread_name_for_id` reads `/proc/<pid>/task/<tid>/comm`
/// with. Elsewhere, `Thread::id()` has no portable integer form, so the
/// debug representation is hashed into a stable (if opaque) u64 — name
/// resolution by id is then unavailable on those platforms.
#[cfg(target_os = "linux")]
pub(crate) fn current_thread_id() -> u64 {
    // SAFETY: SYS_gettid takes no arguments and always succeeds.
    unsafe { libc::syscall(libc::SYS_gettid) as u64 }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn current_thread_id() -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish()
}

#[cfg(target_os = "linux")]
fn platform_thread_name_for_id(tid: u64) -> Option<String> {
    let pid = std::process::id();
    let path = format!("/proc/{pid}/task/{tid}/comm");
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim_end().to_string())
}

#[cfg(not(target_os = "linux"))]
fn platform_thread_name_for_id(_tid: u64) -> Option<String> {
    None
}
