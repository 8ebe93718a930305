use std::sync::atomic::{AtomicU64, Ordering};

/// Static file server hit counter, shown on `/admin/metrics`.
#[derive(Debug, Default)]
pub struct Metrics {
    fileserver_hits: AtomicU64,
}

impl Metrics {
    /// Count one hit and return the new total.
    pub fn hit(&self) -> u64 {
        self.fileserver_hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn hits(&self) -> u64 {
        self.fileserver_hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.fileserver_hits.store(0, Ordering::Relaxed);
    }
}
