use std::sync::atomic::{AtomicU64, Ordering};

/// Byte counters shared between the connection task and its callers
#[derive(Debug, Default)]
pub struct TransportStats {
    total_bytes_in: AtomicU64,
    total_bytes_out: AtomicU64,
    queue_bytes_out: AtomicU64,
}

impl TransportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_bytes_in(&self) -> u64 {
        self.total_bytes_in.load(Ordering::Relaxed)
    }

    pub fn total_bytes_out(&self) -> u64 {
        self.total_bytes_out.load(Ordering::Relaxed)
    }

    /// Bytes handed to the transport but not yet written
    pub fn queue_bytes_out(&self) -> u64 {
        self.queue_bytes_out.load(Ordering::Relaxed)
    }

    /// Returns the new total
    pub(crate) fn add_bytes_in(&self, n: usize) -> u64 {
        self.total_bytes_in.fetch_add(n as u64, Ordering::Relaxed) + n as u64
    }

    pub(crate) fn queued(&self, n: usize) {
        self.queue_bytes_out.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn written(&self, n: usize, ok: bool) {
        self.queue_bytes_out.fetch_sub(n as u64, Ordering::Relaxed);
        if ok {
            self.total_bytes_out.fetch_add(n as u64, Ordering::Relaxed);
        }
    }
}
