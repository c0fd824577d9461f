//! Stream counters — shared between the streamer and the stats printer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    sessions_opened: AtomicU64,
    open_failures: AtomicU64,
    frames_sent: AtomicU64,
    frames_missed: AtomicU64,
    frames_aborted: AtomicU64,
    chunks_sent: AtomicU64,
    chunks_failed: AtomicU64,
    bytes_sent: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    inner: Arc<Counters>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sessions_opened: u64,
    pub open_failures: u64,
    pub frames_sent: u64,
    pub frames_missed: u64,
    pub frames_aborted: u64,
    pub chunks_sent: u64,
    pub chunks_failed: u64,
    pub bytes_sent: u64,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_opened(&self) {
        self.inner.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn open_failed(&self) {
        self.inner.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_missed(&self) {
        self.inner.frames_missed.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold in the outcome of one frame.
    pub fn record_frame(&self, chunks_sent: u64, chunks_failed: u64, bytes_sent: u64, aborted: bool) {
        let c = &self.inner;
        c.frames_sent.fetch_add(1, Ordering::Relaxed);
        if aborted {
            c.frames_aborted.fetch_add(1, Ordering::Relaxed);
        }
        c.chunks_sent.fetch_add(chunks_sent, Ordering::Relaxed);
        c.chunks_failed.fetch_add(chunks_failed, Ordering::Relaxed);
        c.bytes_sent.fetch_add(bytes_sent, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let c = &self.inner;
        StatsSnapshot {
            sessions_opened: c.sessions_opened.load(Ordering::Relaxed),
            open_failures: c.open_failures.load(Ordering::Relaxed),
            frames_sent: c.frames_sent.load(Ordering::Relaxed),
            frames_missed: c.frames_missed.load(Ordering::Relaxed),
            frames_aborted: c.frames_aborted.load(Ordering::Relaxed),
            chunks_sent: c.chunks_sent.load(Ordering::Relaxed),
            chunks_failed: c.chunks_failed.load(Ordering::Relaxed),
            bytes_sent: c.bytes_sent.load(Ordering::Relaxed),
        }
    }

    pub fn print_stats(&self) {
        let s = self.snapshot();
        tracing::info!(
            sessions = s.sessions_opened,
            open_failures = s.open_failures,
            frames_sent = s.frames_sent,
            frames_missed = s.frames_missed,
            frames_aborted = s.frames_aborted,
            chunks_sent = s.chunks_sent,
            chunks_failed = s.chunks_failed,
            bytes_sent = s.bytes_sent,
            "stream stats"
        );
    }
}
