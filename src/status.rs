use std::io::{self, Write};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::window::SpeedWindow;

/// Expected size marker for responses without a declared length.
pub const UNKNOWN_SIZE: i64 = -1;

/// Counters shared between the copy loop and the renderer.
///
/// Scalars are atomics; the delta window sits behind a mutex that is only
/// held for constant-time updates, so readers may see a slightly stale
/// value but never a torn one.
#[derive(Debug)]
pub struct TransferStatus {
    expected_size: AtomicI64,
    total_received: AtomicU64,
    elapsed_ticks: AtomicU64,
    window: Mutex<SpeedWindow>,
}

/// Point-in-time copy of a [`TransferStatus`] used for one table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub elapsed_ticks: u64,
    pub total_received: u64,
    pub expected_size: Option<u64>,
    pub window_sum: u64,
}

impl TransferStatus {
    /// `expected_size` is the declared content length, or `None` when absent.
    pub fn new(expected_size: Option<u64>) -> Self {
        let expected = expected_size
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(UNKNOWN_SIZE);
        Self {
            expected_size: AtomicI64::new(expected),
            total_received: AtomicU64::new(0),
            elapsed_ticks: AtomicU64::new(0),
            window: Mutex::new(SpeedWindow::new()),
        }
    }

    fn window(&self) -> MutexGuard<'_, SpeedWindow> {
        // counters stay meaningful even if a holder panicked
        self.window.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, n: u64) {
        self.total_received.fetch_add(n, Ordering::Relaxed);
        self.window().add(n);
    }

    pub fn total_received(&self) -> u64 {
        self.total_received.load(Ordering::Relaxed)
    }

    pub fn expected_size(&self) -> Option<u64> {
        u64::try_from(self.expected_size.load(Ordering::Relaxed)).ok()
    }

    /// Replaces the expected size, e.g. with the number of bytes actually copied.
    pub fn set_expected(&self, n: u64) {
        let n = i64::try_from(n).unwrap_or(i64::MAX);
        self.expected_size.store(n, Ordering::Relaxed);
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks.load(Ordering::Relaxed)
    }

    /// True while the size is unknown or not yet reached.
    pub fn in_progress(&self) -> bool {
        match self.expected_size() {
            None => true,
            Some(expected) => expected > self.total_received(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            elapsed_ticks: self.elapsed_ticks(),
            total_received: self.total_received(),
            expected_size: self.expected_size(),
            window_sum: self.window().sum(),
        }
    }

    /// Ends a tick: bumps the elapsed counter and shifts the delta window.
    pub fn advance(&self) {
        self.elapsed_ticks.fetch_add(1, Ordering::Relaxed);
        self.window().shift();
    }
}

/// Write-side observer that mirrors every chunk into a [`TransferStatus`].
#[derive(Debug, Clone)]
pub struct ByteCounter {
    status: Arc<TransferStatus>,
}

impl ByteCounter {
    pub fn new(status: Arc<TransferStatus>) -> Self {
        Self { status }
    }

    pub fn record(&self, buf: &[u8]) {
        self.status.record(buf.len() as u64);
    }
}

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.record(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
