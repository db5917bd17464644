/// Number of ticks the speed average spans, independent of the tick interval.
pub const WINDOW_TICKS: usize = 5;

/// Per-tick byte deltas for the last five ticks, oldest first.
///
/// The newest slot keeps accumulating until the renderer calls [`SpeedWindow::shift`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpeedWindow {
    slots: [u64; WINDOW_TICKS],
}

impl SpeedWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` bytes to the current (newest) slot.
    pub fn add(&mut self, n: u64) {
        let newest = &mut self.slots[WINDOW_TICKS - 1];
        *newest = newest.saturating_add(n);
    }

    /// Drops the oldest slot and opens a fresh, empty newest slot.
    pub fn shift(&mut self) {
        self.slots.rotate_left(1);
        self.slots[WINDOW_TICKS - 1] = 0;
    }

    pub fn sum(&self) -> u64 {
        self.slots.iter().sum()
    }

    #[cfg(test)]
    fn slots(&self) -> &[u64; WINDOW_TICKS] {
        &self.slots
    }
}

/// Converts a five-tick byte sum into KB/s for the given tick length.
pub fn speed_kbps(window_sum: u64, interval_secs: f64) -> f64 {
    if interval_secs <= 0.0 {
        return 0.0;
    }
    window_sum as f64 / WINDOW_TICKS as f64 / 1024.0 / interval_secs
}
