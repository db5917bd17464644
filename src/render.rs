use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::status::{Snapshot, TransferStatus};
use crate::window::speed_kbps;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const UNKNOWN_FILE_SIZE: &str = "--------";
const UNKNOWN_PERCENT: &str = "-------";

pub const TABLE_HEADER: &str = "  Time | Received | FileSize |    %    |    Speed    ";
pub const TABLE_RULE: &str = "=======|==========|==========|=========|=============";

/// Formats a byte count with binary units, two decimals and no space: `1.50KB`.
///
/// Divides by 1024 at most four times, so huge values stay in `TB`.
pub fn format_size(size: u64) -> String {
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", value, SIZE_UNITS[unit])
}

fn format_percent(received: u64, expected: u64) -> String {
    let percent = if expected == 0 {
        100.0
    } else {
        received as f64 / expected as f64 * 100.0
    };
    format!("{:.2}%", percent)
}

/// Whole seconds covered by `ticks` intervals.
pub fn elapsed_secs(ticks: u64, interval: Duration) -> u64 {
    let millis = interval.as_millis().saturating_mul(u128::from(ticks)) / 1000;
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// One table row for `snap`, without the trailing newline.
pub fn format_row(snap: &Snapshot, interval: Duration) -> String {
    let (file_size, percent) = match snap.expected_size {
        Some(expected) => (
            format_size(expected),
            format_percent(snap.total_received, expected),
        ),
        None => (UNKNOWN_FILE_SIZE.to_string(), UNKNOWN_PERCENT.to_string()),
    };
    format!(
        " {:4}s | {:>8} | {:>8} | {:>7} | {:7.2}KB/s",
        elapsed_secs(snap.elapsed_ticks, interval),
        format_size(snap.total_received),
        file_size,
        percent,
        speed_kbps(snap.window_sum, interval.as_secs_f64()),
    )
}

/// Periodically prints the progress table for one transfer.
pub struct ProgressRenderer<W> {
    status: Arc<TransferStatus>,
    file_name: String,
    interval: Duration,
    out: W,
}

impl<W: Write> ProgressRenderer<W> {
    pub fn new(status: Arc<TransferStatus>, file_name: impl Into<String>, interval: Duration, out: W) -> Self {
        Self {
            status,
            file_name: file_name.into(),
            interval,
            out,
        }
    }

    pub fn print_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "[Info] File name: {}", self.file_name)?;
        writeln!(self.out, "{}", TABLE_HEADER)?;
        writeln!(self.out, "{}", TABLE_RULE)?;
        self.out.flush()
    }

    /// Prints a row for the current counters without advancing the clock.
    pub fn render_row(&mut self) -> io::Result<()> {
        let row = format_row(&self.status.snapshot(), self.interval);
        writeln!(self.out, "{}", row)?;
        self.out.flush()
    }

    /// One periodic step. Returns `false` once the transfer has reached its
    /// expected size, in which case nothing is printed.
    pub fn tick(&mut self) -> io::Result<bool> {
        if !self.status.in_progress() {
            return Ok(false);
        }
        self.render_row()?;
        self.status.advance();
        Ok(true)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> ProgressRenderer<W> {
    /// Header, then one row per interval until the size is reached or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> io::Result<Self> {
        self.print_header()?;
        while self.tick()? {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        Ok(self)
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<io::Result<Self>> {
        tokio::spawn(self.run(cancel))
    }
}
