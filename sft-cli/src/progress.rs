//! Terminal progress bar driven by transfer progress callbacks.

use sft_client::{Direction, Progress, ProgressObserver};
use std::io::Write;
use std::sync::Mutex;

const BAR_WIDTH: usize = 30;

/// Render one progress line (without carriage return).
pub fn render(direction: Direction, progress: Progress, width: usize) -> String {
    match progress.ratio() {
        Some(ratio) => {
            let filled = ((ratio * width as f64).round() as usize).min(width);
            format!(
                "{:<8} [{}{}] {:>3}%  {}",
                direction.label(),
                "#".repeat(filled),
                " ".repeat(width - filled),
                progress.percent().unwrap_or(100),
                format_bytes(progress.done),
            )
        }
        None => format!("{:<8} {}", direction.label(), format_bytes(progress.done)),
    }
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Redraws a single stderr line on every callback.
///
/// Identical consecutive lines are skipped so small download chunks do not
/// flood the terminal.
#[derive(Default)]
pub struct ProgressBar {
    last: Mutex<Option<String>>,
}

impl ProgressBar {
    /// Create a bar with nothing drawn yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// End the line if anything was drawn.
    pub fn finish(&self) {
        let drawn = self
            .last
            .lock()
            .map(|mut last| last.take().is_some())
            .unwrap_or(false);
        if drawn {
            eprintln!();
        }
    }
}

impl ProgressObserver for ProgressBar {
    fn on_progress(&self, direction: Direction, progress: Progress) {
        let line = render(direction, progress, BAR_WIDTH);
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if last.as_deref() == Some(line.as_str()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", line);
        let _ = stderr.flush();
        *last = Some(line);
    }
}
