//! Byte-level progress tracking for transfers.

use log::info;
use std::time::{Duration, Instant};

pub struct ProgressTracker {
    current: u64,
    total: u64,
    start_time: Instant,
    last_update: Instant,
    name: String,
    completed: bool,
}

impl ProgressTracker {
    pub fn new(name: String) -> Self {
        let now = Instant::now();
        Self {
            current: 0,
            total: 0,
            start_time: now,
            last_update: now,
            name,
            completed: false,
        }
    }

    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub fn update(&mut self, current: u64) {
        self.current = current;

        // Only log every 500ms to avoid spam
        if self.last_update.elapsed() >= Duration::from_millis(500) {
            self.display();
            self.last_update = Instant::now();
        }
    }

    pub fn complete(&mut self) {
        if !self.completed {
            self.completed = true;
            if self.total > 0 {
                self.current = self.total;
            }
            info!(
                "{}: complete - {} in {:.1}s",
                self.name,
                format_bytes(self.current),
                self.start_time.elapsed().as_secs_f64()
            );
        }
    }

    fn display(&self) {
        if self.total == 0 {
            info!("{}: {}", self.name, format_bytes(self.current));
        } else {
            let percentage = (self.current as f64 / self.total as f64 * 100.0).round() as u8;
            info!(
                "{}: {}% ({}/{})",
                self.name,
                percentage,
                format_bytes(self.current),
                format_bytes(self.total)
            );
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if !self.completed {
            self.complete();
        }
    }
}

/// Formats a byte count with a binary unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}
