//! Invocation timing
//!
//! Every invocation records how long each stage of the pipeline took; the
//! skill logs the splits at debug level once the response is ready.

use std::time::{Duration, Instant};

/// A simple stopwatch for measuring elapsed time per pipeline stage
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    last: Duration,
    splits: Vec<(&'static str, Duration)>,
}

impl Stopwatch {
    /// Start a new stopwatch
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            last: Duration::ZERO,
            splits: Vec::new(),
        }
    }

    /// Record the time spent since the previous split under `label`
    pub fn split(&mut self, label: &'static str) {
        let now = self.start.elapsed();
        self.splits.push((label, now.saturating_sub(self.last)));
        self.last = now;
    }

    /// Get the elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get all recorded splits
    pub fn splits(&self) -> &[(&'static str, Duration)] {
        &self.splits
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Render the splits as `stage=12us` pairs for logging
    pub fn summary(&self) -> String {
        self.splits
            .iter()
            .map(|(label, d)| format!("{}={}us", label, d.as_micros()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}
