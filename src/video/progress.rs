use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Receives job progress as a percentage in `[0, 100]` with a short message
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(f64, &str) + Send + Sync,
{
    fn report(&self, percent: f64, message: &str) {
        self(percent, message)
    }
}

/// Writes progress to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, percent: f64, message: &str) {
        info!("[{:>5.1}%] {}", percent, message);
    }
}

/// Forwards reports to a sink, never letting the value go backwards
pub struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    // f64 bits
    last: AtomicU64,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn percent(&self) -> f64 {
        f64::from_bits(self.last.load(Ordering::Relaxed))
    }

    pub fn report(&self, percent: f64, message: &str) {
        let last = self.percent();
        let percent = if percent.is_nan() {
            last
        } else {
            percent.clamp(0.0, 100.0).max(last)
        };
        self.last.store(percent.to_bits(), Ordering::Relaxed);
        self.sink.report(percent, message);
    }

    /// View of `start..end` of the overall range for one phase
    pub fn phase(&self, start: f64, end: f64) -> PhaseProgress<'_> {
        PhaseProgress {
            tracker: self,
            start,
            end,
        }
    }
}

/// Maps a phase-local fraction onto its slice of the job's progress
pub struct PhaseProgress<'a> {
    tracker: &'a ProgressTracker<'a>,
    start: f64,
    end: f64,
}

impl PhaseProgress<'_> {
    pub fn report(&self, fraction: f64, message: &str) {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        self.tracker
            .report(self.start + (self.end - self.start) * fraction, message);
    }
}
