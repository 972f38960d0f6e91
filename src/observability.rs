use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Transition counters for one executor (or several sharing an `Arc`)
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub transitions: AtomicU64,
    pub rejections: AtomicU64,
    pub guard_rejections: AtomicU64,
    pub effect_failures: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Any `InvalidAction` outcome, guard vetoes included
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_guard_rejection(&self) {
        self.guard_rejections.fetch_add(1, Ordering::Relaxed);
        self.record_rejection();
    }

    pub fn record_effect_failure(&self) {
        self.effect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            transitions: self.transitions.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            guard_rejections: self.guard_rejections.load(Ordering::Relaxed),
            effect_failures: self.effect_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            transitions = stats.transitions,
            rejections = stats.rejections,
            guard_rejections = stats.guard_rejections,
            effect_failures = stats.effect_failures,
            "Workflow engine metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    pub transitions: u64,
    pub rejections: u64,
    pub guard_rejections: u64,
    pub effect_failures: u64,
}

/// Times a single operation
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
        duration
    }
}
