use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sliding window of per-item processing latencies
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: Arc<Mutex<VecDeque<u64>>>,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Record one latency sample in nanoseconds, evicting the oldest when full
    pub fn record(&self, nanos: u64) {
        let mut samples = self.samples.lock();
        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(nanos);
    }

    /// The `p`-th percentile (0.0..=1.0) of the window, in microseconds
    pub fn percentile_us(&self, p: f64) -> f64 {
        let mut sorted: Vec<u64> = self.samples.lock().iter().copied().collect();
        if sorted.is_empty() {
            return 0.0;
        }
        sorted.sort_unstable();

        let idx = ((sorted.len() as f64 * p).ceil() as usize)
            .saturating_sub(1)
            .min(sorted.len() - 1);
        sorted[idx] as f64 / 1000.0
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

/// Counters for one pipeline stage.
///
/// Cloning shares the underlying counters, so every line source thread can
/// report into the same `StageMetrics`.
#[derive(Debug, Clone)]
pub struct StageMetrics {
    stage: Arc<str>,
    received: Arc<AtomicU64>,
    emitted: Arc<AtomicU64>,
    latency: LatencyWindow,
    started: Instant,
}

impl StageMetrics {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: Arc::from(stage),
            received: Arc::new(AtomicU64::new(0)),
            emitted: Arc::new(AtomicU64::new(0)),
            latency: LatencyWindow::new(1000),
            started: Instant::now(),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Record one item taken from the stage's input
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one item handed to the stage's output
    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, elapsed: Duration) {
        self.latency.record(elapsed.as_nanos() as u64);
    }

    pub fn total_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn total_emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Items emitted per second since the stage was created
    pub fn throughput_per_sec(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.total_emitted() as f64 / secs
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stage: self.stage.to_string(),
            received: self.total_received(),
            emitted: self.total_emitted(),
            throughput_per_sec: self.throughput_per_sec(),
            latency_p50_us: self.latency.percentile_us(0.50),
            latency_p95_us: self.latency.percentile_us(0.95),
            latency_p99_us: self.latency.percentile_us(0.99),
            elapsed_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

/// Point-in-time copy of a stage's counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub stage: String,
    pub received: u64,
    pub emitted: u64,
    pub throughput_per_sec: f64,
    pub latency_p50_us: f64,
    pub latency_p95_us: f64,
    pub latency_p99_us: f64,
    pub elapsed_ms: f64,
}

impl MetricsSnapshot {
    pub fn format(&self) -> String {
        format!(
            "{}: in {}, out {}, {:.2} items/s, latency P50 {:.2}µs P95 {:.2}µs P99 {:.2}µs, {:.2}ms",
            self.stage,
            self.received,
            self.emitted,
            self.throughput_per_sec,
            self.latency_p50_us,
            self.latency_p95_us,
            self.latency_p99_us,
            self.elapsed_ms
        )
    }
}
