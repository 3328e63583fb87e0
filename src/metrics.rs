//! Service counters and latency statistics for the check service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::verdict::Verdict;

/// Window of recent latencies kept for percentiles
const LATENCY_WINDOW: usize = 10_000;

/// Counters for the check service
pub struct ServiceMetrics {
    /// Checks that produced a verdict
    pub checks_completed: AtomicU64,
    pub fraudulent: AtomicU64,
    pub safe: AtomicU64,
    /// Checks that ended in an error
    pub checks_failed: AtomicU64,
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            checks_completed: AtomicU64::new(0),
            fraudulent: AtomicU64::new(0),
            safe: AtomicU64::new(0),
            checks_failed: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a completed check
    pub fn record_verdict(&self, verdict: Verdict, processing_time: Duration) {
        self.checks_completed.fetch_add(1, Ordering::Relaxed);
        match verdict {
            Verdict::Fraudulent => self.fraudulent.fetch_add(1, Ordering::Relaxed),
            Verdict::Safe => self.safe.fetch_add(1, Ordering::Relaxed),
        };
        self.record_time(processing_time);
    }

    /// Record a failed check
    pub fn record_failure(&self, kind: &str, processing_time: Duration) {
        self.checks_failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
        self.record_time(processing_time);
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Checks per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.checks_completed.load(Ordering::Relaxed)
            + self.checks_failed.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let completed = self.checks_completed.load(Ordering::Relaxed);
        let fraudulent = self.fraudulent.load(Ordering::Relaxed);
        let safe = self.safe.load(Ordering::Relaxed);
        let failed = self.checks_failed.load(Ordering::Relaxed);
        let fraud_rate = if completed > 0 {
            (fraudulent as f64 / completed as f64) * 100.0
        } else {
            0.0
        };
        let processing = self.get_processing_stats();

        info!(
            completed,
            fraudulent,
            safe,
            failed,
            fraud_rate = format!("{:.1}%", fraud_rate),
            throughput = format!("{:.1} checks/s", self.get_throughput()),
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Check service summary"
        );

        for (kind, count) in self.get_failures_by_kind() {
            info!(kind = %kind, count, "Check failures");
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary logger
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
