//! Pipeline counters and latency histograms.
//! Counters track cache and network activity; histograms keep the last
//! samples of each timed round trip for p50/p95/p99 summaries.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A span measuring elapsed time from creation to `finish`.
pub struct TimingSpan {
    name: &'static str,
    start: Instant,
    registry: Arc<MetricsRegistry>,
}

impl TimingSpan {
    /// Record elapsed microseconds under the span's name.
    pub fn finish(self) -> f64 {
        let elapsed_us = self.start.elapsed().as_micros() as f64;
        self.registry.record(self.name, elapsed_us);
        elapsed_us
    }
}

/// Fixed-capacity ring of the most recent samples.
struct SampleRing {
    samples: Vec<f64>,
    next: usize,
    len: usize,
}

impl SampleRing {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            next: 0,
            len: 0,
        }
    }

    fn push(&mut self, value: f64) {
        let capacity = self.samples.len();
        self.samples[self.next] = value;
        self.next = (self.next + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let mut sorted = self.samples[..self.len].to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((p / 100.0) * (self.len as f64 - 1.0)).round() as usize;
        sorted[idx.min(self.len - 1)]
    }
}

pub struct MetricsRegistry {
    counters: Mutex<HashMap<&'static str, u64>>,
    histograms: Mutex<HashMap<&'static str, SampleRing>>,
    ring_capacity: usize,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
            ring_capacity: 256,
        }
    }

    pub fn incr(&self, name: &'static str) {
        *self.counters.lock().entry(name).or_insert(0) += 1;
    }

    pub fn count(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    /// Record a latency sample in microseconds.
    pub fn record(&self, name: &'static str, value_us: f64) {
        self.histograms
            .lock()
            .entry(name)
            .or_insert_with(|| SampleRing::with_capacity(self.ring_capacity))
            .push(value_us);
        tracing::trace!(metric = name, value_us, "metric_recorded");
    }

    pub fn span(self: &Arc<Self>, name: &'static str) -> TimingSpan {
        TimingSpan {
            name,
            start: Instant::now(),
            registry: Arc::clone(self),
        }
    }

    pub fn percentile(&self, name: &str, p: f64) -> f64 {
        self.histograms
            .lock()
            .get(name)
            .map(|ring| ring.percentile(p))
            .unwrap_or(0.0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .lock()
            .iter()
            .map(|(&name, &value)| (name.to_string(), value))
            .collect();
        let latencies = self
            .histograms
            .lock()
            .iter()
            .map(|(&name, ring)| {
                (
                    name.to_string(),
                    LatencySummary {
                        p50_us: ring.percentile(50.0),
                        p95_us: ring.percentile(95.0),
                        p99_us: ring.percentile(99.0),
                        count: ring.len,
                    },
                )
            })
            .collect();
        MetricsSnapshot {
            counters,
            latencies,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LatencySummary {
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub latencies: HashMap<String, LatencySummary>,
}

pub mod metric_names {
    pub const CACHE_HIT: &str = "cache_hit";
    pub const CACHE_MISS: &str = "cache_miss";
    pub const TOKEN_REQUEST: &str = "token_request";
    pub const TOKEN_REFRESH: &str = "token_refresh";
    pub const TRANSLATE_ATTEMPT: &str = "translate_attempt";
    pub const NO_RESULT: &str = "no_result";
    pub const T_TOKEN: &str = "t_token";
    pub const T_TRANSLATE: &str = "t_translate";
}
