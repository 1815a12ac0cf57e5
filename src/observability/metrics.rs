//! Pipeline counters
//!
//! Atomic counters for data-quality and throughput events, plus per-stage
//! timing behind a mutex. Each [`Pipeline`](crate::pipeline::Pipeline) owns
//! one instance, so concurrent pipelines never share counts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Timing samples kept per stage
const MAX_STAGE_SAMPLES: usize = 1000;

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    orders_seen: AtomicU64,
    empty_orders_skipped: AtomicU64,
    lines_aggregated: AtomicU64,
    priority_lines: AtomicU64,
    unknown_skus: AtomicU64,
    unknown_locations: AtomicU64,
    unplaced_locations: AtomicU64,
    sku_collisions: AtomicU64,
    routes_enriched: AtomicU64,
    route_locations_missed: AtomicU64,
    clustering_runs: AtomicU64,
    store_writes: AtomicU64,

    stage_times: Mutex<HashMap<String, Vec<u64>>>,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub orders_seen: u64,
    pub empty_orders_skipped: u64,
    pub lines_aggregated: u64,
    pub priority_lines: u64,
    pub unknown_skus: u64,
    pub unknown_locations: u64,
    pub unplaced_locations: u64,
    pub sku_collisions: u64,
    pub routes_enriched: u64,
    pub route_locations_missed: u64,
    pub clustering_runs: u64,
    pub store_writes: u64,
    pub stages: HashMap<String, StageTimingSnapshot>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageTimingSnapshot {
    pub runs: usize,
    pub avg_ms: f64,
    pub max_ms: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders_seen(&self, count: usize) {
        self.orders_seen.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn empty_orders_skipped(&self, count: usize) {
        self.empty_orders_skipped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn lines_aggregated(&self, count: usize) {
        self.lines_aggregated.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn priority_lines(&self, count: usize) {
        self.priority_lines.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn unknown_skus(&self, count: usize) {
        self.unknown_skus.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn unknown_locations(&self, count: usize) {
        self.unknown_locations
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn unplaced_locations(&self, count: usize) {
        self.unplaced_locations
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn sku_collisions(&self, count: usize) {
        self.sku_collisions.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn route_enriched(&self, missed_locations: usize) {
        self.routes_enriched.fetch_add(1, Ordering::Relaxed);
        self.route_locations_missed
            .fetch_add(missed_locations as u64, Ordering::Relaxed);
    }

    pub fn clustering_run(&self) {
        self.clustering_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_write(&self) {
        self.store_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stage_completed(&self, stage: &str, duration: Duration) {
        if let Ok(mut times) = self.stage_times.lock() {
            let samples = times.entry(stage.to_string()).or_default();
            samples.push(duration.as_millis() as u64);

            if samples.len() > MAX_STAGE_SAMPLES {
                samples.remove(0);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let stages = self
            .stage_times
            .lock()
            .map(|times| {
                times
                    .iter()
                    .map(|(stage, samples)| (stage.clone(), timing_snapshot(samples)))
                    .collect()
            })
            .unwrap_or_default();

        MetricsSnapshot {
            timestamp: Utc::now(),
            orders_seen: self.orders_seen.load(Ordering::Relaxed),
            empty_orders_skipped: self.empty_orders_skipped.load(Ordering::Relaxed),
            lines_aggregated: self.lines_aggregated.load(Ordering::Relaxed),
            priority_lines: self.priority_lines.load(Ordering::Relaxed),
            unknown_skus: self.unknown_skus.load(Ordering::Relaxed),
            unknown_locations: self.unknown_locations.load(Ordering::Relaxed),
            unplaced_locations: self.unplaced_locations.load(Ordering::Relaxed),
            sku_collisions: self.sku_collisions.load(Ordering::Relaxed),
            routes_enriched: self.routes_enriched.load(Ordering::Relaxed),
            route_locations_missed: self.route_locations_missed.load(Ordering::Relaxed),
            clustering_runs: self.clustering_runs.load(Ordering::Relaxed),
            store_writes: self.store_writes.load(Ordering::Relaxed),
            stages,
        }
    }

    /// Zero every counter and drop timing samples
    pub fn reset(&self) {
        for counter in [
            &self.orders_seen,
            &self.empty_orders_skipped,
            &self.lines_aggregated,
            &self.priority_lines,
            &self.unknown_skus,
            &self.unknown_locations,
            &self.unplaced_locations,
            &self.sku_collisions,
            &self.routes_enriched,
            &self.route_locations_missed,
            &self.clustering_runs,
            &self.store_writes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.stage_times.lock() {
            times.clear();
        }
    }
}

fn timing_snapshot(samples: &[u64]) -> StageTimingSnapshot {
    let avg_ms = if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<u64>() as f64 / samples.len() as f64
    };

    StageTimingSnapshot {
        runs: samples.len(),
        avg_ms,
        max_ms: samples.iter().copied().max().unwrap_or(0),
    }
}
