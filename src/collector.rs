//! Optimization metrics collection
//!
//! Summarizes every known stage output found in the store: route count,
//! fleet-size distribution and mean utilization. Missing stages are skipped.

use crate::model::FleetType;
use crate::policy::round_to;
use crate::store::{keys, PipelineStateStore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Stage display names paired with their store keys, in reporting order
pub const DEFAULT_STAGES: [(&str, &str); 4] = [
    ("Initial Clustering", keys::CLUSTERED_ORDERS),
    ("Time Optimization", keys::TIME_OPTIMIZED_ROUTES),
    ("Weight Optimization", keys::WEIGHT_OPTIMIZED_ROUTES),
    ("Volume Optimization", keys::VOLUME_OPTIMIZED_ROUTES),
];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FleetDistribution {
    #[serde(rename = "Small")]
    pub small: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "Large")]
    pub large: usize,
}

impl FleetDistribution {
    fn record(&mut self, fleet_type: FleetType) {
        match fleet_type {
            FleetType::Small => self.small += 1,
            FleetType::Medium => self.medium += 1,
            FleetType::Large => self.large += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct StageMetrics {
    /// All routes in the stage, including ones with unrecognized fleet types
    pub route_count: usize,
    pub avg_utilization: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageSummary {
    pub stage: String,
    pub fleet_distribution: FleetDistribution,
    pub metrics: StageMetrics,
}

#[derive(Debug, Clone)]
pub struct OptimizationCollector {
    stages: Vec<(String, String)>,
}

impl Default for OptimizationCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationCollector {
    pub fn new() -> Self {
        Self::with_stages(
            DEFAULT_STAGES
                .iter()
                .map(|(name, key)| (name.to_string(), key.to_string()))
                .collect(),
        )
    }

    /// Collector over a custom `(display name, store key)` list
    pub fn with_stages(stages: Vec<(String, String)>) -> Self {
        Self { stages }
    }

    /// Summarize every stage present in `store`
    ///
    /// The ordered list of stages found is written back under
    /// [`keys::OPTIMIZATION_STAGES`]; no route data is written.
    pub fn collect(&self, store: &PipelineStateStore) -> Vec<StageSummary> {
        let mut summaries = Vec::new();

        for (name, key) in &self.stages {
            match store.get(key) {
                Some(data) if !is_empty_stage(&data) => {
                    summaries.push(summarize_stage(name, &data))
                }
                _ => {
                    debug!(stage = %name, key = %key, "Stage absent or empty, skipping");
                }
            }
        }

        let found: Vec<Value> = summaries
            .iter()
            .map(|summary| json!(summary.stage))
            .collect();
        store.set(keys::OPTIMIZATION_STAGES, Value::Array(found));

        info!(stages = summaries.len(), "Optimization metrics collected");
        summaries
    }
}

/// A stage with no content: null, false, zero, `""`, `[]` or `{}`
fn is_empty_stage(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Summarize one stage output, `{"routes": [...]}` or a bare route list
pub fn summarize_stage(name: &str, data: &Value) -> StageSummary {
    let routes: &[Value] = match data {
        Value::Array(routes) => routes,
        Value::Object(map) => map
            .get("routes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };

    let mut fleet_distribution = FleetDistribution::default();
    let mut total_utilization = 0.0;

    for route in routes {
        if let Some(fleet_type) = route
            .get("fleet_type")
            .and_then(Value::as_str)
            .and_then(FleetType::parse)
        {
            fleet_distribution.record(fleet_type);
        }
        total_utilization += route.get("utilization").and_then(Value::as_f64).unwrap_or(0.0);
    }

    let route_count = routes.len();
    let avg_utilization = if route_count > 0 {
        round_to(total_utilization / route_count as f64, 2)
    } else {
        0.0
    };

    StageSummary {
        stage: name.to_string(),
        fleet_distribution,
        metrics: StageMetrics {
            route_count,
            avg_utilization,
        },
    }
}
