//! Optimization metrics collection over pipeline stage outputs

use geocluster::collector::OptimizationCollector;
use geocluster::config::PipelineConfig;
use geocluster::testing::single_order_dataset;
use geocluster::{keys, Pipeline, PipelineStateStore};
use serde_json::json;

#[test]
fn test_empty_store_reports_nothing() {
    let store = PipelineStateStore::new();
    let summaries = OptimizationCollector::new().collect(&store);

    assert!(summaries.is_empty());
    assert_eq!(store.get(keys::OPTIMIZATION_STAGES), Some(json!([])));
}

#[test]
fn test_full_pipeline_summary() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    pipeline.cluster_dataset(&single_order_dataset()).unwrap();

    pipeline.record_stage(
        keys::TIME_OPTIMIZED_ROUTES,
        json!({"routes": [
            {"fleet_type": "Small", "utilization": 0.25},
            {"fleet_type": "Medium", "utilization": 0.75}
        ]}),
    );
    pipeline.record_stage(
        keys::VOLUME_OPTIMIZED_ROUTES,
        json!({"routes": [
            {"fleet_type": "Large", "utilization": 1.0},
            {"fleet_type": "Hovercraft", "utilization": 0.5},
            {"fleet_type": "Large"}
        ]}),
    );

    let summaries = pipeline.collect_metrics();
    let stages: Vec<&str> = summaries.iter().map(|s| s.stage.as_str()).collect();
    assert_eq!(
        stages,
        vec!["Initial Clustering", "Time Optimization", "Volume Optimization"]
    );

    let time = &summaries[1];
    assert_eq!(time.fleet_distribution.small, 1);
    assert_eq!(time.fleet_distribution.medium, 1);
    assert_eq!(time.metrics.route_count, 2);
    assert_eq!(time.metrics.avg_utilization, 0.5);

    let volume = &summaries[2];
    assert_eq!(volume.fleet_distribution.large, 2);
    // Unrecognized fleet types still count as routes
    assert_eq!(volume.metrics.route_count, 3);
    assert_eq!(volume.metrics.avg_utilization, 0.5);

    assert_eq!(
        pipeline.store().get(keys::OPTIMIZATION_STAGES),
        Some(json!(["Initial Clustering", "Time Optimization", "Volume Optimization"]))
    );
}

#[test]
fn test_collector_does_not_touch_route_data() {
    let store = PipelineStateStore::new();
    let routes = json!({"routes": [{"fleet_type": "Small"}]});
    store.set(keys::WEIGHT_OPTIMIZED_ROUTES, routes.clone());

    OptimizationCollector::new().collect(&store);
    OptimizationCollector::new().collect(&store);

    assert_eq!(store.get(keys::WEIGHT_OPTIMIZED_ROUTES), Some(routes));
}

#[test]
fn test_custom_stage_list() {
    let store = PipelineStateStore::new();
    store.set("night_routes", json!([{"fleet_type": "Medium"}]));

    let collector =
        OptimizationCollector::with_stages(vec![("Night Shift".to_string(), "night_routes".to_string())]);
    let summaries = collector.collect(&store);

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].stage, "Night Shift");
    assert_eq!(summaries[0].fleet_distribution.medium, 1);
}

#[test]
fn test_output_wire_shape() {
    let store = PipelineStateStore::new();
    store.set(keys::TIME_OPTIMIZED_ROUTES, json!({"routes": [{"fleet_type": "Small"}]}));

    let summaries = OptimizationCollector::new().collect(&store);
    let value = serde_json::to_value(&summaries).unwrap();

    assert_eq!(value[0]["stage"], "Time Optimization");
    assert_eq!(value[0]["fleet_distribution"]["Small"], 1);
    assert_eq!(value[0]["fleet_distribution"]["Medium"], 0);
    assert_eq!(value[0]["metrics"]["route_count"], 1);
    assert!(value[0]["metrics"]["avg_utilization"].is_number());
}
