//! Geocluster - geospatial order clustering for delivery planning
//!
//! Turns raw delivery orders plus location, SKU and inventory reference data
//! into geo-clustered, metric-annotated groups, and re-derives route metrics
//! as external planning stages revise routes.
//!
//! # Overview
//!
//! - Reference data loading and indexing ([`loader`])
//! - Per-location order aggregation ([`aggregator`])
//! - H3 cell assignment and grouping ([`geo`])
//! - A shared, last-write-wins state store for stage hand-off ([`store`])
//! - Route enrichment from the clustered artifact ([`enrichment`])
//! - Per-stage fleet and utilization summaries ([`collector`])
//!
//! # Quick Start
//!
//! ```rust
//! use geocluster::model::{Dimensions, PriorityFlag};
//! use geocluster::testing::{package, raw_order, reference_data};
//! use geocluster::{Dataset, Pipeline, PipelineConfig};
//! use serde_json::json;
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let dataset = Dataset {
//!     orders: vec![raw_order(
//!         "ORD1",
//!         "LOC1",
//!         Some(PriorityFlag::Flag(true)),
//!         vec![package("SKU1", 2, 5.0, Some(Dimensions::new(1.0, 1.0, 1.0)))],
//!     )],
//!     reference: reference_data(),
//! };
//!
//! let report = pipeline.cluster_dataset(&dataset).unwrap();
//! let cell = report.clustered.geo_clusters[0].geo_cell.clone();
//!
//! let routes = pipeline
//!     .enrich_route_values(&json!({"routes": [{
//!         "geo_cell": cell,
//!         "fleet_id": "F-1",
//!         "fleet_type": "Small",
//!         "location_ids": ["LOC1"]
//!     }]}))
//!     .unwrap();
//! assert_eq!(routes[0].route.total_weight, 10.0);
//! ```

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod geo;
pub mod issues;
pub mod loader;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod policy;
pub mod store;
pub mod testing;

pub use aggregator::{AggregationOutput, OrderAggregator};
pub use collector::{OptimizationCollector, StageSummary};
pub use config::{ConfigError, PipelineConfig};
pub use enrichment::{EnrichmentOutcome, RouteEnricher};
pub use error::{ErrorCode, PipelineError, PipelineResult};
pub use geo::{CellIndexer, GeoClusterer, H3CellIndexer};
pub use issues::{DataIssue, LookupKind};
pub use loader::{load_dataset, DataLoadError, DataSources, Dataset, ReferenceData};
pub use pipeline::{ClusteringReport, Pipeline};
pub use policy::DeliveryTimePolicy;
pub use store::{keys, PipelineStateStore, StoreError};
