//! Stage wiring
//!
//! A [`Pipeline`] owns the configuration, the cell indexer, a handle to the
//! shared state store and its own counters. Clustering runs load, aggregate,
//! cluster and publish the canonical artifact; enrichment and metric
//! collection read it back from the store.
//!
//! In strict mode any issue that drops or degrades data fails the operation
//! with [`PipelineError::StrictModeViolation`] instead of only being logged.

use crate::aggregator::OrderAggregator;
use crate::collector::{OptimizationCollector, StageSummary};
use crate::config::PipelineConfig;
use crate::enrichment::{EnrichmentOutcome, RouteEnricher};
use crate::error::{PipelineError, PipelineResult};
use crate::geo::{CellIndexer, GeoClusterer, H3CellIndexer};
use crate::issues::{DataIssue, LookupKind};
use crate::loader::{load_dataset, Dataset};
use crate::model::{ClusteredOrders, InventoryIssue, ProductSummary, RouteDraft};
use crate::observability::PipelineMetrics;
use crate::store::{keys, PipelineStateStore};
use crate::{run_span, stage_span};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of one clustering run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClusteringReport {
    pub run_id: Uuid,
    /// The artifact published under [`keys::CLUSTERED_ORDERS`]
    pub clustered: ClusteredOrders,
    pub product_summary: Vec<ProductSummary>,
    pub inventory_issues: Vec<InventoryIssue>,
    /// Every non-fatal issue raised during the run, in stage order
    pub issues: Vec<DataIssue>,
}

pub struct Pipeline {
    config: PipelineConfig,
    store: PipelineStateStore,
    metrics: Arc<PipelineMetrics>,
    indexer: Box<dyn CellIndexer>,
}

impl Pipeline {
    /// Pipeline with a fresh store and an H3 indexer at the configured resolution
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        Self::with_store(config, PipelineStateStore::new())
    }

    /// Pipeline publishing into an existing store
    pub fn with_store(config: PipelineConfig, store: PipelineStateStore) -> PipelineResult<Self> {
        config.validate()?;
        let indexer = H3CellIndexer::new(config.clustering.resolution)?;

        Ok(Self {
            config,
            store,
            metrics: Arc::new(PipelineMetrics::new()),
            indexer: Box::new(indexer),
        })
    }

    /// Replace the cell indexer
    pub fn with_indexer<I: CellIndexer + 'static>(mut self, indexer: I) -> Self {
        self.indexer = Box::new(indexer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &PipelineStateStore {
        &self.store
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    fn is_strict(&self) -> bool {
        self.config.validation.strict
    }

    /// Load the configured sources, cluster them and publish the artifact
    pub fn run_clustering(&self) -> PipelineResult<ClusteringReport> {
        let sources = self.config.data_sources()?;

        let started = Instant::now();
        let dataset = {
            let _span = stage_span!(stage = "load").entered();
            load_dataset(&sources)?
        };
        self.metrics.stage_completed("load", started.elapsed());

        self.cluster_dataset(&dataset)
    }

    /// Aggregate and cluster an already loaded dataset, then publish it
    ///
    /// The artifact replaces any previous value under
    /// [`keys::CLUSTERED_ORDERS`]. Nothing is written when strict mode
    /// rejects the run.
    pub fn cluster_dataset(&self, dataset: &Dataset) -> PipelineResult<ClusteringReport> {
        let run_id = Uuid::new_v4();
        let _run = run_span!(run_id = %run_id, indexer = %self.indexer.describe()).entered();

        let mut issues: Vec<DataIssue> = dataset.reference.issues.clone();
        self.metrics.sku_collisions(issues.len());

        let started = Instant::now();
        let aggregation = {
            let _span = stage_span!(stage = "aggregate").entered();
            OrderAggregator::new(
                &dataset.reference,
                &self.config.delivery_time,
                &self.config.validation.high_priority,
            )
            .aggregate(&dataset.orders)
        };
        self.metrics.stage_completed("aggregate", started.elapsed());

        self.metrics.orders_seen(aggregation.orders_seen);
        self.metrics.empty_orders_skipped(aggregation.skipped_orders);
        self.metrics.lines_aggregated(aggregation.lines);
        self.metrics.priority_lines(aggregation.priority_orders.len());
        self.metrics
            .unknown_skus(aggregation.count_lookup_misses(LookupKind::Sku));
        self.metrics
            .unknown_locations(aggregation.count_lookup_misses(LookupKind::Location));

        info!(
            locations = aggregation.locations.len(),
            lines = aggregation.lines,
            priority_lines = aggregation.priority_orders.len(),
            skipped_orders = aggregation.skipped_orders,
            "Orders aggregated"
        );

        for shortfall in &aggregation.inventory_issues {
            warn!(
                sku = %shortfall.sku,
                ordered = shortfall.ordered_quantity,
                available = shortfall.available_quantity,
                "Ordered quantity exceeds available inventory"
            );
        }

        issues.extend(aggregation.issues);

        let started = Instant::now();
        let outcome = {
            let _span = stage_span!(stage = "cluster").entered();
            GeoClusterer::new(self.indexer.as_ref())
                .cluster(aggregation.locations, aggregation.priority_orders)
        };
        self.metrics.stage_completed("cluster", started.elapsed());
        self.metrics.clustering_run();
        self.metrics
            .unplaced_locations(outcome.clustered.unplaced_locations.len());

        info!(
            cells = outcome.clustered.geo_clusters.len(),
            unplaced = outcome.clustered.unplaced_locations.len(),
            "Locations clustered"
        );

        issues.extend(outcome.issues);
        self.check_strict(&issues)?;

        self.store
            .set_typed(keys::CLUSTERED_ORDERS, &outcome.clustered)?;
        self.metrics.store_write();

        Ok(ClusteringReport {
            run_id,
            clustered: outcome.clustered,
            product_summary: aggregation.product_summary,
            inventory_issues: aggregation.inventory_issues,
            issues,
        })
    }

    /// Enrich drafts against the clustered artifact in the store
    ///
    /// Fails with a missing-key error if no clustering run has published yet.
    pub fn enrich_routes(&self, drafts: &[RouteDraft]) -> PipelineResult<Vec<EnrichmentOutcome>> {
        let _span = stage_span!(stage = "enrich", routes = drafts.len()).entered();
        let started = Instant::now();

        let clustered: ClusteredOrders = self.store.require(keys::CLUSTERED_ORDERS)?;
        let enricher = RouteEnricher::new(&clustered, &self.config.delivery_time);
        let outcomes = enricher.enrich_all(drafts);

        for outcome in &outcomes {
            self.metrics.route_enriched(outcome.issues.len());
        }
        self.metrics.stage_completed("enrich", started.elapsed());

        let issues: Vec<DataIssue> = outcomes
            .iter()
            .flat_map(|outcome| outcome.issues.iter().cloned())
            .collect();
        info!(
            routes = outcomes.len(),
            missing_locations = issues.len(),
            "Routes enriched"
        );
        self.check_strict(&issues)?;

        Ok(outcomes)
    }

    /// Validate a raw route set (`{"routes": [...]}` or a list) and enrich it
    pub fn enrich_route_values(&self, routes: &Value) -> PipelineResult<Vec<EnrichmentOutcome>> {
        let drafts = RouteDraft::parse_route_set(routes)?;
        self.enrich_routes(&drafts)
    }

    /// Publish an external stage's output into the store
    pub fn record_stage(&self, key: &str, value: Value) {
        info!(stage = %key, "Recording stage output");
        self.store.set(key, value);
        self.metrics.store_write();
    }

    /// Summarize every known stage currently in the store
    pub fn collect_metrics(&self) -> Vec<StageSummary> {
        let _span = stage_span!(stage = "collect").entered();
        let summaries = OptimizationCollector::new().collect(&self.store);
        self.metrics.store_write();
        summaries
    }

    /// Drop everything published to the store and zero this pipeline's counters
    ///
    /// Other pipelines sharing the store observe the cleared state.
    pub fn reset(&self) {
        self.store.clear_all();
        self.metrics.reset();
        info!("Pipeline state reset");
    }

    fn check_strict(&self, issues: &[DataIssue]) -> PipelineResult<()> {
        if !self.is_strict() {
            return Ok(());
        }

        let data_loss: Vec<DataIssue> = issues
            .iter()
            .filter(|issue| issue.is_data_loss())
            .cloned()
            .collect();

        if data_loss.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::strict_mode_violation(data_loss))
        }
    }
}
