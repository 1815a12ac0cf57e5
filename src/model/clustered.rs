//! Aggregated and geo-clustered order structures
//!
//! `ClusteredOrders` is the canonical artifact handed from clustering to the
//! route drafting and enrichment stages through the shared state store.

use crate::model::reference::{LocationMeta, SkuMeta};
use crate::policy::DeliveryTimePolicy;
use serde::{Deserialize, Serialize};

/// Geo cell identifier produced by a cell indexer
pub type GeoCell = String;

/// One (order, package) line attributed to a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusteredOrderLine {
    /// Cell the owning location resolved to; stamped during geo-clustering
    #[serde(default, alias = "h3_index")]
    pub geo_cell: Option<GeoCell>,
    pub order_id: String,
    /// Line weight in kg (unit weight × quantity)
    pub weight: f64,
    /// Line volume in m³, 0.0 when dimensions were missing
    pub volume: f64,
    /// SKU code
    pub product: String,
    pub quantity: u32,
    /// SKU metadata, null when the SKU is unknown
    pub metadata: Option<SkuMeta>,
}

/// Rolled-up totals and constituent lines for one delivery location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationAggregate {
    pub location_id: String,
    /// Location metadata, null when the location is unknown
    pub location: Option<LocationMeta>,
    pub total_weight: f64,
    pub total_volume: f64,
    #[serde(alias = "estimated_delivery_time_hours")]
    pub est_delivery_time_hours: f64,
    /// Lines in insertion order
    pub orders: Vec<ClusteredOrderLine>,
}

impl LocationAggregate {
    /// Build an aggregate whose totals are derived from `lines`
    pub fn new(
        location_id: String,
        location: Option<LocationMeta>,
        lines: Vec<ClusteredOrderLine>,
        policy: &DeliveryTimePolicy,
    ) -> Self {
        let mut aggregate = Self {
            location_id,
            location,
            total_weight: 0.0,
            total_volume: 0.0,
            est_delivery_time_hours: 0.0,
            orders: lines,
        };
        aggregate.recompute_totals(policy);
        aggregate
    }

    pub fn line_weight_sum(&self) -> f64 {
        self.orders.iter().map(|line| line.weight).sum()
    }

    pub fn line_volume_sum(&self) -> f64 {
        self.orders.iter().map(|line| line.volume).sum()
    }

    /// Re-derive totals and the delivery estimate from the current lines
    pub fn recompute_totals(&mut self, policy: &DeliveryTimePolicy) {
        self.total_weight = self.line_weight_sum();
        self.total_volume = self.line_volume_sum();
        self.est_delivery_time_hours = policy.estimate_hours(self.total_weight);
    }

    /// First line's order id, used as the location's representative order
    pub fn representative_order_id(&self) -> Option<&str> {
        self.orders.first().map(|line| line.order_id.as_str())
    }
}

/// A package line from a high-priority order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityOrder {
    pub order_id: String,
    pub location_id: String,
    pub priority: String,
    pub product: String,
    pub quantity: u32,
    pub metadata: Option<SkuMeta>,
}

/// Locations sharing a geo cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoClusteredGroup {
    #[serde(alias = "h3_index")]
    pub geo_cell: GeoCell,
    pub locations: Vec<LocationAggregate>,
}

impl GeoClusteredGroup {
    pub fn total_weight(&self) -> f64 {
        self.locations.iter().map(|l| l.total_weight).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.locations.iter().map(|l| l.total_volume).sum()
    }

    pub fn location_ids(&self) -> Vec<String> {
        self.locations
            .iter()
            .map(|l| l.location_id.clone())
            .collect()
    }
}

/// Why a location could not be assigned to a geo cell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    MissingLocationMeta,
    InvalidCoordinates,
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::MissingLocationMeta => write!(f, "no location metadata"),
            UnplacedReason::InvalidCoordinates => write!(f, "invalid coordinates"),
        }
    }
}

/// A location aggregate that could not be geo-clustered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnplacedLocation {
    pub reason: UnplacedReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub location: LocationAggregate,
}

/// Canonical clustered-orders artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClusteredOrders {
    pub priority_orders: Vec<PriorityOrder>,
    #[serde(alias = "h3_clusters")]
    pub geo_clusters: Vec<GeoClusteredGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unplaced_locations: Vec<UnplacedLocation>,
}

impl ClusteredOrders {
    /// All placed location aggregates, in group order
    pub fn locations(&self) -> impl Iterator<Item = &LocationAggregate> {
        self.geo_clusters.iter().flat_map(|group| group.locations.iter())
    }

    pub fn find_group(&self, geo_cell: &str) -> Option<&GeoClusteredGroup> {
        self.geo_clusters.iter().find(|group| group.geo_cell == geo_cell)
    }

    pub fn total_weight(&self) -> f64 {
        self.locations().map(|l| l.total_weight).sum()
    }
}

/// Per-SKU ordered quantity across all orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSummary {
    pub product: String,
    pub total_quantity: u64,
    pub metadata: Option<SkuMeta>,
}

/// An ordered SKU whose demand exceeds available inventory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryIssue {
    pub sku: String,
    pub ordered_quantity: u64,
    pub available_quantity: i64,
    pub shortfall: i64,
}
