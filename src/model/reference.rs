//! Static reference data: delivery locations, SKU metadata and inventory
//!
//! These types mirror the on-disk JSON sources. Field names are part of the
//! wire contract consumed by downstream planning stages and must not change.

use serde::{Deserialize, Serialize};

/// Metadata for a single delivery location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationMeta {
    /// Location identifier (`id` in the geolocations source)
    #[serde(alias = "id")]
    pub location_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Distance from the dispatching warehouse
    pub distance_from_warehouse: f64,
}

/// Flattened SKU metadata, keyed by SKU code in the reference lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkuMeta {
    pub name: String,
    /// Product category; backfilled from the enclosing category key when absent
    #[serde(default)]
    pub category: String,
    pub is_hazardous: bool,
    pub is_perishable: bool,
}

/// One row of the inventory source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub sku: String,
    pub available_quantity: i64,
}

/// Geolocations source, either wrapped or a bare list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeolocationsFile {
    Wrapped { delivery_locations: Vec<LocationMeta> },
    Bare(Vec<LocationMeta>),
}

impl GeolocationsFile {
    pub fn into_locations(self) -> Vec<LocationMeta> {
        match self {
            GeolocationsFile::Wrapped { delivery_locations } => delivery_locations,
            GeolocationsFile::Bare(locations) => locations,
        }
    }
}

/// Inventory source, either wrapped or a bare list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InventoryFile {
    Wrapped { inventory: Vec<InventoryItem> },
    Bare(Vec<InventoryItem>),
}

impl InventoryFile {
    pub fn into_items(self) -> Vec<InventoryItem> {
        match self {
            InventoryFile::Wrapped { inventory } => inventory,
            InventoryFile::Bare(items) => items,
        }
    }
}
