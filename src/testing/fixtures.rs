//! Fixture builders and a deterministic cell indexer
//!
//! Used by unit tests and the integration tests under `tests/`.

use crate::geo::{CellIndexer, GeoIndexError};
use crate::loader::{Dataset, ReferenceData};
use crate::model::{
    ClusteredOrderLine, Dimensions, InventoryItem, LocationMeta, Package, PriorityFlag, RawOrder,
    SkuMeta,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

/// Cell indexer with an explicit coordinate to cell table
///
/// Unmapped coordinates fall back to the default cell if one is set and are
/// rejected otherwise.
#[derive(Debug, Clone, Default)]
pub struct FixedCellIndexer {
    cells: HashMap<(u64, u64), String>,
    default_cell: Option<String>,
}

impl FixedCellIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, latitude: f64, longitude: f64, cell: &str) -> Self {
        self.cells
            .insert((latitude.to_bits(), longitude.to_bits()), cell.to_string());
        self
    }

    pub fn with_default(mut self, cell: &str) -> Self {
        self.default_cell = Some(cell.to_string());
        self
    }
}

impl CellIndexer for FixedCellIndexer {
    fn cell_for(&self, latitude: f64, longitude: f64) -> Result<String, GeoIndexError> {
        self.cells
            .get(&(latitude.to_bits(), longitude.to_bits()))
            .or(self.default_cell.as_ref())
            .cloned()
            .ok_or_else(|| GeoIndexError::InvalidCoordinates {
                latitude,
                longitude,
                reason: "no fixed cell for coordinate".to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("fixed table of {} cells", self.cells.len())
    }
}

pub fn location_meta(location_id: &str, latitude: f64, longitude: f64) -> LocationMeta {
    LocationMeta {
        location_id: location_id.to_string(),
        latitude,
        longitude,
        altitude: 900.0,
        distance_from_warehouse: 5.0,
    }
}

pub fn sku_meta(name: &str, category: &str) -> SkuMeta {
    SkuMeta {
        name: name.to_string(),
        category: category.to_string(),
        is_hazardous: false,
        is_perishable: false,
    }
}

pub fn package(sku: &str, quantity: u32, weight_kg: f64, dimensions: Option<Dimensions>) -> Package {
    Package {
        sku: sku.to_string(),
        quantity,
        weight_kg,
        dimensions_m: dimensions,
    }
}

pub fn raw_order(
    order_id: &str,
    location_id: &str,
    priority: Option<PriorityFlag>,
    packages: Vec<Package>,
) -> RawOrder {
    RawOrder {
        order_id: order_id.to_string(),
        location_id: location_id.to_string(),
        priority,
        ordered_at: None,
        packages,
    }
}

/// An aggregated line with `unit_weight × quantity` kg and 0.5 m³ per unit
pub fn order_line(order_id: &str, sku: &str, quantity: u32, unit_weight: f64) -> ClusteredOrderLine {
    ClusteredOrderLine {
        geo_cell: None,
        order_id: order_id.to_string(),
        weight: unit_weight * f64::from(quantity),
        volume: 0.5 * f64::from(quantity),
        product: sku.to_string(),
        quantity,
        metadata: None,
    }
}

/// Reference data with two locations and two SKUs
///
/// LOC1 (Bangalore) sits at (12.97, 77.59) and LOC2 (Chennai) at
/// (13.08, 80.27); they land in distinct cells from resolution 3 up. Inventory holds
/// 10 of SKU1 and 1 of SKU2.
pub fn reference_data() -> ReferenceData {
    let sku_map = json!({
        "dairy": {"SKU1": {"name": "Milk", "category": "dairy", "is_hazardous": false, "is_perishable": true}},
        "cleaning": {"SKU2": {"name": "Bleach", "is_hazardous": true, "is_perishable": false}}
    });
    let sku_map = match sku_map {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    ReferenceData::from_parts(
        vec![
            location_meta("LOC1", 12.97, 77.59),
            location_meta("LOC2", 13.08, 80.27),
        ],
        &sku_map,
        vec![
            InventoryItem {
                sku: "SKU1".to_string(),
                available_quantity: 10,
            },
            InventoryItem {
                sku: "SKU2".to_string(),
                available_quantity: 1,
            },
        ],
        Path::new("fixture"),
    )
    .unwrap_or_default()
}

/// Reference data plus the single-order scenario: ORD1 at LOC1, priority,
/// two units of SKU1 at 5 kg in a 1 m cube
pub fn single_order_dataset() -> Dataset {
    Dataset {
        orders: vec![raw_order(
            "ORD1",
            "LOC1",
            Some(PriorityFlag::Flag(true)),
            vec![package("SKU1", 2, 5.0, Some(Dimensions::new(1.0, 1.0, 1.0)))],
        )],
        reference: reference_data(),
    }
}

/// Source files in the on-disk envelope shapes, keyed by file name
pub fn source_files() -> Vec<(&'static str, Value)> {
    vec![
        (
            "orders.json",
            json!({"orders": [
                {
                    "order_id": "ORD1",
                    "location_id": "LOC1",
                    "priority": "high",
                    "packages": [
                        {"sku": "SKU1", "quantity": 2, "weight_kg": 5.0, "dimensions_m": {"l": 1.0, "w": 1.0, "h": 1.0}}
                    ]
                },
                {
                    "order_id": "ORD2",
                    "location_id": "LOC2",
                    "priority": "normal",
                    "packages": [
                        {"sku": "SKU2", "quantity": 1, "weight_kg": 40.0}
                    ]
                },
                {
                    "order_id": "ORD3",
                    "location_id": "LOC1",
                    "priority": "normal",
                    "packages": []
                }
            ]}),
        ),
        (
            "geolocations.json",
            json!({"delivery_locations": [
                {"id": "LOC1", "latitude": 12.97, "longitude": 77.59, "altitude": 920.0, "distance_from_warehouse": 4.2},
                {"id": "LOC2", "latitude": 13.08, "longitude": 80.27, "altitude": 6.0, "distance_from_warehouse": 340.0}
            ]}),
        ),
        (
            "static_reference_data.json",
            json!({"sku_map": {
                "dairy": {"SKU1": {"name": "Milk", "category": "dairy", "is_hazardous": false, "is_perishable": true}},
                "cleaning": {"SKU2": {"name": "Bleach", "category": "cleaning", "is_hazardous": true, "is_perishable": false}}
            }}),
        ),
        (
            "inventory.json",
            json!({"inventory": [
                {"sku": "SKU1", "available_quantity": 10},
                {"sku": "SKU2", "available_quantity": 0}
            ]}),
        ),
    ]
}
