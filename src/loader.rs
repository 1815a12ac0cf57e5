//! Reference data loading
//!
//! Reads the four JSON sources (orders, geolocations, static reference data,
//! inventory) and builds the lookups the aggregator joins against. Any missing
//! or malformed source fails the whole load; there are no partial loads.

use crate::issues::DataIssue;
use crate::model::{
    GeolocationsFile, InventoryFile, LocationMeta, OrdersFile, RawOrder, SkuMeta,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Loading failures. All of them are fatal for a pipeline run.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Data source not found: {path}")]
    Missing { path: PathBuf },

    #[error("Failed to read data source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected shape in {path}: {message}")]
    InvalidShape { path: PathBuf, message: String },
}

/// Locations of the four input sources
#[derive(Debug, Clone, PartialEq)]
pub struct DataSources {
    pub orders: PathBuf,
    pub geolocations: PathBuf,
    pub static_reference: PathBuf,
    pub inventory: PathBuf,
}

/// Indexed static lookups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub location_by_id: HashMap<String, LocationMeta>,
    pub sku_by_id: HashMap<String, SkuMeta>,
    pub available_qty_by_sku: HashMap<String, i64>,
    /// Data-quality warnings raised while indexing (SKU collisions)
    pub issues: Vec<DataIssue>,
}

/// Everything a clustering run needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub orders: Vec<RawOrder>,
    pub reference: ReferenceData,
}

impl ReferenceData {
    /// Build lookups from already-parsed sources
    pub fn from_parts(
        locations: Vec<LocationMeta>,
        sku_map: &Map<String, Value>,
        inventory: Vec<crate::model::InventoryItem>,
        origin: &Path,
    ) -> Result<Self, DataLoadError> {
        let location_by_id = build_location_map(locations);
        let (sku_by_id, issues) = flatten_sku_map(sku_map, origin)?;
        let available_qty_by_sku = inventory
            .into_iter()
            .map(|item| (item.sku, item.available_quantity))
            .collect();

        Ok(Self {
            location_by_id,
            sku_by_id,
            available_qty_by_sku,
            issues,
        })
    }

    pub fn location(&self, location_id: &str) -> Option<&LocationMeta> {
        self.location_by_id.get(location_id)
    }

    pub fn sku(&self, sku: &str) -> Option<&SkuMeta> {
        self.sku_by_id.get(sku)
    }

    /// Available quantity for a SKU; unknown SKUs have none available
    pub fn available_quantity(&self, sku: &str) -> i64 {
        self.available_qty_by_sku.get(sku).copied().unwrap_or(0)
    }
}

/// Load and index all four sources
pub fn load_dataset(sources: &DataSources) -> Result<Dataset, DataLoadError> {
    let orders = load_orders(&sources.orders)?;
    let locations = load_geolocations(&sources.geolocations)?;
    let sku_map = load_sku_map(&sources.static_reference)?;
    let inventory = read_json::<InventoryFile>(&sources.inventory)?.into_items();

    let reference = ReferenceData::from_parts(
        locations,
        &sku_map,
        inventory,
        &sources.static_reference,
    )?;

    info!(
        orders = orders.len(),
        locations = reference.location_by_id.len(),
        skus = reference.sku_by_id.len(),
        inventory_skus = reference.available_qty_by_sku.len(),
        "Reference data loaded"
    );

    Ok(Dataset { orders, reference })
}

pub fn load_orders(path: &Path) -> Result<Vec<RawOrder>, DataLoadError> {
    Ok(read_json::<OrdersFile>(path)?.into_orders())
}

pub fn load_geolocations(path: &Path) -> Result<Vec<LocationMeta>, DataLoadError> {
    Ok(read_json::<GeolocationsFile>(path)?.into_locations())
}

/// Read the nested `sku_map` object out of the static reference source
pub fn load_sku_map(path: &Path) -> Result<Map<String, Value>, DataLoadError> {
    let value: Value = read_json(path)?;
    match value {
        Value::Object(mut root) => match root.remove("sku_map") {
            Some(Value::Object(sku_map)) => Ok(sku_map),
            Some(other) => Err(DataLoadError::InvalidShape {
                path: path.to_path_buf(),
                message: format!("'sku_map' must be an object, found {}", type_name(&other)),
            }),
            None => Err(DataLoadError::InvalidShape {
                path: path.to_path_buf(),
                message: "missing 'sku_map' object".to_string(),
            }),
        },
        other => Err(DataLoadError::InvalidShape {
            path: path.to_path_buf(),
            message: format!("expected an object, found {}", type_name(&other)),
        }),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DataLoadError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            DataLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    debug!(path = %path.display(), bytes = content.len(), "Read data source");

    serde_json::from_str(&content).map_err(|source| DataLoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

pub fn build_location_map(locations: Vec<LocationMeta>) -> HashMap<String, LocationMeta> {
    locations
        .into_iter()
        .map(|location| (location.location_id.clone(), location))
        .collect()
}

/// Flatten `category -> sku -> meta` into `sku -> meta`
///
/// Categories are visited in document order; a SKU listed under several
/// categories keeps the last definition and yields a collision warning.
pub fn flatten_sku_map(
    sku_map: &Map<String, Value>,
    origin: &Path,
) -> Result<(HashMap<String, SkuMeta>, Vec<DataIssue>), DataLoadError> {
    let mut flat: HashMap<String, SkuMeta> = HashMap::new();
    let mut issues = Vec::new();

    for (category, skus) in sku_map {
        let skus = skus.as_object().ok_or_else(|| DataLoadError::InvalidShape {
            path: origin.to_path_buf(),
            message: format!("category '{category}' must map SKU codes to metadata"),
        })?;

        for (sku, meta) in skus {
            let mut meta: SkuMeta =
                serde_json::from_value(meta.clone()).map_err(|source| DataLoadError::Malformed {
                    path: origin.to_path_buf(),
                    source,
                })?;
            if meta.category.is_empty() {
                meta.category = category.clone();
            }

            if let Some(previous) = flat.insert(sku.clone(), meta) {
                let issue = DataIssue::SkuCollision {
                    sku: sku.clone(),
                    first_category: previous.category,
                    second_category: category.clone(),
                };
                warn!("{}", issue);
                issues.push(issue);
            }
        }
    }

    Ok((flat, issues))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
