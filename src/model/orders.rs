//! Raw delivery orders as read from the orders source

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A raw order. Source of truth for the whole run; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawOrder {
    #[serde(alias = "id")]
    pub order_id: String,
    pub location_id: String,
    #[serde(default)]
    pub priority: Option<PriorityFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub packages: Vec<Package>,
}

/// Priority marker on an order
///
/// Sources flag priority either as a level string (`"high"`) or a boolean.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PriorityFlag {
    Flag(bool),
    Level(String),
}

impl PriorityFlag {
    /// Whether this flag matches the configured high-priority sentinel
    pub fn is_high(&self, sentinel: &str) -> bool {
        match self {
            PriorityFlag::Flag(flag) => *flag,
            PriorityFlag::Level(level) => level.trim().eq_ignore_ascii_case(sentinel),
        }
    }

    /// Textual level carried onto priority order lines
    pub fn level(&self, sentinel: &str) -> String {
        match self {
            PriorityFlag::Flag(true) => sentinel.to_string(),
            PriorityFlag::Flag(false) => "normal".to_string(),
            PriorityFlag::Level(level) => level.clone(),
        }
    }
}

/// One package line of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Package {
    pub sku: String,
    pub quantity: u32,
    /// Unit weight; treated as 0 kg when absent
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions_m: Option<Dimensions>,
}

impl Package {
    /// Line weight: unit weight times quantity
    pub fn line_weight(&self) -> f64 {
        self.weight_kg * f64::from(self.quantity)
    }

    /// Line volume in cubic meters, 0.0 when any dimension is missing
    pub fn line_volume(&self) -> f64 {
        self.dimensions_m
            .as_ref()
            .and_then(Dimensions::unit_volume)
            .map(|unit| unit * f64::from(self.quantity))
            .unwrap_or(0.0)
    }
}

/// Package dimensions in meters; non-numeric values count as missing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dimensions {
    #[serde(default, deserialize_with = "lenient_number")]
    pub l: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub w: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub h: Option<f64>,
}

impl Dimensions {
    pub fn new(l: f64, w: f64, h: f64) -> Self {
        Self {
            l: Some(l),
            w: Some(w),
            h: Some(h),
        }
    }

    /// l × w × h when all three are present
    pub fn unit_volume(&self) -> Option<f64> {
        match (self.l, self.w, self.h) {
            (Some(l), Some(w), Some(h)) => Some(l * w * h),
            _ => None,
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// Orders source, either `{"orders": [...]}` or a bare list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrdersFile {
    Wrapped { orders: Vec<RawOrder> },
    Bare(Vec<RawOrder>),
}

impl OrdersFile {
    pub fn into_orders(self) -> Vec<RawOrder> {
        match self {
            OrdersFile::Wrapped { orders } => orders,
            OrdersFile::Bare(orders) => orders,
        }
    }
}
