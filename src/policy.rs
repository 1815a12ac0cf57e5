//! Delivery time estimation policy
//!
//! A fixed throughput model: `kg_per_unit` kilograms are handled per
//! `minutes_per_unit` minutes. The estimate is reported in hours, rounded to
//! `decimals` places. Both aggregation and route enrichment go through this
//! type so the formula lives in one place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryTimePolicy {
    #[serde(default = "default_kg_per_unit")]
    pub kg_per_unit: f64,
    #[serde(default = "default_minutes_per_unit")]
    pub minutes_per_unit: f64,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_kg_per_unit() -> f64 {
    50.0
}

fn default_minutes_per_unit() -> f64 {
    15.0
}

fn default_decimals() -> u32 {
    2
}

impl Default for DeliveryTimePolicy {
    fn default() -> Self {
        Self {
            kg_per_unit: default_kg_per_unit(),
            minutes_per_unit: default_minutes_per_unit(),
            decimals: default_decimals(),
        }
    }
}

impl DeliveryTimePolicy {
    /// Estimated handling time in hours for `weight_kg`
    pub fn estimate_hours(&self, weight_kg: f64) -> f64 {
        let minutes = (weight_kg / self.kg_per_unit) * self.minutes_per_unit;
        round_to(minutes / 60.0, self.decimals)
    }

    /// Check the policy describes a usable throughput
    pub fn validate(&self) -> Result<(), String> {
        if !self.kg_per_unit.is_finite() || self.kg_per_unit <= 0.0 {
            return Err(format!(
                "kg_per_unit must be a positive number, got {}",
                self.kg_per_unit
            ));
        }
        if !self.minutes_per_unit.is_finite() || self.minutes_per_unit < 0.0 {
            return Err(format!(
                "minutes_per_unit must be a non-negative number, got {}",
                self.minutes_per_unit
            ));
        }
        if self.decimals > 10 {
            return Err(format!("decimals must be at most 10, got {}", self.decimals));
        }
        Ok(())
    }
}

/// Round to `decimals` places, correctly rounded from the exact binary value
///
/// Ties go to even, and a value whose decimal form sits just below a tie
/// rounds down (0.125 -> 0.12, 9 kg's 0.04499.. h -> 0.04).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}
