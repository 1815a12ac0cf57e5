//! Non-fatal data-quality issues
//!
//! Lookup misses and unplaced locations degrade records instead of failing a
//! run. They are collected as values so callers can log them, count them, or
//! (in strict mode) refuse the result.

use crate::model::UnplacedReason;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which lookup a miss happened against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    /// SKU referenced by an order package
    Sku,
    /// Location referenced by an order
    Location,
    /// Location referenced by a route draft but absent from the clustered artifact
    RouteLocation,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Sku => write!(f, "SKU"),
            LookupKind::Location => write!(f, "location"),
            LookupKind::RouteLocation => write!(f, "route location"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIssue {
    #[error("Lookup miss: unknown {lookup} '{key}' referenced by {referenced_by}")]
    LookupMiss {
        lookup: LookupKind,
        key: String,
        referenced_by: String,
    },

    #[error("Unplaced location '{location_id}': {reason}")]
    UnplacedLocation {
        location_id: String,
        reason: UnplacedReason,
    },

    #[error("SKU '{sku}' defined in both '{first_category}' and '{second_category}', keeping the latter")]
    SkuCollision {
        sku: String,
        first_category: String,
        second_category: String,
    },
}

impl DataIssue {
    pub fn lookup_miss<K: Into<String>, R: Into<String>>(
        lookup: LookupKind,
        key: K,
        referenced_by: R,
    ) -> Self {
        Self::LookupMiss {
            lookup,
            key: key.into(),
            referenced_by: referenced_by.into(),
        }
    }

    /// Whether the issue means data was dropped or degraded
    ///
    /// Strict mode refuses results containing any such issue. SKU collisions
    /// are resolved deterministically and only ever warn.
    pub fn is_data_loss(&self) -> bool {
        !matches!(self, DataIssue::SkuCollision { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_messages() {
        let miss = DataIssue::lookup_miss(LookupKind::Sku, "SKU9", "order ORD1");
        assert_eq!(
            miss.to_string(),
            "Lookup miss: unknown SKU 'SKU9' referenced by order ORD1"
        );

        let unplaced = DataIssue::UnplacedLocation {
            location_id: "LOC7".to_string(),
            reason: UnplacedReason::MissingLocationMeta,
        };
        assert_eq!(
            unplaced.to_string(),
            "Unplaced location 'LOC7': no location metadata"
        );
    }

    #[test]
    fn test_data_loss_classification() {
        assert!(DataIssue::lookup_miss(LookupKind::RouteLocation, "L", "F-1").is_data_loss());
        assert!(!DataIssue::SkuCollision {
            sku: "S".to_string(),
            first_category: "a".to_string(),
            second_category: "b".to_string(),
        }
        .is_data_loss());
    }

    #[test]
    fn test_issue_serialization_is_tagged() {
        let miss = DataIssue::lookup_miss(LookupKind::Location, "LOC1", "order ORD1");
        let value = serde_json::to_value(&miss).unwrap();

        assert_eq!(value["kind"], "lookup_miss");
        assert_eq!(value["lookup"], "location");
        assert_eq!(value["key"], "LOC1");
    }
}
