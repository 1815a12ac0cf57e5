//! Route drafts received from external planning stages and their enriched form
//!
//! Drafts arrive as loosely-typed JSON. They are validated against a schema
//! derived from [`RawRouteDraft`] and then normalized into [`RouteDraft`]
//! before any lookup happens.

use jsonschema::Validator;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Fleet size buckets understood by the metrics collector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FleetType {
    Small,
    Medium,
    Large,
}

impl FleetType {
    /// Parse an exact bucket name; anything else is unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Small" => Some(FleetType::Small),
            "Medium" => Some(FleetType::Medium),
            "Large" => Some(FleetType::Large),
            _ => None,
        }
    }
}

/// A location reference in the `locations` form of a draft
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DraftLocation {
    pub location_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Route draft as produced upstream, before normalization
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RawRouteDraft {
    /// Geo cell the route was drafted from (`h3_index` is accepted too)
    #[serde(default, alias = "h3_index")]
    pub geo_cell: Option<String>,
    pub fleet_id: String,
    pub fleet_type: String,
    #[serde(default)]
    pub location_ids: Option<Vec<String>>,
    #[serde(default)]
    pub locations: Option<Vec<DraftLocation>>,
}

/// Normalized route draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteDraft {
    pub geo_cell: Option<String>,
    pub fleet_id: String,
    pub fleet_type: String,
    pub location_ids: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RouteDraftError {
    #[error("Route draft schema error: {0}")]
    SchemaError(String),
    #[error("Route draft validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid route draft: {0}")]
    Invalid(String),
    #[error("Route draft is not valid JSON for its shape: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl RawRouteDraft {
    /// JSON schema that incoming drafts are checked against
    pub fn json_schema() -> Result<Value, RouteDraftError> {
        let schema = schemars::schema_for!(RawRouteDraft);
        serde_json::to_value(schema).map_err(|e| RouteDraftError::SchemaError(e.to_string()))
    }

    /// Normalize into a [`RouteDraft`], checking internal consistency
    pub fn normalize(self) -> Result<RouteDraft, RouteDraftError> {
        if self.fleet_id.trim().is_empty() {
            return Err(RouteDraftError::Invalid("fleet_id must not be empty".to_string()));
        }

        let location_ids = match (self.location_ids, self.locations) {
            (Some(ids), _) => ids,
            (None, Some(locations)) => locations.into_iter().map(|l| l.location_id).collect(),
            (None, None) => {
                return Err(RouteDraftError::Invalid(format!(
                    "route for fleet '{}' has neither location_ids nor locations",
                    self.fleet_id
                )))
            }
        };

        Ok(RouteDraft {
            geo_cell: self.geo_cell,
            fleet_id: self.fleet_id,
            fleet_type: self.fleet_type,
            location_ids,
        })
    }
}

impl RouteDraft {
    /// Validate and normalize one draft from untyped JSON
    pub fn from_value(value: &Value) -> Result<Self, RouteDraftError> {
        let validator = compile_validator()?;
        Self::from_validated(&validator, value)
    }

    /// Validate and normalize a route set: `{"routes": [...]}` or a bare list
    pub fn parse_route_set(value: &Value) -> Result<Vec<Self>, RouteDraftError> {
        let routes = match value {
            Value::Array(routes) => routes,
            Value::Object(map) => match map.get("routes") {
                Some(Value::Array(routes)) => routes,
                _ => {
                    return Err(RouteDraftError::Invalid(
                        "route set must contain a 'routes' array".to_string(),
                    ))
                }
            },
            _ => {
                return Err(RouteDraftError::Invalid(
                    "route set must be an object or an array".to_string(),
                ))
            }
        };

        let validator = compile_validator()?;
        routes
            .iter()
            .map(|route| Self::from_validated(&validator, route))
            .collect()
    }

    fn from_validated(validator: &Validator, value: &Value) -> Result<Self, RouteDraftError> {
        validate_against(validator, value)?;
        let raw: RawRouteDraft = serde_json::from_value(value.clone())?;
        raw.normalize()
    }
}

fn compile_validator() -> Result<Validator, RouteDraftError> {
    let schema = RawRouteDraft::json_schema()?;
    jsonschema::validator_for(&schema)
        .map_err(|e| RouteDraftError::SchemaError(format!("Schema compilation error: {e}")))
}

fn validate_against(validator: &Validator, instance: &Value) -> Result<(), RouteDraftError> {
    validator.validate(instance).map_err(|errors| {
        let error_messages: Vec<String> = errors
            .map(|e| format!("At '{}': {}", e.instance_path, e))
            .collect();
        RouteDraftError::ValidationError(error_messages.join("; "))
    })
}

/// Per-location metrics on an enriched route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedLocation {
    pub location_id: String,
    /// First order at the location, null if it has no lines
    pub order_id: Option<String>,
    pub order_count: usize,
    pub total_weight: f64,
    pub total_volume: f64,
    pub est_delivery_time_hours: f64,
}

/// A route draft with physical metrics recomputed from the clustered artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRoute {
    pub geo_cell: Option<String>,
    pub fleet_id: String,
    pub fleet_type: String,
    pub total_weight: f64,
    pub total_volume: f64,
    /// Sum of per-location delivery estimates, in hours
    pub total_delivery_time: f64,
    pub locations: Vec<EnrichedLocation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fleet_type_parse() {
        assert_eq!(FleetType::parse("Small"), Some(FleetType::Small));
        assert_eq!(FleetType::parse("Large"), Some(FleetType::Large));
        assert_eq!(FleetType::parse("small"), None);
        assert_eq!(FleetType::parse("Drone"), None);
    }

    #[test]
    fn test_draft_with_location_ids() {
        let draft = RouteDraft::from_value(&json!({
            "geo_cell": "cell-a",
            "fleet_id": "F-1",
            "fleet_type": "Small",
            "location_ids": ["LOC1", "LOC2"]
        }))
        .unwrap();

        assert_eq!(draft.geo_cell.as_deref(), Some("cell-a"));
        assert_eq!(draft.location_ids, vec!["LOC1", "LOC2"]);
    }

    #[test]
    fn test_draft_with_locations_and_h3_index() {
        let draft = RouteDraft::from_value(&json!({
            "h3_index": "86618d4a7ffffff",
            "fleet_id": "F-2",
            "fleet_type": "Medium",
            "locations": [
                {"location_id": "LOC3", "order_id": "ORD9"},
                {"location_id": "LOC4"}
            ]
        }))
        .unwrap();

        assert_eq!(draft.geo_cell.as_deref(), Some("86618d4a7ffffff"));
        assert_eq!(draft.location_ids, vec!["LOC3", "LOC4"]);
    }

    #[test]
    fn test_draft_null_geo_cell_allowed() {
        let draft = RouteDraft::from_value(&json!({
            "geo_cell": null,
            "fleet_id": "F-3",
            "fleet_type": "Large",
            "location_ids": []
        }))
        .unwrap();

        assert!(draft.geo_cell.is_none());
        assert!(draft.location_ids.is_empty());
    }

    #[test]
    fn test_draft_missing_fleet_id_fails_schema() {
        let result = RouteDraft::from_value(&json!({
            "fleet_type": "Small",
            "location_ids": ["LOC1"]
        }));

        assert!(matches!(result, Err(RouteDraftError::ValidationError(_))));
    }

    #[test]
    fn test_draft_wrong_type_fails_schema() {
        let result = RouteDraft::from_value(&json!({
            "fleet_id": "F-1",
            "fleet_type": "Small",
            "location_ids": "LOC1"
        }));

        assert!(matches!(result, Err(RouteDraftError::ValidationError(_))));
    }

    #[test]
    fn test_draft_without_locations_is_invalid() {
        let result = RouteDraft::from_value(&json!({
            "fleet_id": "F-1",
            "fleet_type": "Small"
        }));

        assert!(matches!(result, Err(RouteDraftError::Invalid(_))));
    }

    #[test]
    fn test_route_set_shapes() {
        let wrapped = json!({"routes": [
            {"fleet_id": "F-1", "fleet_type": "Small", "location_ids": ["A"]},
            {"fleet_id": "F-2", "fleet_type": "Large", "location_ids": ["B"]}
        ]});
        assert_eq!(RouteDraft::parse_route_set(&wrapped).unwrap().len(), 2);

        let bare = json!([{"fleet_id": "F-1", "fleet_type": "Small", "location_ids": []}]);
        assert_eq!(RouteDraft::parse_route_set(&bare).unwrap().len(), 1);

        assert!(RouteDraft::parse_route_set(&json!({"paths": []})).is_err());
        assert!(RouteDraft::parse_route_set(&json!("routes")).is_err());
    }

    #[test]
    fn test_route_set_validates_every_entry_with_one_validator() {
        let validator = compile_validator().unwrap();
        let drafts: Vec<Value> = (0..20)
            .map(|i| json!({"fleet_id": format!("F-{i}"), "fleet_type": "Small", "location_ids": ["LOC1"]}))
            .collect();

        for draft in &drafts {
            assert!(RouteDraft::from_validated(&validator, draft).is_ok());
        }
        assert_eq!(RouteDraft::parse_route_set(&json!(drafts)).unwrap().len(), 20);

        // A bad entry late in the set still fails the whole set
        let mut with_bad = drafts.clone();
        with_bad.push(json!({"fleet_id": "F-x", "fleet_type": "Small", "location_ids": [7]}));
        assert!(matches!(
            RouteDraft::parse_route_set(&json!({"routes": with_bad})),
            Err(RouteDraftError::ValidationError(_))
        ));
    }

    #[test]
    fn test_schema_generation() {
        let schema = RawRouteDraft::json_schema().unwrap();

        assert!(schema.is_object());
        assert!(schema["properties"]["fleet_id"].is_object());
        assert!(schema["properties"]["location_ids"].is_object());
    }
}
