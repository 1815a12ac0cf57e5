//! Route enrichment
//!
//! Re-derives physical metrics for an externally drafted route from the
//! clustered artifact. Location totals are recomputed from their order lines
//! every time; cached totals on the aggregate are never trusted.

use crate::issues::{DataIssue, LookupKind};
use crate::model::{ClusteredOrders, EnrichedLocation, EnrichedRoute, LocationAggregate, RouteDraft};
use crate::policy::DeliveryTimePolicy;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One enriched route and the lookup misses encountered building it
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentOutcome {
    pub route: EnrichedRoute,
    pub issues: Vec<DataIssue>,
}

impl EnrichmentOutcome {
    /// Location ids that were skipped because the artifact does not know them
    pub fn missing_locations(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                DataIssue::LookupMiss {
                    lookup: LookupKind::RouteLocation,
                    key,
                    ..
                } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Enriches drafts against one clustered artifact
pub struct RouteEnricher<'a> {
    by_location: HashMap<&'a str, &'a LocationAggregate>,
    policy: &'a DeliveryTimePolicy,
}

impl<'a> RouteEnricher<'a> {
    pub fn new(clustered: &'a ClusteredOrders, policy: &'a DeliveryTimePolicy) -> Self {
        let by_location = clustered
            .locations()
            .map(|location| (location.location_id.as_str(), location))
            .collect();

        Self {
            by_location,
            policy,
        }
    }

    /// Number of locations available for lookup
    pub fn known_locations(&self) -> usize {
        self.by_location.len()
    }

    pub fn enrich(&self, draft: &RouteDraft) -> EnrichmentOutcome {
        let mut locations = Vec::with_capacity(draft.location_ids.len());
        let mut issues = Vec::new();

        for location_id in &draft.location_ids {
            match self.by_location.get(location_id.as_str()) {
                Some(aggregate) => locations.push(self.enrich_location(aggregate)),
                None => {
                    let issue = DataIssue::lookup_miss(
                        LookupKind::RouteLocation,
                        location_id,
                        format!("route {}", draft.fleet_id),
                    );
                    warn!("{}", issue);
                    issues.push(issue);
                }
            }
        }

        let route = EnrichedRoute {
            geo_cell: draft.geo_cell.clone(),
            fleet_id: draft.fleet_id.clone(),
            fleet_type: draft.fleet_type.clone(),
            total_weight: locations.iter().map(|l| l.total_weight).sum(),
            total_volume: locations.iter().map(|l| l.total_volume).sum(),
            total_delivery_time: locations.iter().map(|l| l.est_delivery_time_hours).sum(),
            locations,
        };

        debug!(
            fleet_id = %route.fleet_id,
            locations = route.locations.len(),
            missing = issues.len(),
            total_weight = route.total_weight,
            "Route enriched"
        );

        EnrichmentOutcome { route, issues }
    }

    pub fn enrich_all(&self, drafts: &[RouteDraft]) -> Vec<EnrichmentOutcome> {
        drafts.iter().map(|draft| self.enrich(draft)).collect()
    }

    fn enrich_location(&self, aggregate: &LocationAggregate) -> EnrichedLocation {
        let total_weight = aggregate.line_weight_sum();

        EnrichedLocation {
            location_id: aggregate.location_id.clone(),
            order_id: aggregate.representative_order_id().map(str::to_string),
            order_count: aggregate.orders.len(),
            total_weight,
            total_volume: aggregate.line_volume_sum(),
            est_delivery_time_hours: self.policy.estimate_hours(total_weight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoClusteredGroup;
    use crate::testing::order_line;

    fn artifact(policy: &DeliveryTimePolicy) -> ClusteredOrders {
        ClusteredOrders {
            priority_orders: vec![],
            geo_clusters: vec![GeoClusteredGroup {
                geo_cell: "cell-a".to_string(),
                locations: vec![
                    LocationAggregate::new(
                        "LOC1".to_string(),
                        None,
                        vec![
                            order_line("ORD1", "SKU1", 2, 5.0),
                            order_line("ORD2", "SKU2", 1, 40.0),
                        ],
                        policy,
                    ),
                    LocationAggregate::new(
                        "LOC2".to_string(),
                        None,
                        vec![order_line("ORD3", "SKU1", 4, 25.0)],
                        policy,
                    ),
                ],
            }],
            unplaced_locations: vec![],
        }
    }

    fn draft(location_ids: &[&str]) -> RouteDraft {
        RouteDraft {
            geo_cell: Some("cell-a".to_string()),
            fleet_id: "F-1".to_string(),
            fleet_type: "Small".to_string(),
            location_ids: location_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_enrich_recomputes_from_lines() {
        let policy = DeliveryTimePolicy::default();
        let clustered = artifact(&policy);
        let enricher = RouteEnricher::new(&clustered, &policy);

        let outcome = enricher.enrich(&draft(&["LOC1", "LOC2"]));
        let route = &outcome.route;

        assert!(outcome.issues.is_empty());
        assert_eq!(route.locations.len(), 2);
        assert_eq!(route.locations[0].order_id.as_deref(), Some("ORD1"));
        assert_eq!(route.locations[0].order_count, 2);
        assert!((route.locations[0].total_weight - 50.0).abs() < 1e-9);
        assert_eq!(route.locations[0].est_delivery_time_hours, 0.25);
        assert!((route.total_weight - 150.0).abs() < 1e-9);
        assert!((route.total_delivery_time - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_stale_cached_totals_are_ignored() {
        let policy = DeliveryTimePolicy::default();
        let mut clustered = artifact(&policy);
        clustered.geo_clusters[0].locations[0].total_weight = 9999.0;

        let enricher = RouteEnricher::new(&clustered, &policy);
        let outcome = enricher.enrich(&draft(&["LOC1"]));

        assert!((outcome.route.total_weight - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_location_is_skipped_and_reported() {
        let policy = DeliveryTimePolicy::default();
        let clustered = artifact(&policy);
        let enricher = RouteEnricher::new(&clustered, &policy);

        let with_ghost = enricher.enrich(&draft(&["LOC1", "GHOST"]));
        let without = enricher.enrich(&draft(&["LOC1"]));

        assert_eq!(with_ghost.route.locations.len(), 1);
        assert_eq!(with_ghost.route.total_weight, without.route.total_weight);
        assert_eq!(with_ghost.missing_locations(), vec!["GHOST"]);
    }

    #[test]
    fn test_empty_location_has_null_order_id() {
        let policy = DeliveryTimePolicy::default();
        let mut clustered = artifact(&policy);
        clustered.geo_clusters[0].locations[1].orders.clear();

        let enricher = RouteEnricher::new(&clustered, &policy);
        let outcome = enricher.enrich(&draft(&["LOC2"]));

        assert!(outcome.route.locations[0].order_id.is_none());
        assert_eq!(outcome.route.locations[0].order_count, 0);
        assert_eq!(outcome.route.total_weight, 0.0);
    }

    #[test]
    fn test_drafts_are_independent() {
        let policy = DeliveryTimePolicy::default();
        let clustered = artifact(&policy);
        let enricher = RouteEnricher::new(&clustered, &policy);

        let outcomes = enricher.enrich_all(&[draft(&["LOC1"]), draft(&["LOC1"])]);
        assert_eq!(outcomes[0].route, outcomes[1].route);
        assert_eq!(enricher.known_locations(), 2);
    }
}
