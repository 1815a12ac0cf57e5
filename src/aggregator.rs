//! Order aggregation
//!
//! Joins raw orders against the reference lookups and rolls package lines up
//! per delivery location. Unknown SKUs and locations degrade the record
//! (null metadata) and are reported as [`DataIssue`]s; they never abort.

use crate::issues::{DataIssue, LookupKind};
use crate::loader::ReferenceData;
use crate::model::{
    ClusteredOrderLine, InventoryIssue, LocationAggregate, Package, PriorityOrder,
    ProductSummary, RawOrder,
};
use crate::policy::DeliveryTimePolicy;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Everything produced by one aggregation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationOutput {
    /// One aggregate per distinct location, in first-seen order
    pub locations: Vec<LocationAggregate>,
    pub priority_orders: Vec<PriorityOrder>,
    pub product_summary: Vec<ProductSummary>,
    pub inventory_issues: Vec<InventoryIssue>,
    pub issues: Vec<DataIssue>,
    pub orders_seen: usize,
    /// Orders without packages
    pub skipped_orders: usize,
    pub lines: usize,
}

impl AggregationOutput {
    pub fn count_lookup_misses(&self, kind: LookupKind) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, DataIssue::LookupMiss { lookup, .. } if *lookup == kind))
            .count()
    }
}

pub struct OrderAggregator<'a> {
    reference: &'a ReferenceData,
    policy: &'a DeliveryTimePolicy,
    high_priority: &'a str,
}

impl<'a> OrderAggregator<'a> {
    pub fn new(
        reference: &'a ReferenceData,
        policy: &'a DeliveryTimePolicy,
        high_priority: &'a str,
    ) -> Self {
        Self {
            reference,
            policy,
            high_priority,
        }
    }

    pub fn aggregate(&self, orders: &[RawOrder]) -> AggregationOutput {
        let mut output = AggregationOutput {
            orders_seen: orders.len(),
            ..Default::default()
        };

        let mut lines_by_location: Vec<(String, Vec<ClusteredOrderLine>)> = Vec::new();
        let mut location_index: HashMap<&str, usize> = HashMap::new();
        let mut quantities: Vec<(String, u64)> = Vec::new();
        let mut quantity_index: HashMap<&str, usize> = HashMap::new();

        for order in orders {
            if order.packages.is_empty() {
                debug!(order_id = %order.order_id, "Skipping order without packages");
                output.skipped_orders += 1;
                continue;
            }

            let is_priority = order
                .priority
                .as_ref()
                .is_some_and(|flag| flag.is_high(self.high_priority));

            let slot = *location_index
                .entry(order.location_id.as_str())
                .or_insert_with(|| {
                    lines_by_location.push((order.location_id.clone(), Vec::new()));
                    lines_by_location.len() - 1
                });

            for package in &order.packages {
                let line = self.line_for(order, package, &mut output.issues);

                if is_priority {
                    output.priority_orders.push(PriorityOrder {
                        order_id: order.order_id.clone(),
                        location_id: order.location_id.clone(),
                        priority: order
                            .priority
                            .as_ref()
                            .map(|flag| flag.level(self.high_priority))
                            .unwrap_or_default(),
                        product: package.sku.clone(),
                        quantity: package.quantity,
                        metadata: line.metadata.clone(),
                    });
                }

                let q = *quantity_index.entry(package.sku.as_str()).or_insert_with(|| {
                    quantities.push((package.sku.clone(), 0));
                    quantities.len() - 1
                });
                quantities[q].1 += u64::from(package.quantity);

                lines_by_location[slot].1.push(line);
                output.lines += 1;
            }
        }

        for (location_id, lines) in lines_by_location {
            let location = self.reference.location(&location_id).cloned();
            if location.is_none() {
                let referenced_by = lines
                    .first()
                    .map(|line| format!("order {}", line.order_id))
                    .unwrap_or_default();
                let issue = DataIssue::lookup_miss(LookupKind::Location, &location_id, referenced_by);
                warn!("{}", issue);
                output.issues.push(issue);
            }
            output
                .locations
                .push(LocationAggregate::new(location_id, location, lines, self.policy));
        }

        for (sku, total_quantity) in quantities {
            let available = self.reference.available_quantity(&sku);
            if total_quantity as i64 > available {
                output.inventory_issues.push(InventoryIssue {
                    sku: sku.clone(),
                    ordered_quantity: total_quantity,
                    available_quantity: available,
                    shortfall: total_quantity as i64 - available,
                });
            }
            output.product_summary.push(ProductSummary {
                metadata: self.reference.sku(&sku).cloned(),
                product: sku,
                total_quantity,
            });
        }

        output
    }

    fn line_for(
        &self,
        order: &RawOrder,
        package: &Package,
        issues: &mut Vec<DataIssue>,
    ) -> ClusteredOrderLine {
        let metadata = self.reference.sku(&package.sku).cloned();
        if metadata.is_none() {
            let issue = DataIssue::lookup_miss(
                LookupKind::Sku,
                &package.sku,
                format!("order {}", order.order_id),
            );
            warn!("{}", issue);
            issues.push(issue);
        }

        ClusteredOrderLine {
            geo_cell: None,
            order_id: order.order_id.clone(),
            weight: package.line_weight(),
            volume: package.line_volume(),
            product: package.sku.clone(),
            quantity: package.quantity,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimensions, PriorityFlag};
    use crate::testing::{package, raw_order, reference_data};

    fn aggregate(orders: &[RawOrder]) -> AggregationOutput {
        let reference = reference_data();
        let policy = DeliveryTimePolicy::default();
        OrderAggregator::new(&reference, &policy, "high").aggregate(orders)
    }

    #[test]
    fn test_single_priority_order() {
        let order = raw_order(
            "ORD1",
            "LOC1",
            Some(PriorityFlag::Flag(true)),
            vec![package("SKU1", 2, 5.0, Some(Dimensions::new(1.0, 1.0, 1.0)))],
        );

        let output = aggregate(&[order]);

        assert_eq!(output.locations.len(), 1);
        let location = &output.locations[0];
        assert_eq!(location.total_weight, 10.0);
        assert_eq!(location.total_volume, 2.0);
        assert_eq!(location.est_delivery_time_hours, 0.05);
        assert!(location.location.is_some());

        assert_eq!(output.priority_orders.len(), 1);
        assert_eq!(output.priority_orders[0].quantity, 2);
        assert_eq!(output.priority_orders[0].priority, "high");
        assert!(output.issues.is_empty());
    }

    #[test]
    fn test_priority_lines_are_not_deduplicated() {
        let order = raw_order(
            "ORD1",
            "LOC1",
            Some(PriorityFlag::Level("HIGH".to_string())),
            vec![package("SKU1", 1, 1.0, None), package("SKU2", 1, 1.0, None)],
        );

        let output = aggregate(&[order]);
        assert_eq!(output.priority_orders.len(), 2);
        assert_eq!(output.priority_orders[1].product, "SKU2");
    }

    #[test]
    fn test_non_priority_and_empty_orders() {
        let orders = vec![
            raw_order(
                "ORD1",
                "LOC1",
                Some(PriorityFlag::Level("low".to_string())),
                vec![package("SKU1", 1, 1.0, None)],
            ),
            raw_order("ORD2", "LOC2", Some(PriorityFlag::Flag(true)), vec![]),
        ];

        let output = aggregate(&orders);

        assert!(output.priority_orders.is_empty());
        assert_eq!(output.skipped_orders, 1);
        assert_eq!(output.orders_seen, 2);
        // The empty order's location never appears
        assert_eq!(output.locations.len(), 1);
    }

    #[test]
    fn test_locations_keep_first_seen_order() {
        let orders = vec![
            raw_order("A", "LOC2", None, vec![package("SKU1", 1, 1.0, None)]),
            raw_order("B", "LOC1", None, vec![package("SKU1", 1, 2.0, None)]),
            raw_order("C", "LOC2", None, vec![package("SKU2", 2, 3.0, None)]),
        ];

        let output = aggregate(&orders);
        let ids: Vec<&str> = output.locations.iter().map(|l| l.location_id.as_str()).collect();

        assert_eq!(ids, vec!["LOC2", "LOC1"]);
        assert_eq!(output.locations[0].orders.len(), 2);
        assert_eq!(output.locations[0].total_weight, 7.0);
        assert_eq!(output.lines, 3);
    }

    #[test]
    fn test_unknown_sku_degrades_to_null_metadata() {
        let order = raw_order("ORD1", "LOC1", None, vec![package("NOPE", 1, 1.0, None)]);

        let output = aggregate(&[order]);

        assert!(output.locations[0].orders[0].metadata.is_none());
        assert_eq!(output.count_lookup_misses(LookupKind::Sku), 1);
    }

    #[test]
    fn test_unknown_location_is_kept_with_null_meta() {
        let order = raw_order("ORD1", "NOWHERE", None, vec![package("SKU1", 1, 4.0, None)]);

        let output = aggregate(&[order]);

        assert_eq!(output.locations.len(), 1);
        assert!(output.locations[0].location.is_none());
        assert_eq!(output.locations[0].total_weight, 4.0);
        assert_eq!(output.count_lookup_misses(LookupKind::Location), 1);
    }

    #[test]
    fn test_product_summary_and_inventory_shortfall() {
        // Fixture inventory holds 10 of SKU1 and 1 of SKU2
        let orders = vec![
            raw_order("A", "LOC1", None, vec![package("SKU1", 4, 1.0, None)]),
            raw_order("B", "LOC2", None, vec![package("SKU2", 3, 1.0, None)]),
            raw_order("C", "LOC1", None, vec![package("SKU1", 5, 1.0, None)]),
        ];

        let output = aggregate(&orders);

        assert_eq!(output.product_summary.len(), 2);
        assert_eq!(output.product_summary[0].product, "SKU1");
        assert_eq!(output.product_summary[0].total_quantity, 9);
        assert!(output.product_summary[0].metadata.is_some());

        assert_eq!(output.inventory_issues.len(), 1);
        let issue = &output.inventory_issues[0];
        assert_eq!(issue.sku, "SKU2");
        assert_eq!(issue.ordered_quantity, 3);
        assert_eq!(issue.available_quantity, 1);
        assert_eq!(issue.shortfall, 2);
    }
}
