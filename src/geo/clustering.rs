//! Grouping of location aggregates by geo cell

use crate::geo::indexer::CellIndexer;
use crate::issues::DataIssue;
use crate::model::{
    ClusteredOrders, GeoCell, GeoClusteredGroup, LocationAggregate, PriorityOrder,
    UnplacedLocation, UnplacedReason,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Result of clustering: the canonical artifact plus any issues raised
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusteringOutcome {
    pub clustered: ClusteredOrders,
    pub issues: Vec<DataIssue>,
}

pub struct GeoClusterer<'a> {
    indexer: &'a dyn CellIndexer,
}

impl<'a> GeoClusterer<'a> {
    pub fn new(indexer: &'a dyn CellIndexer) -> Self {
        Self { indexer }
    }

    /// Assign every location to a cell and group them
    ///
    /// Cells appear in the order their first location was seen and locations
    /// keep their input order inside a cell. Locations that cannot be placed
    /// are moved to `unplaced_locations` with a reason.
    pub fn cluster(
        &self,
        locations: Vec<LocationAggregate>,
        priority_orders: Vec<PriorityOrder>,
    ) -> ClusteringOutcome {
        let mut groups: Vec<GeoClusteredGroup> = Vec::new();
        let mut group_index: HashMap<GeoCell, usize> = HashMap::new();
        let mut unplaced = Vec::new();
        let mut issues = Vec::new();

        for mut aggregate in locations {
            let cell = match &aggregate.location {
                None => Err((UnplacedReason::MissingLocationMeta, None)),
                Some(meta) => self
                    .indexer
                    .cell_for(meta.latitude, meta.longitude)
                    .map_err(|e| (UnplacedReason::InvalidCoordinates, Some(e.to_string()))),
            };

            match cell {
                Ok(cell) => {
                    for line in &mut aggregate.orders {
                        line.geo_cell = Some(cell.clone());
                    }

                    let index = *group_index.entry(cell.clone()).or_insert_with(|| {
                        groups.push(GeoClusteredGroup {
                            geo_cell: cell.clone(),
                            locations: Vec::new(),
                        });
                        groups.len() - 1
                    });
                    groups[index].locations.push(aggregate);
                }
                Err((reason, detail)) => {
                    let issue = DataIssue::UnplacedLocation {
                        location_id: aggregate.location_id.clone(),
                        reason,
                    };
                    warn!(detail = detail.as_deref().unwrap_or(""), "{}", issue);
                    issues.push(issue);
                    unplaced.push(UnplacedLocation {
                        reason,
                        detail,
                        location: aggregate,
                    });
                }
            }
        }

        debug!(
            indexer = %self.indexer.describe(),
            cells = groups.len(),
            unplaced = unplaced.len(),
            "Locations grouped by geo cell"
        );

        ClusteringOutcome {
            clustered: ClusteredOrders {
                priority_orders,
                geo_clusters: groups,
                unplaced_locations: unplaced,
            },
            issues,
        }
    }
}
