//! Geo-clustering of delivery locations

pub mod clustering;
pub mod indexer;

pub use clustering::{ClusteringOutcome, GeoClusterer};
pub use indexer::{check_coordinates, CellIndexer, GeoIndexError, H3CellIndexer};
