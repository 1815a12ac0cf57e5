//! Coordinate to cell indexing
//!
//! The clustering engine only needs a deterministic `(lat, lng) -> cell id`
//! function. [`CellIndexer`] is that seam; [`H3CellIndexer`] is the production
//! implementation backed by the H3 hierarchical grid.

use crate::model::GeoCell;
use h3o::{LatLng, Resolution};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoIndexError {
    #[error("Invalid coordinates ({latitude}, {longitude}): {reason}")]
    InvalidCoordinates {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    #[error("Invalid cell resolution {0}: must be between 0 and 15")]
    InvalidResolution(u8),
}

/// Maps a coordinate to the cell containing it
///
/// Implementations must be deterministic: the same coordinate always yields
/// the same cell id.
pub trait CellIndexer: Send + Sync {
    fn cell_for(&self, latitude: f64, longitude: f64) -> Result<GeoCell, GeoIndexError>;

    /// Human-readable description used in logs
    fn describe(&self) -> String;
}

/// H3 cell indexer at a fixed resolution
#[derive(Debug, Clone, Copy)]
pub struct H3CellIndexer {
    resolution: Resolution,
}

impl H3CellIndexer {
    pub fn new(resolution: u8) -> Result<Self, GeoIndexError> {
        let resolution =
            Resolution::try_from(resolution).map_err(|_| GeoIndexError::InvalidResolution(resolution))?;
        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> u8 {
        u8::from(self.resolution)
    }
}

impl CellIndexer for H3CellIndexer {
    fn cell_for(&self, latitude: f64, longitude: f64) -> Result<GeoCell, GeoIndexError> {
        check_coordinates(latitude, longitude)?;

        let point = LatLng::new(latitude, longitude).map_err(|e| {
            GeoIndexError::InvalidCoordinates {
                latitude,
                longitude,
                reason: e.to_string(),
            }
        })?;

        Ok(point.to_cell(self.resolution).to_string())
    }

    fn describe(&self) -> String {
        format!("h3 resolution {}", self.resolution())
    }
}

/// Reject non-finite or out-of-range degrees before they reach the grid
pub fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), GeoIndexError> {
    let reason = if !latitude.is_finite() || !longitude.is_finite() {
        Some("coordinates must be finite")
    } else if !(-90.0..=90.0).contains(&latitude) {
        Some("latitude out of range")
    } else if !(-180.0..=180.0).contains(&longitude) {
        Some("longitude out of range")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(GeoIndexError::InvalidCoordinates {
            latitude,
            longitude,
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_bounds() {
        assert!(H3CellIndexer::new(0).is_ok());
        assert!(H3CellIndexer::new(15).is_ok());
        assert_eq!(
            H3CellIndexer::new(16).unwrap_err(),
            GeoIndexError::InvalidResolution(16)
        );
    }

    #[test]
    fn test_cell_is_deterministic() {
        let indexer = H3CellIndexer::new(6).unwrap();
        let first = indexer.cell_for(12.9716, 77.5946).unwrap();
        let second = indexer.cell_for(12.9716, 77.5946).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 15);
    }

    #[test]
    fn test_distant_points_get_distinct_cells() {
        let indexer = H3CellIndexer::new(6).unwrap();
        let bangalore = indexer.cell_for(12.9716, 77.5946).unwrap();
        let chennai = indexer.cell_for(13.0827, 80.2707).unwrap();

        assert_ne!(bangalore, chennai);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let indexer = H3CellIndexer::new(6).unwrap();

        assert!(indexer.cell_for(f64::NAN, 0.0).is_err());
        assert!(indexer.cell_for(0.0, f64::INFINITY).is_err());
        assert!(indexer.cell_for(91.0, 0.0).is_err());
        assert!(indexer.cell_for(0.0, -181.0).is_err());
    }

    #[test]
    fn test_describe() {
        let indexer = H3CellIndexer::new(9).unwrap();
        assert_eq!(indexer.resolution(), 9);
        assert_eq!(indexer.describe(), "h3 resolution 9");
    }
}
