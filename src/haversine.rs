//! Haversine distance matrix provider.
//!
//! Great-circle distances in kilometers. Nodes without a resolved coordinate
//! get 0.0 on every edge, so an all-zero row means "missing data", not
//! "adjacent".

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::Coordinate;
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat().to_radians();
    let lat2_rad = to.lat().to_radians();
    let delta_lat = (to.lat() - from.lat()).to_radians();
    let delta_lng = (to.lon() - from.lon()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Square matrix of non-negative kilometer distances with a zero diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    rows: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Wraps precomputed rows. Rows are not checked for squareness here;
    /// the solver rejects ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Distance from `from` to `to`, or 0.0 when either index is out of range.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.rows
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0.0)
    }

    /// Integer meters (km x 1000, truncated) for integral-cost optimization.
    pub fn to_meters(&self) -> Vec<Vec<i64>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|km| (km * 1000.0) as i64).collect())
            .collect()
    }
}

/// Haversine-based distance matrix provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, coords: &[Option<Coordinate>]) -> DistanceMatrix {
        let n = coords.len();

        let unresolved: Vec<usize> = coords
            .iter()
            .enumerate()
            .filter_map(|(i, coord)| coord.is_none().then_some(i))
            .collect();
        if !unresolved.is_empty() {
            warn!(indices = ?unresolved, "distance matrix has unresolved coordinates");
        }

        // Each pair is evaluated in (low, high) index order so the matrix is
        // exactly symmetric.
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| match (coords[i.min(j)], coords[i.max(j)]) {
                        (Some(a), Some(b)) if i != j => haversine_km(a, b),
                        _ => 0.0,
                    })
                    .collect()
            })
            .collect();

        let matrix = DistanceMatrix::from_rows(rows);
        debug!(size = n, rows = ?matrix.rows(), "distance matrix built");
        matrix
    }
}
