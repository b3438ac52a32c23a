//! Closest-point correspondences against a fixed reference cloud

use rayon::prelude::*;
use sparseicp_core::{Error, NearestNeighborSearch, Point3d, Result};

/// Nearest reference point for every query point
///
/// All three vectors are index-aligned with the query cloud. Several query
/// points may share the same match.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondences {
    /// Matched reference points, copied from the reference cloud
    pub points: Vec<Point3d>,
    /// Position of each match in the reference cloud
    pub indices: Vec<usize>,
    pub distances_squared: Vec<f64>,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean of the squared query-to-match distances, zero when empty
    pub fn mean_squared_distance(&self) -> f64 {
        if self.distances_squared.is_empty() {
            return 0.0;
        }
        self.distances_squared.iter().sum::<f64>() / self.distances_squared.len() as f64
    }
}

/// Find the closest point in `reference` for each point in `query`
///
/// `index` must have been built over `reference`.
pub fn find_correspondences<S: NearestNeighborSearch>(
    index: &S,
    reference: &[Point3d],
    query: &[Point3d],
) -> Result<Correspondences> {
    if index.len() != reference.len() {
        return Err(Error::InvalidData(format!(
            "Index holds {} points but the reference cloud has {}",
            index.len(),
            reference.len()
        )));
    }

    let matches = query
        .par_iter()
        .map(|point| index.find_nearest(point))
        .collect::<Result<Vec<_>>>()?;

    let mut correspondences = Correspondences {
        points: Vec::with_capacity(matches.len()),
        indices: Vec::with_capacity(matches.len()),
        distances_squared: Vec::with_capacity(matches.len()),
    };
    for neighbor in matches {
        let matched = reference.get(neighbor.index).ok_or_else(|| {
            Error::Algorithm(format!("neighbor index {} out of range", neighbor.index))
        })?;
        correspondences.points.push(*matched);
        correspondences.indices.push(neighbor.index);
        correspondences.distances_squared.push(neighbor.distance_squared);
    }

    Ok(correspondences)
}
