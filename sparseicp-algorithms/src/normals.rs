//! Normal estimation algorithms

use crate::nearest_neighbor::KdTreeIndex;
use nalgebra::Matrix3;
use rayon::prelude::*;
use sparseicp_core::{
    Error, NearestNeighborSearch, NormalField, Point3d, PointCloud, Result, Vector3d,
};

/// Smallest neighborhood that gives a non-degenerate covariance: the point
/// itself plus three neighbors.
pub const MIN_NORMAL_NEIGHBORS: usize = 4;

/// Configuration for normal estimation
#[derive(Debug, Clone, PartialEq)]
pub struct NormalEstimationConfig {
    /// Number of nearest neighbors, the query point included
    pub k_neighbors: usize,
    /// Flip every normal to face this point. `None` keeps the arbitrary sign
    /// produced by the eigen solver.
    pub viewpoint: Option<Point3d>,
}

impl NormalEstimationConfig {
    pub fn new(k_neighbors: usize) -> Self {
        Self {
            k_neighbors,
            viewpoint: None,
        }
    }
}

/// Estimate normals for a point cloud using k-nearest neighbors
///
/// Each normal is the eigenvector of the smallest eigenvalue of the
/// covariance of the point's `k` nearest neighbors (the point included).
///
/// # Arguments
/// * `cloud` - Input point cloud, at least 3 points
/// * `k` - Neighborhood size, at least 4 and at most `cloud.len()`
///
/// # Returns
/// * `Result<NormalField>` - Unit normals index-aligned with `cloud`
pub fn estimate_normals(cloud: &PointCloud<Point3d>, k: usize) -> Result<NormalField> {
    estimate_normals_with_config(cloud, &NormalEstimationConfig::new(k))
}

/// Estimate normals with the full set of options
pub fn estimate_normals_with_config(
    cloud: &PointCloud<Point3d>,
    config: &NormalEstimationConfig,
) -> Result<NormalField> {
    validate_neighborhood(cloud.len(), config.k_neighbors)?;
    let index = KdTreeIndex::build(&cloud.points)?;
    let mut normals = estimate_normals_with_index(cloud, &index, config.k_neighbors)?;

    if let Some(viewpoint) = config.viewpoint {
        orient_towards(&cloud.points, &mut normals, &viewpoint);
    }

    Ok(normals)
}

/// Estimate normals reusing an index already built over `cloud`
pub fn estimate_normals_with_index<S: NearestNeighborSearch>(
    cloud: &PointCloud<Point3d>,
    index: &S,
    k: usize,
) -> Result<NormalField> {
    validate_neighborhood(cloud.len(), k)?;
    if index.len() != cloud.len() {
        return Err(Error::InvalidData(format!(
            "Index holds {} points but the cloud has {}",
            index.len(),
            cloud.len()
        )));
    }

    cloud
        .points
        .par_iter()
        .map(|point| {
            let neighbors = index.find_k_nearest(point, k)?;
            let neighborhood: Vec<Point3d> = neighbors
                .iter()
                .map(|n| cloud.points[n.index])
                .collect();
            Ok(plane_normal(&neighborhood))
        })
        .collect()
}

/// Normal of the plane best fitting `neighborhood` in the least squares sense
fn plane_normal(neighborhood: &[Point3d]) -> Vector3d {
    let n = neighborhood.len() as f64;
    let barycenter = neighborhood
        .iter()
        .fold(Vector3d::zeros(), |acc, p| acc + p.coords)
        / n;

    let mut covariance = Matrix3::zeros();
    for p in neighborhood {
        let centered = p.coords - barycenter;
        covariance += centered * centered.transpose();
    }

    // The covariance is symmetric so the eigen decomposition is real
    let eigen = covariance.symmetric_eigen();
    let smallest = eigen.eigenvalues.imin();
    let normal: Vector3d = eigen.eigenvectors.column(smallest).into_owned();

    // Coincident or non-finite neighborhoods have no usable direction
    match normal.try_normalize(f64::EPSILON) {
        Some(unit) if unit.iter().all(|c| c.is_finite()) => unit,
        _ => Vector3d::z(),
    }
}

fn orient_towards(points: &[Point3d], normals: &mut [Vector3d], viewpoint: &Point3d) {
    for (point, normal) in points.iter().zip(normals.iter_mut()) {
        if normal.dot(&(viewpoint - point)) < 0.0 {
            *normal = -*normal;
        }
    }
}

fn validate_neighborhood(len: usize, k: usize) -> Result<()> {
    if len < 3 {
        return Err(Error::InvalidData(format!(
            "Need at least 3 points for normal estimation, got {}",
            len
        )));
    }
    if k < MIN_NORMAL_NEIGHBORS {
        return Err(Error::InvalidParameter(format!(
            "Normal estimation needs k >= {}, got {}",
            MIN_NORMAL_NEIGHBORS, k
        )));
    }
    if k > len {
        return Err(Error::InvalidParameter(format!(
            "k = {} exceeds the {} available points",
            k, len
        )));
    }
    Ok(())
}
