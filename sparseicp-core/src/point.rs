//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Unit normals index-aligned with a point cloud, one per point.
///
/// The sign of each normal is arbitrary; no global orientation is implied.
pub type NormalField = Vec<Vector3d>;

/// Component-wise mean of a set of points, `None` when the set is empty
pub fn centroid(points: &[Point3d]) -> Option<Point3d> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector3d::zeros(), |acc, p| acc + p.coords);
    Some(Point3d::from(sum / points.len() as f64))
}
