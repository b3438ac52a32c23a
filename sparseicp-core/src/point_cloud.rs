//! Point cloud data structures and functionality

use crate::point::*;
use crate::transform::RigidTransform;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A generic point cloud container
///
/// Row `i` is point `i`. The order carries no geometric meaning but arrays
/// derived from a cloud (normals, correspondences, multipliers) are
/// index-aligned with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with double precision 3D points
pub type PointCloud3d = PointCloud<Point3d>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
        }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.points.iter()
    }

    /// Get a mutable iterator over the points
    pub fn iter_mut(&mut self) -> std::slice::IterMut<T> {
        self.points.iter_mut()
    }

    /// View the points as a slice
    pub fn as_slice(&self) -> &[T] {
        &self.points
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IndexMut<usize> for PointCloud<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl From<Vec<[f64; 3]>> for PointCloud<Point3d> {
    fn from(rows: Vec<[f64; 3]>) -> Self {
        rows.into_iter().map(Point3d::from).collect()
    }
}

impl PointCloud<Point3d> {
    /// Apply a rigid transformation to all points in the cloud
    pub fn transform(&mut self, transform: &RigidTransform) {
        for point in &mut self.points {
            *point = transform.transform_point(point);
        }
    }

    /// Return a transformed copy of the cloud
    pub fn transformed(&self, transform: &RigidTransform) -> Self {
        self.points
            .iter()
            .map(|p| transform.transform_point(p))
            .collect()
    }

    /// Centroid of the cloud, `None` when empty
    pub fn centroid(&self) -> Option<Point3d> {
        centroid(&self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    #[test]
    fn test_from_rows() {
        let cloud = PointCloud::from(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[1], Point3d::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_transform_in_place() {
        let mut cloud = PointCloud::from_points(vec![
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ]);
        let transform = RigidTransform::new(
            Rotation3::from_axis_angle(&Vector3d::z_axis(), std::f64::consts::FRAC_PI_2),
            Vector3d::new(0.0, 0.0, 1.0),
        );
        let copy = cloud.transformed(&transform);
        cloud.transform(&transform);

        assert_eq!(cloud, copy);
        assert_relative_eq!(cloud[0], Point3d::new(0.0, 1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(cloud[1], Point3d::new(-1.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_cloud() {
        let cloud: PointCloud3d = PointCloud::new();
        assert!(cloud.is_empty());
        assert!(cloud.centroid().is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let cloud = PointCloud::from(vec![[0.5, -1.25, 2.0], [3.0, 0.0, -0.75]]);
        let json = serde_json::to_string(&cloud).unwrap();
        let back: PointCloud3d = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cloud);

        assert!(serde_json::from_str::<PointCloud3d>(r#"{ "points": [[1.0, 2.0]] }"#).is_err());
    }
}
