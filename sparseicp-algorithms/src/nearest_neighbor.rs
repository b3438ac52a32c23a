//! Nearest neighbor search implementations

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use sparseicp_core::{validate_k, Error, NearestNeighborSearch, Neighbor, Point3d, Result};
use std::cmp::Ordering;
use std::num::NonZeroUsize;

/// Leaf size of the KD-tree
const BUCKET_SIZE: usize = 32;

/// KD-tree index over a fixed point set, backed by `kiddo`
///
/// The tree is built once and only queried afterwards. Item ids stored in the
/// tree are the positions of the points in the slice it was built from. The
/// immutable tree accepts any number of points sharing a coordinate on one
/// axis, so planar scans and regular lattices index like any other cloud.
pub struct KdTreeIndex {
    tree: ImmutableKdTree<f64, u64, 3, BUCKET_SIZE>,
    len: usize,
}

impl KdTreeIndex {
    pub fn build(points: &[Point3d]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidData("Cannot index an empty point set".to_string()));
        }

        let coords: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree: ImmutableKdTree<f64, u64, 3, BUCKET_SIZE> =
            ImmutableKdTree::new_from_slice(&coords);

        Ok(Self {
            tree,
            len: points.len(),
        })
    }
}

impl NearestNeighborSearch for KdTreeIndex {
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Result<Vec<Neighbor>> {
        validate_k(k, self.len)?;
        let qty = NonZeroUsize::new(k)
            .ok_or_else(|| Error::InvalidParameter("k must be at least 1".to_string()))?;

        let mut neighbors: Vec<Neighbor> = self
            .tree
            .nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], qty)
            .into_iter()
            .map(|nn| Neighbor {
                index: nn.item as usize,
                distance_squared: nn.distance,
            })
            .collect();

        // Equal distances come back in tree order; make the order depend on the index only
        neighbors.sort_by(compare_neighbors);
        Ok(neighbors)
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Simple brute force nearest neighbor search for small datasets
///
/// Ties are broken by ascending index.
pub struct BruteForceIndex {
    points: Vec<Point3d>,
}

impl BruteForceIndex {
    pub fn build(points: &[Point3d]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidData("Cannot index an empty point set".to_string()));
        }
        Ok(Self {
            points: points.to_vec(),
        })
    }
}

impl NearestNeighborSearch for BruteForceIndex {
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Result<Vec<Neighbor>> {
        validate_k(k, self.points.len())?;

        let mut distances: Vec<Neighbor> = self
            .points
            .iter()
            .enumerate()
            .map(|(index, point)| Neighbor {
                index,
                distance_squared: (point - query).norm_squared(),
            })
            .collect();

        distances.sort_by(compare_neighbors);
        distances.truncate(k);
        Ok(distances)
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance_squared
        .partial_cmp(&b.distance_squared)
        .unwrap_or(Ordering::Equal)
        .then(a.index.cmp(&b.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn unit_square() -> Vec<Point3d> {
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_nearest_is_exact_match() {
        let points = unit_square();
        let index = KdTreeIndex::build(&points).unwrap();

        let nearest = index.find_nearest(&Point3d::new(0.9, 1.1, 0.0)).unwrap();
        assert_eq!(nearest.index, 3);
        assert!((nearest.distance_squared - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_k_nearest_sorted_and_includes_self() {
        let points = unit_square();
        let index = KdTreeIndex::build(&points).unwrap();

        let neighbors = index.find_k_nearest(&points[0], 3).unwrap();
        assert_eq!(neighbors.len(), 3);
        assert_eq!(neighbors[0].index, 0);
        assert_eq!(neighbors[0].distance_squared, 0.0);
        // (1, 0, 0) and (0, 1, 0) are equidistant, ties go to the lower index
        assert_eq!(neighbors[1].index, 1);
        assert_eq!(neighbors[2].index, 2);
    }

    #[test]
    fn test_rejects_invalid_k() {
        let points = unit_square();
        let kdtree = KdTreeIndex::build(&points).unwrap();
        let brute = BruteForceIndex::build(&points).unwrap();

        assert!(kdtree.find_k_nearest(&points[0], 0).is_err());
        assert!(kdtree.find_k_nearest(&points[0], 5).is_err());
        assert!(brute.find_k_nearest(&points[0], 5).is_err());
        assert!(kdtree.find_k_nearest(&points[0], 4).is_ok());
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(KdTreeIndex::build(&[]).is_err());
        assert!(BruteForceIndex::build(&[]).is_err());
    }

    #[test]
    fn test_brute_force_consistency() {
        let mut rng = StdRng::seed_from_u64(42);
        let points: Vec<Point3d> = (0..200)
            .map(|_| {
                Point3d::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                )
            })
            .collect();

        let kdtree = KdTreeIndex::build(&points).unwrap();
        let brute = BruteForceIndex::build(&points).unwrap();
        assert_eq!(kdtree.len(), 200);

        for _ in 0..20 {
            let query = Point3d::new(
                rng.gen_range(-1.2..1.2),
                rng.gen_range(-1.2..1.2),
                rng.gen_range(-1.2..1.2),
            );
            let from_tree = kdtree.find_k_nearest(&query, 8).unwrap();
            let from_brute = brute.find_k_nearest(&query, 8).unwrap();

            assert_eq!(from_tree.len(), from_brute.len());
            for (a, b) in from_tree.iter().zip(from_brute.iter()) {
                assert_eq!(a.index, b.index);
                assert!((a.distance_squared - b.distance_squared).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_planar_grid_with_shared_coordinates() {
        // 400 points on z = 0, 20 per row and per column
        let points: Vec<Point3d> = (0..20)
            .flat_map(|i| (0..20).map(move |j| Point3d::new(i as f64, j as f64, 0.0)))
            .collect();
        let kdtree = KdTreeIndex::build(&points).unwrap();
        let brute = BruteForceIndex::build(&points).unwrap();

        let exact = kdtree.find_nearest(&Point3d::new(7.0, 12.0, 0.0)).unwrap();
        assert_eq!(exact.index, 7 * 20 + 12);
        assert_eq!(exact.distance_squared, 0.0);

        for query in [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(9.4, 3.2, 0.5),
            Point3d::new(19.0, 19.0, -1.0),
        ] {
            let from_tree = kdtree.find_k_nearest(&query, 8).unwrap();
            let from_brute = brute.find_k_nearest(&query, 8).unwrap();
            // Tied candidates may differ, their distances may not
            for (a, b) in from_tree.iter().zip(from_brute.iter()) {
                assert!((a.distance_squared - b.distance_squared).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_lattice_with_shared_coordinates() {
        let points: Vec<Point3d> = (0..1000)
            .map(|n| Point3d::new((n % 10) as f64, ((n / 10) % 10) as f64, (n / 100) as f64))
            .collect();
        let kdtree = KdTreeIndex::build(&points).unwrap();
        assert_eq!(kdtree.len(), 1000);

        for (i, point) in points.iter().enumerate().step_by(37) {
            let nearest = kdtree.find_nearest(point).unwrap();
            assert_eq!(nearest.index, i);
            assert_eq!(nearest.distance_squared, 0.0);
        }
    }
}
