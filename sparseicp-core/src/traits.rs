//! Core traits for sparseicp

use crate::error::Result;
use crate::point::Point3d;

/// One result of a nearest neighbor query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the neighbor in the indexed point set
    pub index: usize,
    /// Squared Euclidean distance to the query point
    pub distance_squared: f64,
}

/// Trait for nearest neighbor search functionality
///
/// Implementations are built once over a fixed point set and are read-only
/// afterwards, so they can be shared between query threads.
pub trait NearestNeighborSearch: Send + Sync {
    /// Find the k nearest neighbors to a query point.
    ///
    /// Results are sorted by ascending distance. Fails when `k` is zero or
    /// larger than the number of indexed points.
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Result<Vec<Neighbor>>;

    /// Find the single nearest neighbor to a query point
    fn find_nearest(&self, query: &Point3d) -> Result<Neighbor> {
        self.find_k_nearest(query, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                crate::Error::Algorithm("nearest neighbor query returned nothing".to_string())
            })
    }

    /// Number of indexed points
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks a k-NN request against the size of the indexed set
pub fn validate_k(k: usize, indexed: usize) -> Result<()> {
    if k == 0 {
        return Err(crate::Error::InvalidParameter("k must be at least 1".to_string()));
    }
    if k > indexed {
        return Err(crate::Error::InvalidParameter(format!(
            "k = {} exceeds the {} indexed points",
            k, indexed
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_k() {
        assert!(validate_k(1, 1).is_ok());
        assert!(validate_k(0, 5).is_err());
        assert!(validate_k(6, 5).is_err());
    }
}
