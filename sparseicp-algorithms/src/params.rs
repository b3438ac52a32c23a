//! Sparse ICP configuration

use crate::normals::MIN_NORMAL_NEIGHBORS;
use crate::registration::IcpMethod;
use serde::{Deserialize, Serialize};
use sparseicp_core::{Error, Result};

/// Parameters for [`SparseIcp`](crate::SparseIcp)
///
/// Every field is required; there is no sensible default for the
/// neighborhood size or the penalty weight of an arbitrary data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseIcpParams {
    /// Neighborhood size for normal estimation, at least 4
    pub k_normals: usize,
    /// Number of correspondence updates
    pub outer_iterations: usize,
    /// ADMM steps per correspondence update
    pub inner_iterations: usize,
    /// ADMM penalty weight
    pub mu: f64,
    /// Refinements inside the shrink operator
    pub shrink_iterations: usize,
    /// Exponent of the sparsity-inducing norm, in (0, 2)
    pub p: f64,
    pub method: IcpMethod,
    /// Trace every correspondence and every inner transform
    pub verbose: bool,
}

impl SparseIcpParams {
    /// Check the parameters against the sizes of the two clouds
    pub fn validate(&self, first_len: usize, second_len: usize) -> Result<()> {
        if self.k_normals < MIN_NORMAL_NEIGHBORS {
            return Err(Error::InvalidParameter(format!(
                "k_normals must be at least {}, got {}",
                MIN_NORMAL_NEIGHBORS, self.k_normals
            )));
        }
        if self.k_normals > first_len || self.k_normals > second_len {
            return Err(Error::InvalidParameter(format!(
                "k_normals = {} exceeds the cloud sizes ({} and {})",
                self.k_normals, first_len, second_len
            )));
        }
        if !(self.mu > 0.0 && self.mu.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "mu must be positive, got {}",
                self.mu
            )));
        }
        if !(self.p > 0.0 && self.p < 2.0) {
            return Err(Error::InvalidParameter(format!(
                "p must lie strictly inside (0, 2), got {}",
                self.p
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SparseIcpParams {
        SparseIcpParams {
            k_normals: 8,
            outer_iterations: 10,
            inner_iterations: 5,
            mu: 10.0,
            shrink_iterations: 5,
            p: 0.5,
            method: IcpMethod::PointToPoint,
            verbose: false,
        }
    }

    #[test]
    fn test_valid_params() {
        assert!(params().validate(100, 50).is_ok());
        assert!(params().validate(8, 8).is_ok());
    }

    #[test]
    fn test_rejects_small_or_oversized_neighborhood() {
        let mut p = params();
        p.k_normals = 3;
        assert!(p.validate(100, 100).is_err());

        assert!(params().validate(7, 100).is_err());
        assert!(params().validate(100, 7).is_err());
    }

    #[test]
    fn test_rejects_bad_penalty_and_exponent() {
        for mu in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let p = SparseIcpParams { mu, ..params() };
            assert!(p.validate(100, 100).is_err(), "mu = {}", mu);
        }
        for exponent in [0.0, 2.0, 3.0, f64::NAN] {
            let p = SparseIcpParams { p: exponent, ..params() };
            assert!(p.validate(100, 100).is_err(), "p = {}", exponent);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{
            "k_normals": 10,
            "outer_iterations": 20,
            "inner_iterations": 3,
            "mu": 5.0,
            "shrink_iterations": 4,
            "p": 0.4,
            "method": "point_to_plane",
            "verbose": true
        }"#;
        let parsed: SparseIcpParams = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.method, IcpMethod::PointToPlane);
        assert_eq!(parsed.k_normals, 10);

        let missing_field = r#"{ "k_normals": 10, "method": "point_to_point" }"#;
        assert!(serde_json::from_str::<SparseIcpParams>(missing_field).is_err());
    }
}
