//! Proximal operator of the ℓp penalty used by the ADMM z-step

use rayon::prelude::*;
use sparseicp_core::{Error, Result, Vector3d};

/// Solves `argmin_z ‖z‖^p + (μ/2)‖z − h‖²` for a 3-vector `h`
///
/// Below the closed-form threshold `h̃(μ, p)` the minimizer is exactly zero,
/// which is what lets Sparse ICP ignore outlier residuals. Above it the
/// minimizer is `β·h` with `β ∈ [0, 1]`, refined by a fixed number of
/// clamped fixed-point steps for p ≤ 1 and of bisection steps for p > 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShrinkOperator {
    mu: f64,
    p: f64,
    iterations: usize,
    alpha: f64,
    threshold: f64,
}

impl ShrinkOperator {
    /// # Arguments
    /// * `mu` - ADMM penalty weight, strictly positive
    /// * `p` - Norm exponent, strictly inside (0, 2)
    /// * `iterations` - Number of fixed-point refinements of β
    pub fn new(mu: f64, p: f64, iterations: usize) -> Result<Self> {
        if !(mu > 0.0 && mu.is_finite()) {
            return Err(Error::InvalidParameter(format!("mu must be positive, got {}", mu)));
        }
        if !(p > 0.0 && p < 2.0) {
            return Err(Error::InvalidParameter(format!(
                "p must lie strictly inside (0, 2), got {}",
                p
            )));
        }

        // For p > 1 the base is negative and the penalty has no dead zone
        let alpha = ((2.0 / mu) * (1.0 - p)).max(0.0).powf(1.0 / (2.0 - p));
        let threshold = alpha + (p / mu) * alpha.powf(p - 1.0);

        Ok(Self {
            mu,
            p,
            iterations,
            alpha,
            threshold,
        })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Norm at or below which the minimizer is the zero vector
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Shrink a single vector
    pub fn apply(&self, h: &Vector3d) -> Vector3d {
        let h_norm = h.norm();
        // ‖h‖^(p−2) is singular at zero
        if h_norm == 0.0 || h_norm <= self.threshold {
            return Vector3d::zeros();
        }

        let scale = (self.p / self.mu) * h_norm.powf(self.p - 2.0);
        let beta = if self.p <= 1.0 {
            let mut beta = (self.alpha / h_norm + 1.0) / 2.0;
            for _ in 0..self.iterations {
                beta = (1.0 - scale * beta.powf(self.p - 1.0)).clamp(0.0, 1.0);
            }
            beta
        } else {
            bisect_scale(scale, self.p, self.iterations)
        };
        h * beta
    }

    /// Shrink every row independently
    pub fn apply_all(&self, rows: &[Vector3d]) -> Vec<Vector3d> {
        rows.par_iter().map(|h| self.apply(h)).collect()
    }
}

/// Root of `β − 1 + scale·β^(p−1)` on [0, 1] for p > 1.
///
/// The function is increasing there, negative at 0 and positive at 1, so
/// bisection converges where the fixed-point map can oscillate.
fn bisect_scale(scale: f64, p: f64, iterations: usize) -> f64 {
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..iterations {
        let mid = 0.5 * (lo + hi);
        if mid - 1.0 + scale * mid.powf(p - 1.0) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}
