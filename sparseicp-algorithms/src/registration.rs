//! Rigid transform estimation from paired point sets

use nalgebra::{Matrix3, Matrix6, Rotation3, Vector6};
use serde::{Deserialize, Serialize};
use sparseicp_core::{centroid, Error, Point3d, Result, RigidTransform, Vector3d};

/// Relative Tikhonov weight added to the point-to-plane normal equations
const POINT_TO_PLANE_DAMPING: f64 = 1e-9;

/// Strategy for fitting a rigid transform that maps `moving[i]` onto `target[i]`
pub trait RigidTransformSolver: Send + Sync {
    /// # Arguments
    /// * `moving` - Points to be moved
    /// * `target` - Desired positions, index-aligned with `moving`
    /// * `target_normals` - Unit normals at the targets, for solvers that use them
    fn solve(
        &self,
        moving: &[Point3d],
        target: &[Point3d],
        target_normals: Option<&[Vector3d]>,
    ) -> Result<RigidTransform>;

    fn name(&self) -> &'static str;
}

/// Which residual the registration minimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcpMethod {
    /// Euclidean distance between paired points
    PointToPoint,
    /// Distance along the target normal
    PointToPlane,
}

impl IcpMethod {
    pub fn solver(&self) -> Box<dyn RigidTransformSolver> {
        match self {
            IcpMethod::PointToPoint => Box::new(PointToPoint),
            IcpMethod::PointToPlane => Box::new(PointToPlane),
        }
    }

    /// Whether `solve` must be given target normals
    pub fn needs_normals(&self) -> bool {
        matches!(self, IcpMethod::PointToPlane)
    }
}

/// Closed-form least squares fit (Kabsch / orthogonal Procrustes)
#[derive(Debug, Clone, Copy, Default)]
pub struct PointToPoint;

impl RigidTransformSolver for PointToPoint {
    fn solve(
        &self,
        moving: &[Point3d],
        target: &[Point3d],
        _target_normals: Option<&[Vector3d]>,
    ) -> Result<RigidTransform> {
        check_pairs(moving, target)?;

        let moving_centroid = centroid(moving)
            .ok_or_else(|| Error::InvalidData("Empty moving set".to_string()))?;
        let target_centroid = centroid(target)
            .ok_or_else(|| Error::InvalidData("Empty target set".to_string()))?;

        // Cross-covariance W = Σ a_c · b_cᵀ
        let mut w = Matrix3::zeros();
        for (a, b) in moving.iter().zip(target.iter()) {
            w += (a - moving_centroid) * (b - target_centroid).transpose();
        }

        let svd = w.svd(true, true);
        let u = svd.u.ok_or_else(|| Error::Algorithm("SVD U matrix not available".to_string()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| Error::Algorithm("SVD V^T matrix not available".to_string()))?;

        let mut v = v_t.transpose();
        let mut r = v * u.transpose();

        // Reflection: negate the axis of least variance. Singular values are
        // not guaranteed to be sorted, so look the smallest one up.
        if r.determinant() < 0.0 {
            let smallest = svd.singular_values.imin();
            let flipped = -v.column(smallest);
            v.set_column(smallest, &flipped);
            r = v * u.transpose();
        }

        let rotation = Rotation3::from_matrix_unchecked(r);
        let translation = target_centroid.coords - rotation * moving_centroid.coords;

        Ok(RigidTransform::new(rotation, translation))
    }

    fn name(&self) -> &'static str {
        "point-to-point"
    }
}

/// Linearized point-to-plane fit
///
/// Minimizes `Σ (nᵢ · (R·aᵢ + t − bᵢ))²` with `R ≈ I + [ω]×`. The angle vector
/// `ω` is turned back into an exact rotation, so the result is always proper.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointToPlane;

impl RigidTransformSolver for PointToPlane {
    fn solve(
        &self,
        moving: &[Point3d],
        target: &[Point3d],
        target_normals: Option<&[Vector3d]>,
    ) -> Result<RigidTransform> {
        check_pairs(moving, target)?;
        let normals = target_normals.ok_or_else(|| {
            Error::InvalidData("Point-to-plane registration requires target normals".to_string())
        })?;
        if normals.len() != target.len() {
            return Err(Error::InvalidData(format!(
                "Got {} normals for {} target points",
                normals.len(),
                target.len()
            )));
        }

        let mut ata = Matrix6::<f64>::zeros();
        let mut atb = Vector6::<f64>::zeros();
        for ((a, b), n) in moving.iter().zip(target.iter()).zip(normals.iter()) {
            let cross = a.coords.cross(n);
            let row = Vector6::new(cross.x, cross.y, cross.z, n.x, n.y, n.z);
            let rhs = n.dot(&(b - a));
            ata += row * row.transpose();
            atb += row * rhs;
        }

        // Flat or symmetric patches leave some directions unconstrained
        let damping = POINT_TO_PLANE_DAMPING * ata.trace() / 6.0;
        for i in 0..6 {
            ata[(i, i)] += damping;
        }

        let x = match ata.cholesky() {
            Some(cholesky) => cholesky.solve(&atb),
            None => ata.lu().solve(&atb).ok_or_else(|| {
                Error::Algorithm("Point-to-plane normal equations are singular".to_string())
            })?,
        };
        if !x.iter().all(|v| v.is_finite()) {
            return Err(Error::Algorithm(
                "Point-to-plane solve produced non-finite values".to_string(),
            ));
        }

        let omega = Vector3d::new(x[0], x[1], x[2]);
        let translation = Vector3d::new(x[3], x[4], x[5]);
        Ok(RigidTransform::new(Rotation3::new(omega), translation))
    }

    fn name(&self) -> &'static str {
        "point-to-plane"
    }
}

fn check_pairs(moving: &[Point3d], target: &[Point3d]) -> Result<()> {
    if moving.is_empty() {
        return Err(Error::InvalidData("Cannot fit a transform to no points".to_string()));
    }
    if moving.len() != target.len() {
        return Err(Error::InvalidData(format!(
            "Point correspondence mismatch: {} moving vs {} target",
            moving.len(),
            target.len()
        )));
    }
    Ok(())
}

/// Compute mean squared error between corresponding points
pub fn mean_squared_error(a: &[Point3d], b: &[Point3d]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }

    let sum_squared_error: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q).norm_squared())
        .sum();

    sum_squared_error / a.len() as f64
}
