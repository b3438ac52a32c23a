//! Rigid transformation utilities

use crate::point::{Point3d, Vector3d};
use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// A rigid motion `x -> R * x + t` with `R` a proper rotation (det = +1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3d,
}

impl RigidTransform {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3d::zeros(),
        }
    }

    pub fn new(rotation: Rotation3<f64>, translation: Vector3d) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create a pure translation
    pub fn from_translation(translation: Vector3d) -> Self {
        Self::new(Rotation3::identity(), translation)
    }

    /// Create a pure rotation about the origin
    pub fn from_rotation(rotation: Rotation3<f64>) -> Self {
        Self::new(rotation, Vector3d::zeros())
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3d) -> Point3d {
        self.rotation * point + self.translation
    }

    /// Apply the rotation part to a vector (normals, directions)
    pub fn transform_vector(&self, vector: &Vector3d) -> Vector3d {
        self.rotation * vector
    }

    /// Compose so that `self` is applied first and `next` second.
    ///
    /// Returns `(R_next * R_self, R_next * t_self + t_next)`.
    pub fn then(&self, next: &Self) -> Self {
        Self {
            rotation: next.rotation * self.rotation,
            translation: next.rotation * self.translation + next.translation,
        }
    }

    /// Compose so that `previous` is applied first and `self` second
    pub fn after(&self, previous: &Self) -> Self {
        previous.then(self)
    }

    /// Get the inverse transformation
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// The rotation as a plain 3x3 matrix
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        *self.rotation.matrix()
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.translation),
            UnitQuaternion::from_rotation_matrix(&self.rotation),
        )
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.rotation_matrix() - Matrix3::identity()).norm() < epsilon
            && self.translation.norm() < epsilon
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// `a * b` applies `b` first, then `a`, like matrix products
impl std::ops::Mul for RigidTransform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        rhs.then(&self)
    }
}

impl From<Isometry3<f64>> for RigidTransform {
    fn from(isometry: Isometry3<f64>) -> Self {
        Self {
            rotation: isometry.rotation.to_rotation_matrix(),
            translation: isometry.translation.vector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_transforms() -> (RigidTransform, RigidTransform) {
        let t1 = RigidTransform::new(
            Rotation3::from_axis_angle(&Vector3d::x_axis(), 0.3),
            Vector3d::new(1.0, -2.0, 0.5),
        );
        let t2 = RigidTransform::new(
            Rotation3::from_euler_angles(0.1, -0.4, 1.2),
            Vector3d::new(-0.7, 0.2, 3.0),
        );
        (t1, t2)
    }

    #[test]
    fn test_identity() {
        let p = Point3d::new(1.0, 2.0, 3.0);
        assert_eq!(RigidTransform::identity().transform_point(&p), p);
        assert!(RigidTransform::default().is_identity(1e-12));
    }

    #[test]
    fn test_composition_matches_sequential_application() {
        let (t1, t2) = sample_transforms();
        let composed = t1.then(&t2);

        for p in [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 2.0, 3.0),
            Point3d::new(-4.0, 0.5, 9.0),
        ] {
            let sequential = t2.transform_point(&t1.transform_point(&p));
            assert_relative_eq!(composed.transform_point(&p), sequential, epsilon = 1e-12);
        }

        assert_eq!(t2 * t1, composed);
        assert_eq!(t2.after(&t1), composed);
    }

    #[test]
    fn test_inverse() {
        let (t1, _) = sample_transforms();
        let round_trip = t1.then(&t1.inverse());
        assert!(round_trip.is_identity(1e-12));
    }

    #[test]
    fn test_isometry_conversion() {
        let (_, t2) = sample_transforms();
        let back = RigidTransform::from(t2.to_isometry());
        assert_relative_eq!(back.rotation_matrix(), t2.rotation_matrix(), epsilon = 1e-12);
        assert_relative_eq!(back.translation, t2.translation, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_vector_ignores_translation() {
        let t = RigidTransform::from_translation(Vector3d::new(5.0, 5.0, 5.0));
        let n = Vector3d::new(0.0, 0.0, 1.0);
        assert_eq!(t.transform_vector(&n), n);
    }

    #[test]
    fn test_json_round_trip() {
        let (t1, _) = sample_transforms();
        let json = serde_json::to_string(&t1).unwrap();
        let back: RigidTransform = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(back.rotation_matrix(), t1.rotation_matrix(), epsilon = 1e-12);
        assert_relative_eq!(back.translation, t1.translation, epsilon = 1e-12);

        let identity: RigidTransform =
            serde_json::from_str(&serde_json::to_string(&RigidTransform::identity()).unwrap())
                .unwrap();
        assert!(identity.is_identity(1e-12));
    }
}
