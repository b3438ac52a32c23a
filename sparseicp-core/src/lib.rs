//! Core data structures and traits for sparseicp
//! 
//! This crate provides the fundamental types shared by the registration
//! algorithms: double precision points and vectors, point clouds, normal
//! fields, rigid transforms, and the nearest neighbor search trait.

pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Rotation3, Isometry3};
