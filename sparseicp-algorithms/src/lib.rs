//! # Sparse ICP Algorithms
//!
//! Robust rigid registration of 3D point clouds.
//!
//! This crate provides the building blocks of Sparse ICP (nearest neighbor
//! search, normal estimation, closest-point correspondences, the ℓp shrink
//! operator and rigid transform solvers) together with the [`SparseIcp`]
//! optimizer that ties them into an ADMM loop.

pub mod correspondence;
pub mod nearest_neighbor;
pub mod normals;
pub mod optimizer;
pub mod params;
pub mod registration;
pub mod shrink;

// Re-export commonly used items
pub use correspondence::*;
pub use nearest_neighbor::*;
pub use normals::*;
pub use optimizer::*;
pub use params::*;
pub use registration::*;
pub use shrink::*;
