//! # sparseicp
//!
//! Sparse ICP rigid registration of 3D point clouds for Rust.
//!
//! This is the umbrella crate that re-exports the core data structures and,
//! with the `algorithms` feature, the registration algorithms.
//!
//! ## Quick Start
//!
//! ```rust
//! use sparseicp::prelude::*;
//!
//! let first: PointCloud3d = (0..27)
//!     .map(|i| {
//!         let (x, y, z) = (i % 3, (i / 3) % 3, i / 9);
//!         Point3d::new(x as f64 * 10.0, y as f64 * 10.0, z as f64 * 10.0)
//!     })
//!     .collect();
//! let offset = Vector3d::new(1.0, 2.0, 3.0);
//! let second = first.transformed(&RigidTransform::from_translation(offset));
//!
//! let params = SparseIcpParams {
//!     k_normals: 8,
//!     outer_iterations: 5,
//!     inner_iterations: 5,
//!     mu: 1.0,
//!     shrink_iterations: 5,
//!     p: 0.5,
//!     method: IcpMethod::PointToPoint,
//!     verbose: false,
//! };
//! let mut icp = SparseIcp::new(first, second, params)?;
//! let summary = icp.run()?;
//! assert!((summary.transform.translation - Vector3d::new(1.0, 2.0, 3.0)).norm() < 1e-6);
//! # Ok::<(), sparseicp::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core and algorithms
//! - `algorithms`: Normal estimation, nearest neighbor search and registration

// Re-export core functionality
pub use sparseicp_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use sparseicp_algorithms as algorithms;

/// Convenient imports for common use cases
pub mod prelude {
    pub use sparseicp_core::*;

    #[cfg(feature = "algorithms")]
    pub use sparseicp_algorithms::*;
}
