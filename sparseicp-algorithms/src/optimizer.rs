//! Sparse ICP: rigid registration robust to outliers and partial overlap
//!
//! The first cloud is moved onto the second one, which stays fixed. Each outer
//! iteration re-matches every moving point to its closest reference point;
//! the inner ADMM iterations then alternate between
//!
//! 1. shrinking the residuals `moving − matched + λ/μ` towards zero,
//! 2. fitting a rigid step onto the targets `matched + z − λ/μ`,
//! 3. updating the multipliers with `μ·(moving − matched − z)`.
//!
//! The shrink step sets large residuals exactly to zero, so points without a
//! real counterpart stop pulling on the transform.

use crate::correspondence::{find_correspondences, Correspondences};
use crate::nearest_neighbor::KdTreeIndex;
use crate::normals::estimate_normals_with_index;
use crate::params::SparseIcpParams;
use crate::registration::RigidTransformSolver;
use crate::shrink::ShrinkOperator;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sparseicp_core::{
    NormalField, NotComputed, Point3d, PointCloud3d, Result, RigidTransform, Vector3d,
};

/// Outcome of [`SparseIcp::run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outer_iterations: usize,
    pub inner_iterations: usize,
    /// Mean squared distance from the moved cloud to its closest reference points
    pub final_mean_squared_distance: f64,
    /// Accumulated transform taking the first cloud onto the second
    pub transform: RigidTransform,
}

/// Mutable state of one registration run
#[derive(Debug, Clone)]
struct RegistrationState {
    moving: PointCloud3d,
    moving_normals: NormalField,
    multipliers: Vec<Vector3d>,
    transform: RigidTransform,
}

impl RegistrationState {
    fn initial(cloud: &PointCloud3d, normals: &NormalField) -> Self {
        Self {
            moving: cloud.clone(),
            moving_normals: normals.clone(),
            multipliers: vec![Vector3d::zeros(); cloud.len()],
            transform: RigidTransform::identity(),
        }
    }

    /// Move the cloud and its normals by `step`, applied after everything so far
    fn apply(&mut self, step: &RigidTransform) {
        self.moving.transform(step);
        self.moving_normals
            .par_iter_mut()
            .for_each(|n| *n = step.transform_vector(n));
        self.transform = self.transform.then(step);
    }
}

/// Sparse ICP registration of a first (moving) cloud onto a second (reference) cloud
pub struct SparseIcp {
    params: SparseIcpParams,
    shrink: ShrinkOperator,
    solver: Box<dyn RigidTransformSolver>,
    first_cloud: PointCloud3d,
    second_cloud: PointCloud3d,
    first_normals: NormalField,
    reference_normals: NormalField,
    reference_index: KdTreeIndex,
    state: RegistrationState,
    solved: bool,
}

impl SparseIcp {
    /// Validate the parameters, estimate normals for both clouds and index
    /// the reference cloud.
    ///
    /// # Arguments
    /// * `first_cloud` - Cloud to be moved
    /// * `second_cloud` - Fixed reference cloud
    /// * `params` - Registration parameters
    pub fn new(
        first_cloud: PointCloud3d,
        second_cloud: PointCloud3d,
        params: SparseIcpParams,
    ) -> Result<Self> {
        params.validate(first_cloud.len(), second_cloud.len())?;
        let shrink = ShrinkOperator::new(params.mu, params.p, params.shrink_iterations)?;
        let solver = params.method.solver();

        info!(
            "Estimating normals for {} + {} points with k = {}",
            first_cloud.len(),
            second_cloud.len(),
            params.k_normals
        );
        let first_index = KdTreeIndex::build(&first_cloud.points)?;
        let first_normals =
            estimate_normals_with_index(&first_cloud, &first_index, params.k_normals)?;
        let reference_index = KdTreeIndex::build(&second_cloud.points)?;
        let reference_normals =
            estimate_normals_with_index(&second_cloud, &reference_index, params.k_normals)?;
        info!("Done with normal estimation");

        let state = RegistrationState::initial(&first_cloud, &first_normals);

        Ok(Self {
            params,
            shrink,
            solver,
            first_cloud,
            second_cloud,
            first_normals,
            reference_normals,
            reference_index,
            state,
            solved: false,
        })
    }

    /// Run the full registration from the initial pose
    ///
    /// Every call starts over from the first cloud, so repeated runs give the
    /// same result. On error the optimizer is left unsolved.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.solved = false;
        self.state = RegistrationState::initial(&self.first_cloud, &self.first_normals);

        let mut state = self.state.clone();
        let mu = self.params.mu;
        info!(
            "Sparse ICP ({}, p = {}, mu = {}): {} outer x {} inner iterations",
            self.solver.name(),
            self.params.p,
            mu,
            self.params.outer_iterations,
            self.params.inner_iterations
        );

        for outer in 0..self.params.outer_iterations {
            let correspondences = self.match_moving(&state.moving.points)?;
            debug!(
                "Iteration {}: mean squared distance {:.6e}",
                outer,
                correspondences.mean_squared_distance()
            );

            let target_normals: Option<Vec<Vector3d>> = if self.params.method.needs_normals() {
                Some(
                    correspondences
                        .indices
                        .iter()
                        .map(|&i| self.reference_normals[i])
                        .collect(),
                )
            } else {
                None
            };
            let matched = &correspondences.points;

            for inner in 0..self.params.inner_iterations {
                let residuals: Vec<Vector3d> = state
                    .moving
                    .points
                    .par_iter()
                    .zip(matched.par_iter())
                    .zip(state.multipliers.par_iter())
                    .map(|((x, q), lambda)| (x - q) + lambda / mu)
                    .collect();
                let z = self.shrink.apply_all(&residuals);

                let targets: Vec<Point3d> = matched
                    .par_iter()
                    .zip(z.par_iter())
                    .zip(state.multipliers.par_iter())
                    .map(|((q, z), lambda)| q + z - lambda / mu)
                    .collect();

                let step = self
                    .solver
                    .solve(&state.moving.points, &targets, target_normals.as_deref())?;
                state.apply(&step);
                if self.params.verbose {
                    trace!(
                        "Iteration {}.{}: rotation {:?}, translation {:?}",
                        outer,
                        inner,
                        step.rotation_matrix(),
                        step.translation
                    );
                }

                let moving = &state.moving.points;
                state
                    .multipliers
                    .par_iter_mut()
                    .zip(moving.par_iter())
                    .zip(matched.par_iter())
                    .zip(z.par_iter())
                    .for_each(|(((lambda, x), q), z)| *lambda += (x - q - z) * mu);
            }
        }

        let final_mean_squared_distance = self
            .match_moving(&state.moving.points)?
            .mean_squared_distance();
        info!(
            "Sparse ICP done: mean squared distance {:.6e}",
            final_mean_squared_distance
        );

        let summary = RunSummary {
            outer_iterations: self.params.outer_iterations,
            inner_iterations: self.params.inner_iterations,
            final_mean_squared_distance,
            transform: state.transform,
        };
        self.state = state;
        self.solved = true;
        Ok(summary)
    }

    fn match_moving(&self, moving: &[Point3d]) -> Result<Correspondences> {
        let correspondences =
            find_correspondences(&self.reference_index, &self.second_cloud.points, moving)?;
        if self.params.verbose {
            for (query, matched) in moving.iter().zip(correspondences.points.iter()) {
                trace!("query {:?} closest {:?}", query.coords, matched.coords);
            }
        }
        Ok(correspondences)
    }

    /// Transform taking the first cloud onto the second
    ///
    /// Before a successful [`run`](Self::run) this is an error carrying the identity.
    pub fn computed_transform(
        &self,
    ) -> std::result::Result<&RigidTransform, NotComputed<&RigidTransform>> {
        if self.solved {
            Ok(&self.state.transform)
        } else {
            warn!("The transformation has not been computed, returning the identity");
            Err(NotComputed::new(&self.state.transform))
        }
    }

    /// First cloud after registration, or the untouched first cloud before
    pub fn moved_cloud(&self) -> std::result::Result<&PointCloud3d, NotComputed<&PointCloud3d>> {
        if self.solved {
            Ok(&self.state.moving)
        } else {
            warn!("The transformation has not been computed, returning the original cloud");
            Err(NotComputed::new(&self.state.moving))
        }
    }

    /// Normals of the moved cloud, rotated along with it
    pub fn moved_normals(&self) -> std::result::Result<&[Vector3d], NotComputed<&[Vector3d]>> {
        if self.solved {
            Ok(self.state.moving_normals.as_slice())
        } else {
            warn!("The transformation has not been computed, returning the original normals");
            Err(NotComputed::new(self.state.moving_normals.as_slice()))
        }
    }

    /// Normals of the fixed second cloud
    pub fn reference_normals(&self) -> &[Vector3d] {
        &self.reference_normals
    }

    pub fn first_normals(&self) -> &[Vector3d] {
        &self.first_normals
    }

    pub fn first_cloud(&self) -> &PointCloud3d {
        &self.first_cloud
    }

    pub fn second_cloud(&self) -> &PointCloud3d {
        &self.second_cloud
    }

    pub fn params(&self) -> &SparseIcpParams {
        &self.params
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }
}
