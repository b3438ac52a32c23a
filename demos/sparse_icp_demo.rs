//! Sparse ICP Demo
//!
//! Registers two partially overlapping samplings of the same shape, with
//! clutter added to the moving cloud, and compares a near-ℓ2 run with a
//! sparse one.
//!
//! Run with `RUST_LOG=debug` to follow the iterations.

use log::info;
use nalgebra::{Rotation3, Unit};
use rand::prelude::*;
use sparseicp_algorithms::{mean_squared_error, IcpMethod, SparseIcp, SparseIcpParams};
use sparseicp_core::{Point3d, PointCloud3d, RigidTransform, Vector3d};

fn sample_box(rng: &mut StdRng, n: usize, x_range: (f64, f64)) -> Vec<Point3d> {
    (0..n)
        .map(|_| {
            Point3d::new(
                rng.gen_range(x_range.0..x_range.1),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-0.5..0.5),
            )
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    println!("Sparse ICP Demo");
    println!("===============");

    let mut rng = StdRng::seed_from_u64(2024);
    let ground_truth = RigidTransform::new(
        Rotation3::from_axis_angle(&Unit::new_normalize(Vector3d::new(0.2, 1.0, 0.3)), 0.1),
        Vector3d::new(0.08, -0.05, 0.04),
    );

    // The two scans only share the region -0.5 < x < 0.5
    let shared = sample_box(&mut rng, 300, (-0.5, 0.5));
    let mut second = PointCloud3d::from_points(shared.clone());
    second.points.extend(sample_box(&mut rng, 150, (0.5, 1.5)));

    let mut first = PointCloud3d::from_points(shared);
    first.points.extend(sample_box(&mut rng, 150, (-1.5, -0.5)));
    first.points.extend((0..40).map(|_| {
        Point3d::new(
            rng.gen_range(-2.0..2.0),
            rng.gen_range(2.0..3.0),
            rng.gen_range(-1.0..1.0),
        )
    }));
    let first = first.transformed(&ground_truth.inverse());
    println!("✓ First cloud: {} points, second cloud: {} points", first.len(), second.len());

    for p in [1.9, 0.4] {
        let params = SparseIcpParams {
            k_normals: 10,
            outer_iterations: 40,
            inner_iterations: 3,
            mu: 10.0,
            shrink_iterations: 5,
            p,
            method: IcpMethod::PointToPoint,
            verbose: false,
        };
        info!("Running with params {}", serde_json::to_string(&params)?);

        let mut icp = SparseIcp::new(first.clone(), second.clone(), params)?;
        let summary = icp.run()?;

        let overlap = 300;
        let moved = icp.moved_cloud().map_err(|e| anyhow::anyhow!("{}", e))?;
        let expected: Vec<Point3d> = first.points[..overlap]
            .iter()
            .map(|q| ground_truth.transform_point(q))
            .collect();

        println!("\np = {}", p);
        let rotation_error = (summary.transform.rotation.inverse() * ground_truth.rotation).angle();
        let translation_error = (summary.transform.translation - ground_truth.translation).norm();
        println!("  - Rotation error: {:.2e} rad", rotation_error);
        println!("  - Translation error: {:.2e}", translation_error);
        let overlap_mse = mean_squared_error(&moved.points[..overlap], &expected);
        println!("  - Overlap MSE: {:.2e}", overlap_mse);
        println!(
            "  - Final mean squared distance: {:.2e}",
            summary.final_mean_squared_distance
        );
    }

    Ok(())
}
