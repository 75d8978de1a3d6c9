//! GraphSLAM on a random map
//!
//! Drives a robot along a random path through a walled map with point
//! landmarks, then estimates trajectory and map from the noisy odometry and
//! range/bearing measurements. Every measurement is treated as a landmark of
//! its own, so only odometry and the within-pose geometry constrain the
//! estimate.

use nalgebra::{Matrix2, Matrix3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use graph_slam::common::{Pose2D, SlamResult};
use graph_slam::simulation::{
    generate_map, generate_measurements, generate_path, transform_poses_into_frame,
    unique_correspondences, PathLimits, SensorLimits,
};
use graph_slam::slam::{initialize, GraphSlam, GraphSlamConfig};
use graph_slam::utils::{colors, init_logger, PathStyle, Visualizer};

const MAP_HEIGHT: usize = 30;
const MAP_WIDTH: usize = 30;
const LANDMARK_COUNT: usize = 40;
const ITERATIONS: usize = 25;
const OUTPUT_DIR: &str = "img/slam";

fn position_error(estimate: &[Pose2D], truth: &[Pose2D]) -> f64 {
    let sum: f64 = estimate
        .iter()
        .zip(truth)
        .map(|(a, b)| a.position().distance(&b.position()))
        .sum();
    sum / truth.len().max(1) as f64
}

fn run(seed: u64) -> SlamResult<()> {
    let mut rng = StdRng::seed_from_u64(seed);

    let (map, landmarks) = generate_map(MAP_HEIGHT, MAP_WIDTH, LANDMARK_COUNT, &mut rng)?;
    let (truth, controls) = generate_path(&map, &PathLimits::default(), &mut rng)?;
    let (measurements, _) = generate_measurements(&truth, &landmarks, &SensorLimits::default(), &mut rng)?;
    let correspondences = unique_correspondences(&measurements);
    info!(
        poses = truth.len(),
        measurements = measurements.iter().map(Vec::len).sum::<usize>(),
        "simulated run"
    );

    let config = GraphSlamConfig::default()
        .with_motion_covariance(Matrix3::identity() * 0.00001)
        .with_measurement_covariance(Matrix2::identity() * 0.00001)
        .with_max_iterations(ITERATIONS);
    let slam = GraphSlam::new(config)?;

    let mut initial = initialize(&controls, Pose2D::origin(), slam.config().dt)?;
    let output = slam.optimize(&initial, &controls, &measurements, &correspondences)?;

    // estimates live in the frame of the first pose
    let mut estimate = output.poses.clone();
    transform_poses_into_frame(&mut estimate, &truth[0]);
    transform_poses_into_frame(&mut initial, &truth[0]);
    info!(
        dead_reckoning = position_error(&initial, &truth),
        graph_slam = position_error(&estimate, &truth),
        final_cost = output.final_cost,
        "mean position error [m]"
    );

    if let Err(e) = std::fs::create_dir_all(OUTPUT_DIR) {
        error!(error = %e, "cannot create output directory");
        return Ok(());
    }

    let mut vis = Visualizer::new();
    vis.set_title("GraphSLAM");
    vis.set_x_range(0.0, MAP_WIDTH as f64);
    vis.set_y_range(0.0, MAP_HEIGHT as f64);
    vis.plot_occupancy(&map);
    vis.plot_landmarks(&landmarks);
    vis.plot_poses(&truth, &PathStyle::new(colors::GROUND_TRUTH, "Ground truth"));
    vis.plot_poses(&initial, &PathStyle::new(colors::DEAD_RECKONING, "Initial estimate with odometry"));
    vis.plot_poses(&estimate, &PathStyle::new(colors::ESTIMATED, "Estimate after optimization"));
    if truth.len() > 1 {
        vis.plot_measurements(&truth[1], &measurements[1]);
    }

    let mut omega = Visualizer::new();
    omega.set_title("Information matrix");
    omega.plot_sparsity(&output.system.sparsity_pattern(), "nonzero");

    let mut reduced = Visualizer::new();
    reduced.set_title("Reduced information matrix");
    reduced.plot_sparsity(&output.reduced.sparsity_pattern(), "nonzero");

    for (vis, name) in [(&vis, "graph_slam.svg"), (&omega, "omega.svg"), (&reduced, "omega_reduced.svg")] {
        let path = format!("{}/{}", OUTPUT_DIR, name);
        match vis.save_svg(&path) {
            Ok(()) => info!(path = %path, "plot saved"),
            Err(e) => error!(path = %path, error = %e, "failed to save plot"),
        }
    }
    Ok(())
}

fn main() {
    init_logger();
    info!("GraphSLAM start!!");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    if let Err(e) = run(seed) {
        error!(error = %e, "GraphSLAM failed");
        std::process::exit(1);
    }

    info!("GraphSLAM finish!!");
}
