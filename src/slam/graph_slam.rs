//! GraphSLAM optimization loop
//!
//! Offline full SLAM: the whole trajectory and all landmarks are estimated
//! jointly by repeated linearize -> reduce -> solve passes, each relinearized
//! around the previous pass's estimates (Gauss-Newton).
//!
//! Reference:
//! - Probabilistic Robotics (Thrun, Burgard, Fox), chapter 11
//! - [A Tutorial on Graph-Based SLAM](http://www2.informatik.uni-freiburg.de/~stachnis/pdf/grisetti10titsmag.pdf)

use nalgebra::DMatrix;
use tracing::{error, info};

use crate::common::{ControlInput, LandmarkId, Pose2D, RangeBearing, SlamError, SlamResult};
use crate::slam::config::GraphSlamConfig;
use crate::slam::cost::residual_cost;
use crate::slam::information::{LinearSystem, ReducedSystem};
use crate::slam::initialize::initialize;
use crate::slam::landmarks::LandmarkEstimates;
use crate::slam::linearize::linearize;
use crate::slam::reduce::reduce;
use crate::slam::solve::{solve, Solution};

/// Diagnostics of one iteration
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub iteration: usize,
    /// Weighted squared residual norm at the linearization point
    pub cost: f64,
    /// Largest absolute change of any pose or landmark coordinate
    pub max_update: f64,
    /// Condition number of the reduced information matrix
    pub condition_number: f64,
}

/// Result of a GraphSLAM run
#[derive(Debug, Clone)]
pub struct GraphSlamOutput {
    pub poses: Vec<Pose2D>,
    pub pose_covariance: DMatrix<f64>,
    pub landmarks: LandmarkEstimates,
    /// Full information form of the last iteration
    pub system: LinearSystem,
    /// Reduced information form of the last iteration
    pub reduced: ReducedSystem,
    pub iterations: Vec<IterationReport>,
    /// Cost at the final estimate
    pub final_cost: f64,
    /// True if the run stopped on the convergence tolerance
    pub converged: bool,
}

/// Largest coordinate change between two estimates
fn max_update(
    poses: &[Pose2D],
    landmarks: &LandmarkEstimates,
    solution: &Solution,
) -> f64 {
    let pose_delta = poses
        .iter()
        .zip(&solution.poses)
        .map(|(a, b)| (a.to_vector() - b.to_vector()).amax())
        .fold(0.0, f64::max);
    let landmark_delta = landmarks
        .iter()
        .filter_map(|(id, a)| solution.landmarks.get(id).map(|b| (a - b).amax()))
        .fold(0.0, f64::max);
    pose_delta.max(landmark_delta)
}

/// Offline GraphSLAM estimator
pub struct GraphSlam {
    config: GraphSlamConfig,
}

impl GraphSlam {
    /// Create a new estimator, validating the configuration
    pub fn new(config: GraphSlamConfig) -> SlamResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: GraphSlamConfig::default(),
        }
    }

    pub fn config(&self) -> &GraphSlamConfig {
        &self.config
    }

    /// Dead-reckon the initial trajectory from `initial_pose`, then optimize
    pub fn run(
        &self,
        initial_pose: Pose2D,
        controls: &[ControlInput],
        measurements: &[Vec<RangeBearing>],
        correspondences: &[Vec<LandmarkId>],
    ) -> SlamResult<GraphSlamOutput> {
        let poses = initialize(controls, initial_pose, self.config.dt)?;
        self.optimize(&poses, controls, measurements, correspondences)
    }

    /// Optimize trajectory and map starting from `initial_poses`
    pub fn optimize(
        &self,
        initial_poses: &[Pose2D],
        controls: &[ControlInput],
        measurements: &[Vec<RangeBearing>],
        correspondences: &[Vec<LandmarkId>],
    ) -> SlamResult<GraphSlamOutput> {
        info!(
            poses = initial_poses.len(),
            max_iterations = self.config.max_iterations,
            "start graph slam"
        );

        let mut poses = initial_poses.to_vec();
        let mut landmarks = LandmarkEstimates::new();
        let mut reports = Vec::with_capacity(self.config.max_iterations);
        let mut last = None;
        let mut converged = false;

        for iteration in 0..self.config.max_iterations {
            let (system, reduced, solution, cost) = self
                .iterate(&poses, &landmarks, controls, measurements, correspondences)
                .map_err(|e| {
                    error!(iteration, error = %e, "aborting graph slam run");
                    e
                })?;

            // landmarks seeded in this pass have no previous estimate to compare with
            let delta = max_update(&poses, &landmarks, &solution);
            info!(iteration, cost, max_update = delta, "graph slam iteration");
            reports.push(IterationReport {
                iteration,
                cost,
                max_update: delta,
                condition_number: solution.condition_number,
            });

            poses = solution.poses.clone();
            landmarks = solution.landmarks.clone();
            last = Some((system, reduced, solution));

            if let Some(tolerance) = self.config.convergence_tolerance {
                if iteration > 0 && delta < tolerance {
                    converged = true;
                    break;
                }
            }
        }

        let (system, reduced, solution) = last
            .ok_or_else(|| SlamError::InvalidParameter("max_iterations must be at least 1".to_string()))?;
        let final_cost = residual_cost(&poses, &landmarks, controls, measurements, correspondences, &self.config)?;
        info!(final_cost, iterations = reports.len(), converged, "graph slam done");

        Ok(GraphSlamOutput {
            poses,
            pose_covariance: solution.pose_covariance,
            landmarks,
            system,
            reduced,
            iterations: reports,
            final_cost,
            converged,
        })
    }

    fn iterate(
        &self,
        poses: &[Pose2D],
        landmarks: &LandmarkEstimates,
        controls: &[ControlInput],
        measurements: &[Vec<RangeBearing>],
        correspondences: &[Vec<LandmarkId>],
    ) -> SlamResult<(LinearSystem, ReducedSystem, Solution, f64)> {
        let (system, seeded) = linearize(poses, landmarks, controls, measurements, correspondences, &self.config)?;
        let cost = residual_cost(poses, &seeded, controls, measurements, correspondences, &self.config)?;
        let reduced = reduce(&system, &seeded, &self.config)?;
        let solution = solve(&reduced, &system, &self.config)?;
        Ok((system, reduced, solution, cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ObservationModel;
    use crate::slam::observation_model::RangeBearingModel;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix2, Matrix3, Vector2};

    fn scenario() -> (Vec<Pose2D>, Vec<ControlInput>, Vec<Vec<RangeBearing>>, Vec<Vec<LandmarkId>>, Vec<Vector2<f64>>) {
        let controls = vec![ControlInput::new(1.0, 0.25); 8];
        let truth = initialize(&controls, Pose2D::origin(), 1.0).unwrap();
        let landmarks = vec![Vector2::new(2.0, 4.0), Vector2::new(-1.0, 3.0), Vector2::new(4.0, 0.5)];
        let model = RangeBearingModel;
        let z = truth
            .iter()
            .map(|p| landmarks.iter().map(|m| model.predict(p, m)).collect())
            .collect();
        let c = vec![vec![0, 1, 2]; truth.len()];
        (truth, controls, z, c, landmarks)
    }

    #[test]
    fn test_fixed_iteration_budget() {
        let (_, controls, z, c, _) = scenario();
        let slam = GraphSlam::new(GraphSlamConfig::default().with_max_iterations(3)).unwrap();
        let output = slam.run(Pose2D::origin(), &controls, &z, &c).unwrap();
        assert_eq!(output.iterations.len(), 3);
        assert!(!output.converged);
        assert_eq!(output.system.layout().landmark_count(), 3);
        assert_eq!(output.reduced.pose_count(), 9);
    }

    #[test]
    fn test_recovers_truth_from_perturbed_start() {
        let (truth, controls, z, c, landmarks) = scenario();
        let config = GraphSlamConfig::default()
            .with_motion_covariance(Matrix3::identity() * 0.01)
            .with_measurement_covariance(Matrix2::identity() * 0.01)
            .with_max_iterations(10);
        let slam = GraphSlam::new(config).unwrap();

        let mut start = truth.clone();
        for (t, pose) in start.iter_mut().enumerate().skip(1) {
            pose.x += 0.05 * t as f64;
            pose.yaw -= 0.01 * t as f64;
        }
        let output = slam.optimize(&start, &controls, &z, &c).unwrap();

        for (est, gt) in output.poses.iter().zip(&truth) {
            assert_abs_diff_eq!(est.to_vector(), gt.to_vector(), epsilon = 1e-6);
        }
        for (id, lm) in landmarks.iter().enumerate() {
            assert_abs_diff_eq!(*output.landmarks.get(id).unwrap(), *lm, epsilon = 1e-6);
        }
        assert!(output.final_cost < 1e-8);
    }

    #[test]
    fn test_early_stop_on_tolerance() {
        let (_, controls, z, c, _) = scenario();
        let config = GraphSlamConfig::default().with_convergence_tolerance(1e-6);
        let output = GraphSlam::new(config).unwrap().run(Pose2D::origin(), &controls, &z, &c).unwrap();
        assert!(output.converged);
        assert!(output.iterations.len() < 25);
    }

    #[test]
    fn test_errors_abort_the_run() {
        let (_, controls, z, _, _) = scenario();
        let c = vec![vec![0, 1]; 9];
        let slam = GraphSlam::with_defaults();
        assert!(matches!(
            slam.run(Pose2D::origin(), &controls, &z, &c),
            Err(SlamError::DimensionMismatch { .. })
        ));
    }
}
