//! Recovery of the pose and landmark means
//!
//! The reduced pose system is factored once; its inverse is the pose
//! covariance and its solution the pose mean. Each landmark mean is then the
//! conditional mean given the poses:
//!
//! ```text
//! μ_j = Omega_jj^-1 (xi_j - Omega_{j,τ} μ_τ)
//! ```
//!
//! Reference:
//! - Probabilistic Robotics (Thrun, Burgard, Fox), Table 11.4

use nalgebra::{DMatrix, Vector2, Vector3};
use tracing::debug;

use crate::common::{Pose2D, SlamError, SlamResult};
use crate::slam::config::GraphSlamConfig;
use crate::slam::information::{LinearSystem, ReducedSystem, POSE_SIZE};
use crate::slam::landmarks::LandmarkEstimates;
use crate::slam::numerics::{factor_pose_system, invert_landmark_block};

/// Output of one solve step
#[derive(Debug, Clone)]
pub struct Solution {
    /// Pose means
    pub poses: Vec<Pose2D>,
    /// Joint covariance of all poses (3N x 3N)
    pub pose_covariance: DMatrix<f64>,
    /// Landmark means
    pub landmarks: LandmarkEstimates,
    /// Condition number of the reduced information matrix
    pub condition_number: f64,
}

impl Solution {
    /// Marginal covariance of pose `t`
    pub fn pose_marginal(&self, t: usize) -> nalgebra::Matrix3<f64> {
        self.pose_covariance
            .fixed_view::<POSE_SIZE, POSE_SIZE>(t * POSE_SIZE, t * POSE_SIZE)
            .into_owned()
    }
}

/// Solve the reduced system for the poses, then back-substitute every
/// landmark from the full `system`.
pub fn solve(reduced: &ReducedSystem, system: &LinearSystem, config: &GraphSlamConfig) -> SlamResult<Solution> {
    let layout = system.layout();
    let p = layout.pose_dim();
    if reduced.pose_count() != layout.pose_count() {
        return Err(SlamError::dimension("reduced pose count", layout.pose_count(), reduced.pose_count()));
    }
    if reduced.omega.nrows() != p || reduced.omega.ncols() != p {
        return Err(SlamError::dimension("reduced information matrix", p, reduced.omega.nrows()));
    }
    if reduced.xi.len() != p {
        return Err(SlamError::dimension("reduced information vector", p, reduced.xi.len()));
    }
    if system.omega.nrows() != layout.dim() || system.xi.len() != layout.dim() {
        return Err(SlamError::dimension("information matrix", layout.dim(), system.omega.nrows()));
    }

    let (chol, condition_number) = factor_pose_system(&reduced.omega, config)?;
    let mu = chol.solve(&reduced.xi);
    let pose_covariance = chol.inverse();

    let poses: Vec<Pose2D> = (0..layout.pose_count())
        .map(|t| Pose2D::from(mu.fixed_rows::<POSE_SIZE>(layout.pose_offset(t)).into_owned()))
        .collect();

    let mut landmarks = LandmarkEstimates::new();
    for (slot, &id) in layout.landmark_ids().iter().enumerate() {
        let omega_jj_inv = invert_landmark_block(&format!("landmark {}", id), &system.landmark_block(slot), config)?;
        let mut rhs: Vector2<f64> = system.landmark_xi(slot);
        for &a in system.observers(slot) {
            let mu_a: Vector3<f64> = mu.fixed_rows::<POSE_SIZE>(layout.pose_offset(a)).into_owned();
            rhs -= system.cross_block(a, slot).transpose() * mu_a;
        }
        landmarks.insert(id, omega_jj_inv * rhs);
    }

    debug!(
        poses = poses.len(),
        landmarks = landmarks.len(),
        condition_number,
        "solved information form"
    );
    Ok(Solution {
        poses,
        pose_covariance,
        landmarks,
        condition_number,
    })
}
